use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::AnalysisConfig;
use crate::grouping::TagStat;
use crate::metrics::{mean, median};
use crate::post::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    TopPerforming,
    Underused,
    Combination,
    Trending,
}

impl RecommendationKind {
    pub fn label(self) -> &'static str {
        match self {
            RecommendationKind::TopPerforming => "top_performing",
            RecommendationKind::Underused => "underused",
            RecommendationKind::Combination => "combination",
            RecommendationKind::Trending => "trending",
        }
    }
}

/// Selection result plus the metrics that qualified it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecommendationDetail {
    TopPerforming {
        tag: String,
        rank: usize,
        post_count: usize,
        engagement_score: f64,
        average_reactions: f64,
        average_comments: f64,
    },
    Underused {
        tag: String,
        post_count: usize,
        engagement_score: f64,
        median_engagement_score: f64,
    },
    Combination {
        tags: Vec<String>,
        co_occurrences: usize,
        /// Mean of reactions + comments over posts carrying every tag of the pair.
        average_engagement: f64,
        average_reactions: f64,
    },
    Trending {
        tag: String,
        recent_posts: usize,
        total_posts: usize,
        window_posts: usize,
        recent_share: f64,
        overall_share: f64,
        /// `recent_share / overall_share`.
        lift: f64,
    },
}

impl RecommendationDetail {
    pub fn kind(&self) -> RecommendationKind {
        match self {
            RecommendationDetail::TopPerforming { .. } => RecommendationKind::TopPerforming,
            RecommendationDetail::Underused { .. } => RecommendationKind::Underused,
            RecommendationDetail::Combination { .. } => RecommendationKind::Combination,
            RecommendationDetail::Trending { .. } => RecommendationKind::Trending,
        }
    }

    pub fn tags(&self) -> Vec<&str> {
        match self {
            RecommendationDetail::TopPerforming { tag, .. }
            | RecommendationDetail::Underused { tag, .. }
            | RecommendationDetail::Trending { tag, .. } => vec![tag.as_str()],
            RecommendationDetail::Combination { tags, .. } => {
                tags.iter().map(String::as_str).collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub detail: RecommendationDetail,
    pub title: String,
    pub description: String,
}

impl Recommendation {
    fn new(detail: RecommendationDetail) -> Self {
        let (title, description) = describe(&detail);
        Self {
            detail,
            title,
            description,
        }
    }

    pub fn kind(&self) -> RecommendationKind {
        self.detail.kind()
    }
}

/// All recommendations in kind order: top performing, underused, combinations, trending.
/// `tag_stats` must be the sorted tag performance list for the same posts.
pub fn recommend(posts: &[Post], tag_stats: &[TagStat], config: &AnalysisConfig) -> Vec<Recommendation> {
    let mut recommendations = top_performing(tag_stats, config);
    recommendations.extend(underused(tag_stats, config));
    recommendations.extend(combinations(posts, config));
    recommendations.extend(trending(posts, tag_stats, config));
    recommendations
}

pub fn top_performing(tag_stats: &[TagStat], config: &AnalysisConfig) -> Vec<Recommendation> {
    tag_stats
        .iter()
        .take(config.top_performing_tags)
        .enumerate()
        .map(|(index, stat)| {
            Recommendation::new(RecommendationDetail::TopPerforming {
                tag: stat.tag.clone(),
                rank: index + 1,
                post_count: stat.metrics.post_count,
                engagement_score: stat.metrics.engagement_score,
                average_reactions: stat.metrics.average_reactions,
                average_comments: stat.metrics.average_comments,
            })
        })
        .collect()
}

/// Rarely used tags that still score above the median of all tags.
pub fn underused(tag_stats: &[TagStat], config: &AnalysisConfig) -> Vec<Recommendation> {
    let scores: Vec<f64> = tag_stats
        .iter()
        .map(|stat| stat.metrics.engagement_score)
        .collect();
    let median_score = median(&scores);

    tag_stats
        .iter()
        .filter(|stat| {
            stat.metrics.post_count <= config.underused_max_posts
                && stat.metrics.engagement_score > median_score
        })
        .map(|stat| {
            Recommendation::new(RecommendationDetail::Underused {
                tag: stat.tag.clone(),
                post_count: stat.metrics.post_count,
                engagement_score: stat.metrics.engagement_score,
                median_engagement_score: median_score,
            })
        })
        .collect()
}

#[derive(Default)]
struct PairTotals {
    posts: usize,
    engagement: u64,
    reactions: u64,
}

/// Tag pairs that co-occur on enough posts, best average engagement first.
pub fn combinations(posts: &[Post], config: &AnalysisConfig) -> Vec<Recommendation> {
    let mut pairs: BTreeMap<(&str, &str), PairTotals> = BTreeMap::new();
    for post in posts {
        let tags: Vec<&str> = post.tags.iter().map(String::as_str).collect();
        for (index, first) in tags.iter().enumerate() {
            for second in &tags[index + 1..] {
                let totals = pairs.entry((*first, *second)).or_default();
                totals.posts += 1;
                totals.engagement = totals.engagement.saturating_add(post.engagement());
                totals.reactions = totals.reactions.saturating_add(post.reactions_count);
            }
        }
    }

    let mut qualified: Vec<((&str, &str), PairTotals)> = pairs
        .into_iter()
        .filter(|(_, totals)| totals.posts >= config.min_co_occurrence.max(1))
        .collect();
    qualified.sort_by(|(a_tags, a), (b_tags, b)| {
        let a_average = mean(a.engagement as f64, a.posts);
        let b_average = mean(b.engagement as f64, b.posts);
        b_average
            .total_cmp(&a_average)
            .then_with(|| b.posts.cmp(&a.posts))
            .then_with(|| a_tags.cmp(b_tags))
    });

    qualified
        .into_iter()
        .take(config.max_combinations)
        .map(|((first, second), totals)| {
            Recommendation::new(RecommendationDetail::Combination {
                tags: vec![first.to_string(), second.to_string()],
                co_occurrences: totals.posts,
                average_engagement: mean(totals.engagement as f64, totals.posts),
                average_reactions: mean(totals.reactions as f64, totals.posts),
            })
        })
        .collect()
}

/// Tags over-represented in the most recent slice of posts relative to their overall usage.
pub fn trending(posts: &[Post], tag_stats: &[TagStat], config: &AnalysisConfig) -> Vec<Recommendation> {
    let total = posts.len();
    let window = recent_window_len(total, config.trending_window);
    if window == 0 {
        return Vec::new();
    }

    let mut chronological: Vec<&Post> = posts.iter().collect();
    chronological.sort_by(|a, b| a.published_at.cmp(&b.published_at).then_with(|| a.id.cmp(&b.id)));

    let mut recent_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for post in &chronological[total - window..] {
        for tag in &post.tags {
            *recent_counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut candidates: Vec<TrendingTag> = tag_stats
        .iter()
        .filter_map(|stat| {
            let recent_posts = recent_counts.get(stat.tag.as_str()).copied().unwrap_or(0);
            let total_posts = stat.metrics.post_count;
            if recent_posts < config.trending_min_recent_posts.max(1) || total_posts == 0 {
                return None;
            }
            let recent_share = recent_posts as f64 / window as f64;
            let overall_share = total_posts as f64 / total as f64;
            let lift = recent_share / overall_share;
            (lift > 1.0).then(|| TrendingTag {
                tag: stat.tag.as_str(),
                recent_posts,
                total_posts,
                recent_share,
                overall_share,
                lift,
            })
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.lift
            .total_cmp(&a.lift)
            .then_with(|| b.recent_posts.cmp(&a.recent_posts))
            .then_with(|| a.tag.cmp(b.tag))
    });

    candidates
        .into_iter()
        .take(config.max_trending)
        .map(|candidate| {
            Recommendation::new(RecommendationDetail::Trending {
                tag: candidate.tag.to_string(),
                recent_posts: candidate.recent_posts,
                total_posts: candidate.total_posts,
                window_posts: window,
                recent_share: candidate.recent_share,
                overall_share: candidate.overall_share,
                lift: candidate.lift,
            })
        })
        .collect()
}

struct TrendingTag<'a> {
    tag: &'a str,
    recent_posts: usize,
    total_posts: usize,
    recent_share: f64,
    overall_share: f64,
    lift: f64,
}

/// Number of most recent posts in the trending window: `ceil(total * fraction)`, at least one.
pub fn recent_window_len(total: usize, fraction: f64) -> usize {
    if total == 0 || !fraction.is_finite() || fraction <= 0.0 {
        return 0;
    }
    let window = (total as f64 * fraction.min(1.0)).ceil() as usize;
    window.clamp(1, total)
}

fn describe(detail: &RecommendationDetail) -> (String, String) {
    match detail {
        RecommendationDetail::TopPerforming {
            tag,
            post_count,
            engagement_score,
            average_reactions,
            average_comments,
            ..
        } => (
            format!("Keep writing about #{}", tag),
            format!(
                "#{} averages {:.1} reactions and {:.1} comments across {} {} (engagement score {:.1}).",
                tag,
                average_reactions,
                average_comments,
                post_count,
                plural(*post_count, "post", "posts"),
                engagement_score
            ),
        ),
        RecommendationDetail::Underused {
            tag,
            post_count,
            engagement_score,
            median_engagement_score,
        } => (
            format!("Use #{} more often", tag),
            format!(
                "#{} appears on only {} {} but scores {:.1}, above the median tag score of {:.1}.",
                tag,
                post_count,
                plural(*post_count, "post", "posts"),
                engagement_score,
                median_engagement_score
            ),
        ),
        RecommendationDetail::Combination {
            tags,
            co_occurrences,
            average_engagement,
            ..
        } => {
            let labels: Vec<String> = tags.iter().map(|tag| format!("#{}", tag)).collect();
            (
                format!("Combine {}", labels.join(" + ")),
                format!(
                    "{} posts share {} and average {:.1} reactions plus comments.",
                    co_occurrences,
                    labels.join(" and "),
                    average_engagement
                ),
            )
        }
        RecommendationDetail::Trending {
            tag,
            recent_posts,
            window_posts,
            lift,
            ..
        } => (
            format!("#{} is trending in your recent posts", tag),
            format!(
                "{} of your last {} posts use #{} ({:.1}x its overall rate).",
                recent_posts, window_posts, tag, lift
            ),
        ),
    }
}

fn plural<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_window_rounds_up_and_stays_in_bounds() {
        assert_eq!(recent_window_len(0, 0.25), 0);
        assert_eq!(recent_window_len(3, 0.25), 1);
        assert_eq!(recent_window_len(8, 0.25), 2);
        assert_eq!(recent_window_len(9, 0.25), 3);
        assert_eq!(recent_window_len(4, 2.0), 4);
        assert_eq!(recent_window_len(4, 0.0), 0);
        assert_eq!(recent_window_len(4, f64::NAN), 0);
    }
}
