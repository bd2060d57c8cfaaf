use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::post::Post;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_articles: usize,
    pub total_reactions: u64,
    pub total_comments: u64,
    /// Sum over the posts that reported views.
    pub total_views: u64,
    pub posts_with_views: usize,
    pub total_reading_time_minutes: u64,
    pub average_reading_time: f64,
    pub average_reactions: f64,
    pub average_comments: f64,
    /// Mean over `posts_with_views`; `None` when no post reported views.
    pub average_views: Option<f64>,
    pub average_engagement_ratio: f64,
    pub most_used_tags: Vec<TagCount>,
}

/// Aggregate statistics over the whole normalized list. Empty input yields zeros.
pub fn overall_stats(posts: &[Post], most_used_limit: usize) -> OverallStats {
    let total_articles = posts.len();
    let total_reactions = posts
        .iter()
        .map(|post| post.reactions_count)
        .fold(0, u64::saturating_add);
    let total_comments = posts
        .iter()
        .map(|post| post.comments_count)
        .fold(0, u64::saturating_add);
    let total_reading_time_minutes: u64 = posts
        .iter()
        .map(|post| u64::from(post.reading_time_minutes))
        .fold(0, u64::saturating_add);
    let ratio_sum: f64 = posts.iter().map(Post::engagement_ratio).sum();

    let views: Vec<u64> = posts.iter().filter_map(|post| post.page_views_count).collect();
    let total_views = views.iter().copied().fold(0, u64::saturating_add);

    OverallStats {
        total_articles,
        total_reactions,
        total_comments,
        total_views,
        posts_with_views: views.len(),
        total_reading_time_minutes,
        average_reading_time: mean(total_reading_time_minutes as f64, total_articles),
        average_reactions: mean(total_reactions as f64, total_articles),
        average_comments: mean(total_comments as f64, total_articles),
        average_views: if views.is_empty() {
            None
        } else {
            Some(mean(total_views as f64, views.len()))
        },
        average_engagement_ratio: mean(ratio_sum, total_articles),
        most_used_tags: most_used_tags(posts, most_used_limit),
    }
}

/// Tags ordered by how many posts carry them, ties by name.
pub fn most_used_tags(posts: &[Post], limit: usize) -> Vec<TagCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tag in posts.iter().flat_map(|post| post.tags.iter()) {
        *counts.entry(tag.as_str()).or_insert(0) += 1;
    }

    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    tags.truncate(limit);
    tags
}

/// Arithmetic mean with a guarded denominator.
pub fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Median of the values; 0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn mean_guards_empty_denominator() {
        assert_eq!(mean(10.0, 0), 0.0);
        assert_eq!(mean(10.0, 4), 2.5);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let post = |id: &str, reactions: u64| Post {
            id: id.to_string(),
            title: id.to_string(),
            url: format!("https://dev.to/someone/{}", id),
            published_at: chrono::Utc::now(),
            tags: Default::default(),
            reactions_count: reactions,
            comments_count: 5,
            reading_time_minutes: 1,
            page_views_count: Some(u64::MAX),
        };
        let posts = vec![post("a", u64::MAX), post("b", 1)];

        let stats = overall_stats(&posts, 3);
        assert_eq!(stats.total_reactions, u64::MAX);
        assert_eq!(stats.total_comments, 10);
        assert_eq!(stats.total_views, u64::MAX);
        assert_eq!(posts[0].engagement(), u64::MAX);
    }
}
