pub mod patterns;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::grouping::PostSummary;
use crate::metrics::mean;
use crate::post::Post;

pub use patterns::PartPatternDetector;

/// What a detector reads out of a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartMarker {
    pub base_title: String,
    pub part_number: u32,
    /// Total announced by the title itself, e.g. "(2/4)".
    pub declared_total: Option<u32>,
}

/// Title-based part detection. Swappable without touching the rest of the pipeline.
pub trait SeriesDetector {
    fn detect(&self, title: &str) -> Option<PartMarker>;
}

impl<F> SeriesDetector for F
where
    F: Fn(&str) -> Option<PartMarker>,
{
    fn detect(&self, title: &str) -> Option<PartMarker> {
        self(title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPart {
    pub part_number: u32,
    pub post: PostSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub base_title: String,
    /// Ascending by part number.
    pub parts: Vec<SeriesPart>,
    /// Distinct part numbers present.
    pub parts_found: usize,
    pub highest_part: u32,
    pub declared_total: Option<u32>,
    /// `parts_found / max(highest_part, declared_total)`.
    pub completion_ratio: f64,
    /// True when no title announced a total, so the ratio is only a lower bound
    /// derived from the highest part seen.
    pub completion_is_estimate: bool,
    pub total_reactions: u64,
    pub total_comments: u64,
    pub average_reactions: f64,
    pub average_comments: f64,
    pub average_engagement_ratio: f64,
    pub first_published: DateTime<Utc>,
    pub last_published: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesComparison {
    pub series_posts: usize,
    pub standalone_posts: usize,
    pub series_average_reactions: f64,
    pub series_average_comments: f64,
    pub standalone_average_reactions: f64,
    pub standalone_average_comments: f64,
}

/// Groups posts by detected base title. Series need at least two distinct parts.
pub fn detect_series(posts: &[Post], detector: &dyn SeriesDetector) -> Vec<Series> {
    let mut groups: BTreeMap<String, Vec<(PartMarker, &Post)>> = BTreeMap::new();
    for post in posts {
        if let Some(marker) = detector.detect(&post.title) {
            groups
                .entry(series_key(&marker.base_title))
                .or_default()
                .push((marker, post));
        }
    }

    let mut series: Vec<Series> = groups
        .into_values()
        .filter_map(build_series)
        .collect();
    series.sort_by(|a, b| {
        b.average_reactions
            .total_cmp(&a.average_reactions)
            .then_with(|| series_key(&a.base_title).cmp(&series_key(&b.base_title)))
    });
    series
}

fn build_series(mut members: Vec<(PartMarker, &Post)>) -> Option<Series> {
    let distinct: BTreeSet<u32> = members.iter().map(|(marker, _)| marker.part_number).collect();
    if distinct.len() < 2 {
        return None;
    }

    members.sort_by(|(a_marker, a), (b_marker, b)| {
        a_marker
            .part_number
            .cmp(&b_marker.part_number)
            .then_with(|| a.published_at.cmp(&b.published_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    let highest_part = distinct.iter().next_back().copied().unwrap_or(0);
    let declared_total = members
        .iter()
        .filter_map(|(marker, _)| marker.declared_total)
        .max();
    let denominator = declared_total.unwrap_or(0).max(highest_part).max(1);

    let count = members.len();
    let total_reactions = members
        .iter()
        .map(|(_, post)| post.reactions_count)
        .fold(0, u64::saturating_add);
    let total_comments = members
        .iter()
        .map(|(_, post)| post.comments_count)
        .fold(0, u64::saturating_add);
    let ratio_sum: f64 = members.iter().map(|(_, post)| post.engagement_ratio()).sum();
    let first_published = members.iter().map(|(_, post)| post.published_at).min()?;
    let last_published = members.iter().map(|(_, post)| post.published_at).max()?;

    Some(Series {
        base_title: members[0].0.base_title.clone(),
        parts_found: distinct.len(),
        highest_part,
        declared_total,
        completion_ratio: (distinct.len() as f64 / f64::from(denominator)).min(1.0),
        completion_is_estimate: declared_total.is_none(),
        total_reactions,
        total_comments,
        average_reactions: mean(total_reactions as f64, count),
        average_comments: mean(total_comments as f64, count),
        average_engagement_ratio: mean(ratio_sum, count),
        first_published,
        last_published,
        parts: members
            .into_iter()
            .map(|(marker, post)| SeriesPart {
                part_number: marker.part_number,
                post: PostSummary::from(post),
            })
            .collect(),
    })
}

/// Averages of posts that belong to a detected series against all other posts.
pub fn compare_series(posts: &[Post], series: &[Series]) -> SeriesComparison {
    let members: HashSet<&str> = series
        .iter()
        .flat_map(|entry| entry.parts.iter().map(|part| part.post.id.as_str()))
        .collect();

    let (in_series, standalone): (Vec<&Post>, Vec<&Post>) = posts
        .iter()
        .partition(|post| members.contains(post.id.as_str()));

    let average = |group: &[&Post], value: fn(&Post) -> u64| {
        mean(group.iter().map(|post| value(post) as f64).sum(), group.len())
    };

    SeriesComparison {
        series_posts: in_series.len(),
        standalone_posts: standalone.len(),
        series_average_reactions: average(in_series.as_slice(), |post| post.reactions_count),
        series_average_comments: average(in_series.as_slice(), |post| post.comments_count),
        standalone_average_reactions: average(standalone.as_slice(), |post| post.reactions_count),
        standalone_average_comments: average(standalone.as_slice(), |post| post.comments_count),
    }
}

fn series_key(base_title: &str) -> String {
    base_title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
