use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::cmp::Ordering;

use crate::grouping::accumulator::{fold_groups, GroupAccumulator, GroupMetrics};
use crate::post::{Post, ReadingTimeBucket};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagStat {
    pub tag: String,
    #[serde(flatten)]
    pub metrics: GroupMetrics,
}

/// One accumulator per tag appearing on at least one post.
pub fn tag_groups(posts: &[Post]) -> BTreeMap<String, GroupAccumulator> {
    fold_groups(posts, |post| post.tags.iter().cloned().collect::<Vec<_>>())
}

/// Tag performance ordered by engagement score, then post count, then tag name.
pub fn tag_performance(posts: &[Post]) -> Vec<TagStat> {
    let mut stats: Vec<TagStat> = tag_groups(posts)
        .into_iter()
        .map(|(tag, accumulator)| TagStat {
            tag,
            metrics: accumulator.finish(),
        })
        .collect();
    stats.sort_by(compare_tag_stats);
    stats
}

pub fn compare_tag_stats(a: &TagStat, b: &TagStat) -> Ordering {
    b.metrics
        .engagement_score
        .total_cmp(&a.metrics.engagement_score)
        .then_with(|| b.metrics.post_count.cmp(&a.metrics.post_count))
        .then_with(|| a.tag.cmp(&b.tag))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingTimeStat {
    pub bucket: ReadingTimeBucket,
    pub label: String,
    #[serde(flatten)]
    pub metrics: GroupMetrics,
}

/// Performance per reading-time bucket, best engagement score first.
pub fn reading_time_performance(posts: &[Post]) -> Vec<ReadingTimeStat> {
    let mut stats: Vec<ReadingTimeStat> = fold_groups(posts, |post| [post.reading_time_bucket()])
        .into_iter()
        .map(|(bucket, accumulator)| ReadingTimeStat {
            bucket,
            label: bucket.label().to_string(),
            metrics: accumulator.finish(),
        })
        .collect();
    stats.sort_by(|a, b| {
        b.metrics
            .engagement_score
            .total_cmp(&a.metrics.engagement_score)
            .then_with(|| a.bucket.cmp(&b.bucket))
    });
    stats
}
