use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::mean;
use crate::post::Post;

/// Running sums for one group. Partial accumulators merge by summing, and averages are
/// only derived in [`GroupAccumulator::finish`], never averaged again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupAccumulator {
    post_count: usize,
    total_reactions: u64,
    total_comments: u64,
    total_views: u64,
    posts_with_views: usize,
}

impl GroupAccumulator {
    pub fn add(&mut self, post: &Post) {
        self.post_count += 1;
        self.total_reactions = self.total_reactions.saturating_add(post.reactions_count);
        self.total_comments = self.total_comments.saturating_add(post.comments_count);
        if let Some(views) = post.page_views_count {
            self.total_views = self.total_views.saturating_add(views);
            self.posts_with_views += 1;
        }
    }

    pub fn merge(&mut self, other: &GroupAccumulator) {
        self.post_count += other.post_count;
        self.total_reactions = self.total_reactions.saturating_add(other.total_reactions);
        self.total_comments = self.total_comments.saturating_add(other.total_comments);
        self.total_views = self.total_views.saturating_add(other.total_views);
        self.posts_with_views += other.posts_with_views;
    }

    pub fn post_count(&self) -> usize {
        self.post_count
    }

    pub fn finish(&self) -> GroupMetrics {
        let average_reactions = mean(self.total_reactions as f64, self.post_count);
        let average_comments = mean(self.total_comments as f64, self.post_count);
        GroupMetrics {
            post_count: self.post_count,
            total_reactions: self.total_reactions,
            total_comments: self.total_comments,
            total_views: self.total_views,
            average_reactions,
            average_comments,
            average_views: if self.posts_with_views == 0 {
                None
            } else {
                Some(mean(self.total_views as f64, self.posts_with_views))
            },
            engagement_score: average_reactions + average_comments,
        }
    }
}

/// Derived metrics shared by tag, time slot and reading-time groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMetrics {
    pub post_count: usize,
    pub total_reactions: u64,
    pub total_comments: u64,
    pub total_views: u64,
    pub average_reactions: f64,
    pub average_comments: f64,
    /// Averaged over the posts in the group that reported views.
    pub average_views: Option<f64>,
    /// `average_reactions + average_comments`.
    pub engagement_score: f64,
}

/// Folds the posts into one accumulator per key. A post contributes once to every key
/// `keys` yields for it; groups only exist for keys that received at least one post.
pub fn fold_groups<K, I, F>(posts: &[Post], keys: F) -> BTreeMap<K, GroupAccumulator>
where
    K: Ord,
    I: IntoIterator<Item = K>,
    F: Fn(&Post) -> I,
{
    posts.iter().fold(BTreeMap::new(), |mut groups, post| {
        for key in keys(post) {
            groups
                .entry(key)
                .or_insert_with(GroupAccumulator::default)
                .add(post);
        }
        groups
    })
}

/// Combines partial fold results, e.g. from chunks processed independently.
pub fn merge_groups<K: Ord + Clone>(
    mut into: BTreeMap<K, GroupAccumulator>,
    other: &BTreeMap<K, GroupAccumulator>,
) -> BTreeMap<K, GroupAccumulator> {
    for (key, accumulator) in other {
        into.entry(key.clone())
            .or_insert_with(GroupAccumulator::default)
            .merge(accumulator);
    }
    into
}
