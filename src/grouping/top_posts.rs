use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::post::Post;

/// Flattened post with its derived values, as shown in ranked lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub tags: BTreeSet<String>,
    pub page_views_count: Option<u64>,
    pub reactions_count: u64,
    pub comments_count: u64,
    pub reading_time_minutes: u32,
    pub engagement_ratio: f64,
    pub time_efficiency: f64,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            url: post.url.clone(),
            published_at: post.published_at,
            tags: post.tags.clone(),
            page_views_count: post.page_views_count,
            reactions_count: post.reactions_count,
            comments_count: post.comments_count,
            reading_time_minutes: post.reading_time_minutes,
            engagement_ratio: post.engagement_ratio(),
            time_efficiency: post.time_efficiency(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopPosts {
    /// Views descending; posts without views rank as 0.
    pub by_views: Vec<PostSummary>,
    pub by_engagement: Vec<PostSummary>,
    pub by_reactions: Vec<PostSummary>,
    pub by_comments: Vec<PostSummary>,
    pub by_time_efficiency: Vec<PostSummary>,
}

impl TopPosts {
    pub fn lists(&self) -> [(&'static str, &[PostSummary]); 5] {
        [
            ("views", self.by_views.as_slice()),
            ("engagement", self.by_engagement.as_slice()),
            ("reactions", self.by_reactions.as_slice()),
            ("comments", self.by_comments.as_slice()),
            ("time_efficiency", self.by_time_efficiency.as_slice()),
        ]
    }
}

pub fn top_posts(posts: &[Post], limit: usize) -> TopPosts {
    TopPosts {
        by_views: rank_by(posts, limit, |post| post.views_or_zero() as f64),
        by_engagement: rank_by(posts, limit, Post::engagement_ratio),
        by_reactions: rank_by(posts, limit, |post| post.reactions_count as f64),
        by_comments: rank_by(posts, limit, |post| post.comments_count as f64),
        by_time_efficiency: rank_by(posts, limit, Post::time_efficiency),
    }
}

/// Sorts by `key` descending; ties go to the more recent post, then the smaller id.
pub fn rank_by<F>(posts: &[Post], limit: usize, key: F) -> Vec<PostSummary>
where
    F: Fn(&Post) -> f64,
{
    let mut ranked: Vec<(f64, &Post)> = posts.iter().map(|post| (key(post), post)).collect();
    ranked.sort_by(|(a_key, a), (b_key, b)| {
        b_key
            .total_cmp(a_key)
            .then_with(|| b.published_at.cmp(&a.published_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked
        .into_iter()
        .take(limit)
        .map(|(_, post)| PostSummary::from(post))
        .collect()
}
