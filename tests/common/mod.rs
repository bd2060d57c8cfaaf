#![allow(dead_code)]

use serde_json::{json, Value};

/// A Dev.to style article record as the list endpoint returns it.
pub fn article(
    id: u64,
    title: &str,
    published_at: &str,
    tags: &[&str],
    reactions: u64,
    comments: u64,
    reading_time: u32,
) -> Value {
    json!({
        "id": id,
        "title": title,
        "url": format!("https://dev.to/someone/post-{}", id),
        "published_at": published_at,
        "tag_list": tags,
        "public_reactions_count": reactions,
        "comments_count": comments,
        "reading_time_minutes": reading_time,
    })
}

pub fn with_views(mut record: Value, views: u64) -> Value {
    record["page_views_count"] = json!(views);
    record
}

/// Posts on consecutive days of January 2024 at 09:00 UTC, one per tag set.
pub fn daily_articles(tag_sets: &[&[&str]]) -> Vec<Value> {
    tag_sets
        .iter()
        .enumerate()
        .map(|(index, tags)| {
            article(
                index as u64 + 1,
                &format!("Post {}", index + 1),
                &format!("2024-01-{:02}T09:00:00Z", index + 1),
                tags,
                10,
                1,
                5,
            )
        })
        .collect()
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
