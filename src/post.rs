use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

use crate::error::{SkipReason, SkippedRecord};

/// Ceiling applied to reaction, comment and view counts during normalization.
/// Keeps every per-group total well inside `u64`.
pub const MAX_COUNT: u64 = u32::MAX as u64;

/// A raw record as delivered by the post source: field name to JSON value.
pub type RawPost = Map<String, Value>;

/// Canonical post shape every downstream component works with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub tags: BTreeSet<String>,
    pub reactions_count: u64,
    pub comments_count: u64,
    pub reading_time_minutes: u32,
    /// `None` when the platform did not report views for this post.
    pub page_views_count: Option<u64>,
}

impl Post {
    pub fn engagement(&self) -> u64 {
        self.reactions_count.saturating_add(self.comments_count)
    }

    /// (reactions + comments) per minute of reading time.
    pub fn engagement_ratio(&self) -> f64 {
        self.engagement() as f64 / f64::from(self.reading_time_minutes.max(1))
    }

    pub fn time_efficiency(&self) -> f64 {
        self.reactions_count as f64 / f64::from(self.reading_time_minutes.max(1))
    }

    pub fn view_engagement_rate(&self) -> Option<f64> {
        self.page_views_count
            .map(|views| self.engagement() as f64 / views.max(1) as f64)
    }

    /// Views with the documented placeholder of 0 when unavailable. Only used for ordering.
    pub fn views_or_zero(&self) -> u64 {
        self.page_views_count.unwrap_or(0)
    }

    pub fn reading_time_bucket(&self) -> ReadingTimeBucket {
        ReadingTimeBucket::from_minutes(self.reading_time_minutes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingTimeBucket {
    UnderFive,
    FiveToTen,
    OverTen,
}

impl ReadingTimeBucket {
    pub fn from_minutes(minutes: u32) -> Self {
        match minutes {
            0..=4 => ReadingTimeBucket::UnderFive,
            5..=10 => ReadingTimeBucket::FiveToTen,
            _ => ReadingTimeBucket::OverTen,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReadingTimeBucket::UnderFive => "under 5 min",
            ReadingTimeBucket::FiveToTen => "5-10 min",
            ReadingTimeBucket::OverTen => "over 10 min",
        }
    }
}

/// Output of the normalizer.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub posts: Vec<Post>,
    pub skipped: Vec<SkippedRecord>,
    pub input_records: usize,
}

/// Converts raw records into canonical posts. Malformed records are skipped, never fatal.
pub fn normalize_records(records: &[Value]) -> Normalized {
    let mut posts = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let outcome = match record.as_object() {
            Some(raw) => normalize_post(raw),
            None => Err(SkipReason::invalid("record", "expected an object")),
        };

        let skip = match outcome {
            Ok(post) => {
                if seen_ids.insert(post.id.clone()) {
                    posts.push(post);
                    continue;
                }
                SkippedRecord {
                    index,
                    id: Some(post.id.clone()),
                    reason: SkipReason::DuplicateId { id: post.id },
                }
            }
            Err(reason) => SkippedRecord {
                index,
                id: record.as_object().and_then(read_id),
                reason,
            },
        };

        warn!(index = skip.index, id = ?skip.id, "skipping post record: {}", skip.reason);
        skipped.push(skip);
    }

    Normalized {
        posts,
        skipped,
        input_records: records.len(),
    }
}

/// Normalizes a single record.
pub fn normalize_post(raw: &RawPost) -> Result<Post, SkipReason> {
    let id = read_id(raw).ok_or_else(|| SkipReason::missing("id"))?;

    let title = read_str(raw, &["title"])
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .ok_or_else(|| SkipReason::missing("title"))?
        .to_string();

    let url = read_str(raw, &["url", "canonical_url"])
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| SkipReason::missing("url"))?;
    if !is_absolute_url(url) {
        return Err(SkipReason::invalid("url", format!("`{}` is not an absolute link", url)));
    }

    let published_at = match field(raw, &["published_at", "published_timestamp"]) {
        None => return Err(SkipReason::missing("published_at")),
        Some(Value::String(value)) => {
            parse_timestamp(value).ok_or_else(|| SkipReason::UnparsableTimestamp {
                value: value.clone(),
            })?
        }
        Some(Value::Number(value)) => value
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .ok_or_else(|| SkipReason::UnparsableTimestamp {
                value: value.to_string(),
            })?,
        Some(other) => {
            return Err(SkipReason::UnparsableTimestamp {
                value: other.to_string(),
            })
        }
    };

    let tags = field(raw, &["tags", "tag_list"])
        .map(normalize_tags)
        .unwrap_or_default();

    let reactions_count = read_count(raw, &["public_reactions_count", "positive_reactions_count"])
        .unwrap_or(0);
    let comments_count = read_count(raw, &["comments_count"]).unwrap_or(0);
    let reading_time_minutes = read_reading_time(raw);
    let page_views_count = read_count(raw, &["page_views_count"]);

    Ok(Post {
        id,
        title,
        url: url.to_string(),
        published_at,
        tags,
        reactions_count,
        comments_count,
        reading_time_minutes,
        page_views_count,
    })
}

/// Accepts RFC 3339 with any offset, or a naive date-time interpreted as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// Tags arrive either comma-joined or as a list; both end up lowercased, trimmed and non-empty.
pub fn normalize_tags(value: &Value) -> BTreeSet<String> {
    let clean = |tag: &str| {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            None
        } else {
            Some(tag)
        }
    };

    match value {
        Value::String(joined) => joined.split(',').filter_map(clean).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(clean)
            .collect(),
        Value::Null => BTreeSet::new(),
        other => {
            debug!("ignoring tags of unexpected shape: {}", other);
            BTreeSet::new()
        }
    }
}

fn field<'a>(raw: &'a RawPost, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| raw.get(*name))
        .find(|value| !value.is_null())
}

fn read_str<'a>(raw: &'a RawPost, names: &[&str]) -> Option<&'a str> {
    field(raw, names).and_then(Value::as_str)
}

fn read_id(raw: &RawPost) -> Option<String> {
    match field(raw, &["id"])? {
        Value::String(id) => {
            let id = id.trim();
            if id.is_empty() {
                None
            } else {
                Some(id.to_string())
            }
        }
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn read_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}

fn read_count(raw: &RawPost, names: &[&str]) -> Option<u64> {
    let value = field(raw, names)?;
    if let Some(count) = value.as_u64() {
        return Some(count.min(MAX_COUNT));
    }
    match read_number(value) {
        Some(number) => Some((number.max(0.0).floor() as u64).min(MAX_COUNT)),
        None => {
            debug!("ignoring non-numeric count {:?}: {}", names, value);
            None
        }
    }
}

fn read_reading_time(raw: &RawPost) -> u32 {
    field(raw, &["reading_time_minutes"])
        .and_then(read_number)
        .filter(|minutes| *minutes > 0.0)
        .map(|minutes| minutes.ceil().min(f64::from(u32::MAX)) as u32)
        .unwrap_or(1)
}

fn is_absolute_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}
