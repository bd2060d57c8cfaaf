use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::config::AnalysisConfig;
use crate::grouping::accumulator::{fold_groups, GroupAccumulator, GroupMetrics};
use crate::post::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn label(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// Day of week, hour of day, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeSlotKey {
    Day(DayOfWeek),
    Hour(u8),
    DayHour(DayOfWeek, u8),
}

impl TimeSlotKey {
    pub fn label(self) -> String {
        match self {
            TimeSlotKey::Day(day) => day.label().to_string(),
            TimeSlotKey::Hour(hour) => format!("{:02}:00", hour),
            TimeSlotKey::DayHour(day, hour) => format!("{} {:02}:00", day.label(), hour),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotStat {
    pub day: Option<DayOfWeek>,
    pub hour: Option<u8>,
    pub label: String,
    #[serde(flatten)]
    pub metrics: GroupMetrics,
    /// `average_reactions + average_comments`.
    pub average_engagement: f64,
    /// Whether the slot clears the sample-size floor for "best" rankings.
    pub significant: bool,
}

impl TimeSlotStat {
    fn new(key: TimeSlotKey, accumulator: &GroupAccumulator, min_posts: usize) -> Self {
        let (day, hour) = match key {
            TimeSlotKey::Day(day) => (Some(day), None),
            TimeSlotKey::Hour(hour) => (None, Some(hour)),
            TimeSlotKey::DayHour(day, hour) => (Some(day), Some(hour)),
        };
        let metrics = accumulator.finish();
        Self {
            day,
            hour,
            label: key.label(),
            average_engagement: metrics.average_reactions + metrics.average_comments,
            significant: metrics.post_count >= min_posts,
            metrics,
        }
    }

    fn key(&self) -> (Option<DayOfWeek>, Option<u8>) {
        (self.day, self.hour)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestTimes {
    pub by_day: Vec<TimeSlotStat>,
    pub by_hour: Vec<TimeSlotStat>,
    /// Best (day, hour) pairs; only significant slots, capped.
    pub combinations: Vec<TimeSlotStat>,
}

impl BestTimes {
    pub fn best_day(&self) -> Option<&TimeSlotStat> {
        self.by_day.iter().find(|slot| slot.significant)
    }

    pub fn best_hour(&self) -> Option<&TimeSlotStat> {
        self.by_hour.iter().find(|slot| slot.significant)
    }
}

pub fn best_times(posts: &[Post], config: &AnalysisConfig) -> BestTimes {
    let offset = bucket_offset(config.timezone_offset_minutes);

    let mut by_day = slot_stats(posts, config, |post| {
        TimeSlotKey::Day(local_day_hour(post.published_at, offset).0)
    });
    by_day.sort_by(compare_by_reactions);

    let mut by_hour = slot_stats(posts, config, |post| {
        TimeSlotKey::Hour(local_day_hour(post.published_at, offset).1)
    });
    by_hour.sort_by(compare_by_reactions);

    let mut combinations: Vec<TimeSlotStat> = slot_stats(posts, config, |post| {
        let (day, hour) = local_day_hour(post.published_at, offset);
        TimeSlotKey::DayHour(day, hour)
    })
    .into_iter()
    .filter(|slot| slot.metrics.post_count >= config.min_slot_posts.max(1))
    .collect();
    combinations.sort_by(|a, b| {
        b.average_engagement
            .total_cmp(&a.average_engagement)
            .then_with(|| b.metrics.post_count.cmp(&a.metrics.post_count))
            .then_with(|| a.key().cmp(&b.key()))
    });
    combinations.truncate(config.best_combinations);

    BestTimes {
        by_day,
        by_hour,
        combinations,
    }
}

fn slot_stats<F>(posts: &[Post], config: &AnalysisConfig, key: F) -> Vec<TimeSlotStat>
where
    F: Fn(&Post) -> TimeSlotKey,
{
    fold_groups(posts, |post| [key(post)])
        .iter()
        .map(|(key, accumulator)| TimeSlotStat::new(*key, accumulator, config.min_slot_posts))
        .collect()
}

fn compare_by_reactions(a: &TimeSlotStat, b: &TimeSlotStat) -> Ordering {
    b.metrics
        .average_reactions
        .total_cmp(&a.metrics.average_reactions)
        .then_with(|| b.metrics.post_count.cmp(&a.metrics.post_count))
        .then_with(|| a.key().cmp(&b.key()))
}

fn bucket_offset(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

/// Day of week and hour of the timestamp after applying the bucketing offset.
pub fn local_day_hour(timestamp: DateTime<Utc>, offset: FixedOffset) -> (DayOfWeek, u8) {
    let local = timestamp.with_timezone(&offset);
    (DayOfWeek::from(local.weekday()), local.hour() as u8)
}
