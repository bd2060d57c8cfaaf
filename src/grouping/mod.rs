pub mod accumulator;
pub mod tags;
pub mod time_slots;
pub mod top_posts;

pub use accumulator::{fold_groups, merge_groups, GroupAccumulator, GroupMetrics};
pub use tags::{reading_time_performance, tag_groups, tag_performance, ReadingTimeStat, TagStat};
pub use time_slots::{best_times, local_day_hour, BestTimes, DayOfWeek, TimeSlotKey, TimeSlotStat};
pub use top_posts::{rank_by, top_posts, PostSummary, TopPosts};
