use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, SkippedRecord};
use crate::grouping::{BestTimes, ReadingTimeStat, TagStat, TopPosts};
use crate::metrics::OverallStats;
use crate::post::Normalized;
use crate::recommend::{Recommendation, RecommendationKind};
use crate::series::{Series, SeriesComparison};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    #[default]
    Ok,
    /// No record survived normalization (including empty input).
    NoAnalyzableData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub input_records: usize,
    pub analyzed_records: usize,
    pub skipped: Vec<SkippedRecord>,
    pub status: DataStatus,
}

impl Diagnostics {
    pub fn from_normalized(normalized: &Normalized) -> Self {
        Self {
            input_records: normalized.input_records,
            analyzed_records: normalized.posts.len(),
            skipped: normalized.skipped.clone(),
            status: if normalized.posts.is_empty() {
                DataStatus::NoAnalyzableData
            } else {
                DataStatus::Ok
            },
        }
    }
}

/// Everything one analysis run produces. Plain data: no field is computed on access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub overall_stats: OverallStats,
    pub tag_performance: Vec<TagStat>,
    pub best_times: BestTimes,
    pub reading_time_performance: Vec<ReadingTimeStat>,
    pub top_posts: TopPosts,
    pub series: Vec<Series>,
    pub series_comparison: SeriesComparison,
    pub recommendations: Vec<Recommendation>,
    pub diagnostics: Diagnostics,
}

impl Report {
    pub fn has_data(&self) -> bool {
        self.diagnostics.status == DataStatus::Ok
    }

    /// Surfaces the no-data condition as an error for callers that cannot show an empty report.
    pub fn ensure_analyzable(&self) -> Result<&Self, AnalysisError> {
        if self.has_data() {
            return Ok(self);
        }
        Err(AnalysisError::NoAnalyzableData {
            input_records: self.diagnostics.input_records,
            skipped: self.diagnostics.skipped.len(),
        })
    }

    pub fn recommendations_of(&self, kind: RecommendationKind) -> impl Iterator<Item = &Recommendation> {
        self.recommendations
            .iter()
            .filter(move |recommendation| recommendation.kind() == kind)
    }
}

/// Merges the component outputs into a report.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    diagnostics: Diagnostics,
    overall_stats: OverallStats,
    tag_performance: Vec<TagStat>,
    best_times: BestTimes,
    reading_time_performance: Vec<ReadingTimeStat>,
    top_posts: TopPosts,
    series: Vec<Series>,
    series_comparison: SeriesComparison,
    recommendations: Vec<Recommendation>,
) -> Report {
    Report {
        overall_stats,
        tag_performance,
        best_times,
        reading_time_performance,
        top_posts,
        series,
        series_comparison,
        recommendations,
        diagnostics,
    }
}
