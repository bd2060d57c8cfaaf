pub mod config;
pub mod error;
pub mod export;
pub mod grouping;
pub mod insights;
pub mod metrics;
pub mod post;
pub mod recommend;
pub mod report;
pub mod series;

use serde_json::Value;
use tracing::{debug, info};

pub use crate::config::{AnalysisConfig, AppConfig};
pub use crate::error::{AnalysisError, SkipReason, SkippedRecord};
pub use crate::post::{normalize_records, Normalized, Post, RawPost};
pub use crate::recommend::{Recommendation, RecommendationDetail, RecommendationKind};
pub use crate::report::{DataStatus, Diagnostics, Report};
pub use crate::series::{PartMarker, PartPatternDetector, SeriesDetector};

/// Runs the full pipeline over raw records with the default series detector.
/// Empty or fully malformed input yields a zero-valued report flagged `NoAnalyzableData`.
pub fn analyze(records: &[Value], config: &AnalysisConfig) -> Report {
    analyze_with_detector(records, config, &PartPatternDetector)
}

/// Like [`analyze`], but fails with [`AnalysisError::NoAnalyzableData`] instead of
/// returning an empty report.
pub fn analyze_strict(records: &[Value], config: &AnalysisConfig) -> Result<Report, AnalysisError> {
    let report = analyze(records, config);
    report.ensure_analyzable()?;
    Ok(report)
}

pub fn analyze_with_detector(
    records: &[Value],
    config: &AnalysisConfig,
    detector: &dyn SeriesDetector,
) -> Report {
    let normalized = normalize_records(records);
    analyze_posts(&normalized, config, detector)
}

pub fn analyze_posts(
    normalized: &Normalized,
    config: &AnalysisConfig,
    detector: &dyn SeriesDetector,
) -> Report {
    let posts = normalized.posts.as_slice();
    let diagnostics = Diagnostics::from_normalized(normalized);

    let overall_stats = metrics::overall_stats(posts, config.most_used_tags);
    let tag_performance = grouping::tag_performance(posts);
    let best_times = grouping::best_times(posts, config);
    let reading_time_performance = grouping::reading_time_performance(posts);
    let top_posts = grouping::top_posts(posts, config.top_posts);
    debug!(
        tags = tag_performance.len(),
        days = best_times.by_day.len(),
        hours = best_times.by_hour.len(),
        combinations = best_times.combinations.len(),
        "grouped posts"
    );

    let series = series::detect_series(posts, detector);
    let series_comparison = series::compare_series(posts, &series);
    let recommendations = recommend::recommend(posts, &tag_performance, config);

    info!(
        analyzed = diagnostics.analyzed_records,
        skipped = diagnostics.skipped.len(),
        tags = tag_performance.len(),
        series = series.len(),
        recommendations = recommendations.len(),
        "analysis complete"
    );

    report::assemble(
        diagnostics,
        overall_stats,
        tag_performance,
        best_times,
        reading_time_performance,
        top_posts,
        series,
        series_comparison,
        recommendations,
    )
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as i64;
    let mut chars: Vec<char> = rounded.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
