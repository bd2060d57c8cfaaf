use serde::Serialize;

use crate::error::ExportError;
use crate::grouping::{GroupMetrics, PostSummary, TimeSlotStat};
use crate::recommend::RecommendationDetail;
use crate::report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvSection {
    Tags,
    Days,
    Hours,
    Combinations,
    ReadingTime,
    Posts,
    Series,
    Recommendations,
}

impl CsvSection {
    pub fn from_str(value: &str) -> Result<Self, ExportError> {
        match value.trim().to_lowercase().as_str() {
            "tags" | "tag" => Ok(CsvSection::Tags),
            "days" | "day" => Ok(CsvSection::Days),
            "hours" | "hour" => Ok(CsvSection::Hours),
            "combinations" | "slots" => Ok(CsvSection::Combinations),
            "reading_time" | "reading-time" => Ok(CsvSection::ReadingTime),
            "posts" | "top_posts" => Ok(CsvSection::Posts),
            "series" => Ok(CsvSection::Series),
            "recommendations" => Ok(CsvSection::Recommendations),
            _ => Err(ExportError::UnknownSection(value.to_string())),
        }
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(value)?)
}

const METRIC_HEADERS: [&str; 8] = [
    "post_count",
    "total_reactions",
    "total_comments",
    "total_views",
    "average_reactions",
    "average_comments",
    "average_views",
    "engagement_score",
];

/// Flattens one section of the report into CSV with a header row.
pub fn to_csv(report: &Report, section: CsvSection) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();
    match section {
        CsvSection::Tags => {
            rows.push(header(&["tag"], &METRIC_HEADERS));
            for stat in &report.tag_performance {
                rows.push(with_metrics(vec![stat.tag.clone()], &stat.metrics));
            }
        }
        CsvSection::Days => slot_rows(&mut rows, &report.best_times.by_day),
        CsvSection::Hours => slot_rows(&mut rows, &report.best_times.by_hour),
        CsvSection::Combinations => slot_rows(&mut rows, &report.best_times.combinations),
        CsvSection::ReadingTime => {
            rows.push(header(&["bucket"], &METRIC_HEADERS));
            for stat in &report.reading_time_performance {
                rows.push(with_metrics(vec![stat.label.clone()], &stat.metrics));
            }
        }
        CsvSection::Posts => {
            rows.push(header(
                &["ranking", "rank"],
                &[
                    "id",
                    "title",
                    "url",
                    "published_at",
                    "tags",
                    "page_views_count",
                    "reactions_count",
                    "comments_count",
                    "reading_time_minutes",
                    "engagement_ratio",
                    "time_efficiency",
                ],
            ));
            for (ranking, posts) in report.top_posts.lists() {
                for (index, post) in posts.iter().enumerate() {
                    let mut row = vec![ranking.to_string(), (index + 1).to_string()];
                    row.extend(post_cells(post));
                    rows.push(row);
                }
            }
        }
        CsvSection::Series => {
            rows.push(header(
                &["series", "part_number"],
                &[
                    "post_id",
                    "title",
                    "reactions_count",
                    "comments_count",
                    "parts_found",
                    "completion_ratio",
                    "completion_is_estimate",
                ],
            ));
            for series in &report.series {
                for part in &series.parts {
                    rows.push(vec![
                        series.base_title.clone(),
                        part.part_number.to_string(),
                        part.post.id.clone(),
                        part.post.title.clone(),
                        part.post.reactions_count.to_string(),
                        part.post.comments_count.to_string(),
                        series.parts_found.to_string(),
                        float(series.completion_ratio),
                        series.completion_is_estimate.to_string(),
                    ]);
                }
            }
        }
        CsvSection::Recommendations => {
            rows.push(header(&["type", "tags"], &["score", "title", "description"]));
            for recommendation in &report.recommendations {
                rows.push(vec![
                    recommendation.kind().label().to_string(),
                    recommendation.detail.tags().join("|"),
                    float(headline_score(&recommendation.detail)),
                    recommendation.title.clone(),
                    recommendation.description.clone(),
                ]);
            }
        }
    }

    let mut out = String::new();
    for row in rows {
        let cells: Vec<String> = row.iter().map(|cell| escape(cell)).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

fn slot_rows(rows: &mut Vec<Vec<String>>, slots: &[TimeSlotStat]) {
    rows.push(header(
        &["slot", "day", "hour"],
        &[&METRIC_HEADERS[..], &["average_engagement", "significant"][..]].concat(),
    ));
    for slot in slots {
        let mut row = with_metrics(
            vec![
                slot.label.clone(),
                slot.day.map(|day| day.label().to_string()).unwrap_or_default(),
                slot.hour.map(|hour| hour.to_string()).unwrap_or_default(),
            ],
            &slot.metrics,
        );
        row.push(float(slot.average_engagement));
        row.push(slot.significant.to_string());
        rows.push(row);
    }
}

fn header(leading: &[&str], rest: &[&str]) -> Vec<String> {
    leading
        .iter()
        .chain(rest.iter())
        .map(|name| name.to_string())
        .collect()
}

fn with_metrics(mut row: Vec<String>, metrics: &GroupMetrics) -> Vec<String> {
    row.extend([
        metrics.post_count.to_string(),
        metrics.total_reactions.to_string(),
        metrics.total_comments.to_string(),
        metrics.total_views.to_string(),
        float(metrics.average_reactions),
        float(metrics.average_comments),
        metrics.average_views.map(float).unwrap_or_default(),
        float(metrics.engagement_score),
    ]);
    row
}

fn post_cells(post: &PostSummary) -> Vec<String> {
    vec![
        post.id.clone(),
        post.title.clone(),
        post.url.clone(),
        post.published_at.to_rfc3339(),
        post.tags.iter().cloned().collect::<Vec<_>>().join("|"),
        post.page_views_count
            .map(|views| views.to_string())
            .unwrap_or_default(),
        post.reactions_count.to_string(),
        post.comments_count.to_string(),
        post.reading_time_minutes.to_string(),
        float(post.engagement_ratio),
        float(post.time_efficiency),
    ]
}

fn headline_score(detail: &RecommendationDetail) -> f64 {
    match detail {
        RecommendationDetail::TopPerforming {
            engagement_score, ..
        }
        | RecommendationDetail::Underused {
            engagement_score, ..
        } => *engagement_score,
        RecommendationDetail::Combination {
            average_engagement, ..
        } => *average_engagement,
        RecommendationDetail::Trending { lift, .. } => *lift,
    }
}

fn float(value: f64) -> String {
    format!("{:.4}", value)
}

/// RFC 4180 quoting.
fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_quotes_only_when_needed() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_section_parses_aliases() {
        assert_eq!(CsvSection::from_str("Tags").ok(), Some(CsvSection::Tags));
        assert_eq!(CsvSection::from_str("reading-time").ok(), Some(CsvSection::ReadingTime));
        assert!(CsvSection::from_str("nope").is_err());
    }
}
