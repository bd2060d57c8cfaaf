mod common;

use blog_insights::series::{compare_series, detect_series};
use blog_insights::{analyze, analyze_with_detector, normalize_records, AnalysisConfig, PartMarker, PartPatternDetector};
use common::{approx, article};

#[test]
fn two_parts_make_one_series_and_strays_are_ignored() {
    let records = vec![
        article(1, "Intro to X (Part 1)", "2024-01-01T09:00:00Z", &["x"], 10, 2, 5),
        article(2, "Intro to X (Part 2)", "2024-01-08T09:00:00Z", &["x"], 20, 4, 5),
        article(3, "Intro to Y", "2024-01-09T09:00:00Z", &["y"], 5, 0, 5),
    ];
    let report = analyze(&records, &AnalysisConfig::default());

    assert_eq!(report.series.len(), 1);
    let series = &report.series[0];
    assert_eq!(series.base_title, "Intro to X");
    assert_eq!(series.parts_found, 2);
    let numbers: Vec<u32> = series.parts.iter().map(|part| part.part_number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert!(approx(series.completion_ratio, 1.0));
    assert!(series.completion_is_estimate);
    assert!(approx(series.average_reactions, 15.0));

    let comparison = &report.series_comparison;
    assert_eq!(comparison.series_posts, 2);
    assert_eq!(comparison.standalone_posts, 1);
    assert!(approx(comparison.standalone_average_reactions, 5.0));
}

#[test]
fn a_single_part_is_not_a_series() {
    let records = vec![
        article(1, "Lonely Topic (Part 1)", "2024-01-01T09:00:00Z", &[], 1, 0, 1),
        article(2, "Other thing", "2024-01-02T09:00:00Z", &[], 1, 0, 1),
    ];
    let report = analyze(&records, &AnalysisConfig::default());
    assert!(report.series.is_empty());
    assert_eq!(report.series_comparison.series_posts, 0);
}

#[test]
fn declared_totals_make_completion_exact() {
    let records = vec![
        article(1, "Rust Async [Part 1 of 4]", "2024-01-01T09:00:00Z", &[], 1, 0, 1),
        article(2, "Rust Async [Part 2 of 4]", "2024-01-02T09:00:00Z", &[], 1, 0, 1),
    ];
    let report = analyze(&records, &AnalysisConfig::default());

    let series = &report.series[0];
    assert_eq!(series.declared_total, Some(4));
    assert!(approx(series.completion_ratio, 0.5));
    assert!(!series.completion_is_estimate);
}

#[test]
fn gaps_lower_the_estimated_completion() {
    let records = vec![
        article(1, "Intro to X (Part 1)", "2024-01-01T09:00:00Z", &[], 1, 0, 1),
        article(2, "intro to x - part 3", "2024-01-03T09:00:00Z", &[], 1, 0, 1),
    ];
    let posts = normalize_records(&records).posts;
    let series = detect_series(&posts, &PartPatternDetector);

    assert_eq!(series.len(), 1);
    assert_eq!(series[0].base_title, "Intro to X");
    assert_eq!(series[0].highest_part, 3);
    assert!(approx(series[0].completion_ratio, 2.0 / 3.0));
}

#[test]
fn custom_detectors_plug_into_the_pipeline() {
    let records = vec![
        article(1, "Tip 1", "2024-01-01T09:00:00Z", &[], 4, 0, 1),
        article(2, "Tip 2", "2024-01-02T09:00:00Z", &[], 6, 0, 1),
        article(3, "Intro to X (Part 1)", "2024-01-03T09:00:00Z", &[], 1, 0, 1),
    ];
    let numbered = |title: &str| -> Option<PartMarker> {
        let (base, number) = title.rsplit_once(' ')?;
        Some(PartMarker {
            base_title: base.to_string(),
            part_number: number.parse().ok()?,
            declared_total: None,
        })
    };

    let report = analyze_with_detector(&records, &AnalysisConfig::default(), &numbered);
    assert_eq!(report.series.len(), 1);
    assert_eq!(report.series[0].base_title, "Tip");

    let posts = normalize_records(&records).posts;
    let comparison = compare_series(&posts, &report.series);
    assert_eq!(comparison.series_posts, 2);
    assert!(approx(comparison.series_average_reactions, 5.0));
}
