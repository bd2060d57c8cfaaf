mod common;

use chrono::{FixedOffset, TimeZone, Utc};
use serde_json::Value;

use blog_insights::export::to_json;
use blog_insights::grouping::{fold_groups, local_day_hour, merge_groups, tag_groups, DayOfWeek};
use blog_insights::post::ReadingTimeBucket;
use blog_insights::{analyze, analyze_strict, normalize_records, AnalysisConfig, AnalysisError, DataStatus};
use common::{approx, article, daily_articles, with_views};

fn scenario() -> Vec<Value> {
    vec![
        article(1, "Go basics", "2024-01-01T09:00:00Z", &["go"], 10, 1, 5),
        article(2, "Go and Rust", "2024-01-02T09:00:00Z", &["go", "rust"], 20, 2, 5),
        article(3, "Rust basics", "2024-01-03T09:00:00Z", &["rust"], 30, 3, 5),
    ]
}

#[test]
fn three_post_scenario_totals_and_tags() {
    let report = analyze(&scenario(), &AnalysisConfig::default());
    let stats = &report.overall_stats;

    assert_eq!(stats.total_articles, 3);
    assert_eq!(stats.total_reactions, 60);
    assert_eq!(stats.total_comments, 6);
    assert!(approx(stats.average_reading_time, 5.0));
    assert_eq!(stats.average_views, None);

    let go = report.tag_performance.iter().find(|stat| stat.tag == "go").unwrap();
    assert_eq!(go.metrics.post_count, 2);
    assert!(approx(go.metrics.average_reactions, 15.0));
    assert!(approx(go.metrics.engagement_score, 16.5));

    let rust = report.tag_performance.iter().find(|stat| stat.tag == "rust").unwrap();
    assert_eq!(rust.metrics.post_count, 2);
    assert!(approx(rust.metrics.average_reactions, 25.0));

    assert_eq!(report.tag_performance[0].tag, "rust");
    assert_eq!(report.diagnostics.status, DataStatus::Ok);
}

#[test]
fn tag_counts_cover_every_post() {
    let multi = analyze(&scenario(), &AnalysisConfig::default());
    let counted: usize = multi.tag_performance.iter().map(|stat| stat.metrics.post_count).sum();
    assert!(counted >= multi.overall_stats.total_articles);

    let single = analyze(&daily_articles(&[&["a"], &["b"], &["a"], &["c"]]), &AnalysisConfig::default());
    let counted: usize = single.tag_performance.iter().map(|stat| stat.metrics.post_count).sum();
    assert_eq!(counted, 4);
}

#[test]
fn empty_input_is_a_flagged_zero_report() {
    let report = analyze(&[], &AnalysisConfig::default());

    assert_eq!(report.overall_stats.total_articles, 0);
    assert!(approx(report.overall_stats.average_reading_time, 0.0));
    assert!(report.tag_performance.is_empty());
    assert!(report.best_times.by_day.is_empty());
    assert!(report.best_times.combinations.is_empty());
    assert!(report.top_posts.by_views.is_empty());
    assert!(report.series.is_empty());
    assert!(report.recommendations.is_empty());
    assert_eq!(report.diagnostics.status, DataStatus::NoAnalyzableData);
    assert!(!report.has_data());

    assert!(matches!(
        analyze_strict(&[], &AnalysisConfig::default()),
        Err(AnalysisError::NoAnalyzableData { input_records: 0, skipped: 0 })
    ));
}

#[test]
fn all_malformed_input_reports_no_data() {
    let records = vec![serde_json::json!("oops"), serde_json::json!({"id": 1})];
    let report = analyze(&records, &AnalysisConfig::default());

    assert_eq!(report.diagnostics.input_records, 2);
    assert_eq!(report.diagnostics.skipped.len(), 2);
    assert!(report.ensure_analyzable().is_err());
}

#[test]
fn repeated_runs_serialize_identically() {
    let mut records = scenario();
    records.push(article(4, "Intro to X (Part 1)", "2024-01-08T09:00:00Z", &["go"], 3, 0, 12));
    records.push(article(5, "Intro to X (Part 2)", "2024-01-15T09:00:00Z", &["go", "rust"], 7, 1, 2));

    let config = AnalysisConfig::default();
    let first = to_json(&analyze(&records, &config)).unwrap();
    let second = to_json(&analyze(&records, &config)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn top_posts_are_bounded_and_ordered() {
    let records: Vec<Value> = (1..=8u64)
        .map(|id| {
            let views = if id == 8 { 300 } else { id * 10 };
            with_views(
                article(id, &format!("Post {}", id), &format!("2024-02-{:02}T10:00:00Z", id), &["go"], id, 0, 1),
                views,
            )
        })
        .collect();
    let mut config = AnalysisConfig::default();
    config.top_posts = 5;
    let report = analyze(&records, &config);

    assert_eq!(report.top_posts.by_views.len(), 5);
    assert_eq!(report.top_posts.by_views[0].id, "8");
    for pair in report.top_posts.by_views.windows(2) {
        assert!(pair[0].page_views_count >= pair[1].page_views_count);
    }
    for (_, list) in report.top_posts.lists() {
        assert!(list.len() <= 5);
    }
    assert!(approx(report.overall_stats.average_views.unwrap(), 580.0 / 8.0));
}

#[test]
fn ranking_ties_prefer_newer_posts() {
    let records = vec![
        article(1, "Older", "2024-01-01T00:00:00Z", &[], 5, 0, 1),
        article(2, "Newer", "2024-06-01T00:00:00Z", &[], 5, 0, 1),
    ];
    let report = analyze(&records, &AnalysisConfig::default());
    assert_eq!(report.top_posts.by_engagement[0].title, "Newer");
    assert_eq!(report.top_posts.by_views[0].title, "Newer");
}

#[test]
fn best_combinations_need_two_posts() {
    // 2024-01-01 is a Monday.
    let records = vec![
        article(1, "A", "2024-01-01T09:00:00Z", &["go"], 10, 0, 1),
        article(2, "B", "2024-01-08T09:15:00Z", &["go"], 20, 0, 1),
        article(3, "C", "2024-01-02T10:00:00Z", &["go"], 90, 9, 1),
    ];
    let report = analyze(&records, &AnalysisConfig::default());
    let times = &report.best_times;

    assert_eq!(times.combinations.len(), 1);
    assert_eq!(times.combinations[0].label, "Monday 09:00");
    assert!(times.combinations.iter().all(|slot| slot.metrics.post_count >= 2));

    assert_eq!(times.by_day[0].day, Some(DayOfWeek::Tuesday));
    assert!(!times.by_day[0].significant);
    assert_eq!(times.best_day().map(|slot| slot.label.as_str()), Some("Monday"));
    assert_eq!(times.best_hour().map(|slot| slot.label.as_str()), Some("09:00"));
}

#[test]
fn timezone_offset_moves_posts_across_days() {
    let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    assert_eq!(local_day_hour(timestamp, plus_two), (DayOfWeek::Tuesday, 1));

    let records = vec![article(1, "Late", "2024-01-01T23:30:00Z", &[], 1, 0, 1)];
    let mut config = AnalysisConfig::default();
    config.timezone_offset_minutes = 120;
    let report = analyze(&records, &config);
    assert_eq!(report.best_times.by_day[0].label, "Tuesday");
    assert_eq!(report.best_times.by_hour[0].label, "01:00");
}

#[test]
fn reading_time_buckets_are_ranked() {
    let records = vec![
        article(1, "Quick", "2024-01-01T00:00:00Z", &[], 2, 0, 3),
        article(2, "Medium", "2024-01-02T00:00:00Z", &[], 20, 5, 7),
        article(3, "Long", "2024-01-03T00:00:00Z", &[], 8, 1, 12),
    ];
    let report = analyze(&records, &AnalysisConfig::default());
    let buckets: Vec<ReadingTimeBucket> = report
        .reading_time_performance
        .iter()
        .map(|stat| stat.bucket)
        .collect();
    assert_eq!(
        buckets,
        vec![
            ReadingTimeBucket::FiveToTen,
            ReadingTimeBucket::OverTen,
            ReadingTimeBucket::UnderFive
        ]
    );
}

#[test]
fn merged_partial_groups_match_a_single_pass() {
    let records = daily_articles(&[&["go"], &["go", "rust"], &["rust"], &["go"], &["wasm", "rust"]]);
    let posts = normalize_records(&records).posts;
    let (left, right) = posts.split_at(2);

    let tag_keys = |post: &blog_insights::Post| post.tags.iter().cloned().collect::<Vec<_>>();
    let merged = merge_groups(fold_groups(left, tag_keys), &fold_groups(right, tag_keys));
    assert_eq!(merged, tag_groups(&posts));
}
