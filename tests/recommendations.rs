mod common;

use blog_insights::recommend::recent_window_len;
use blog_insights::{analyze, AnalysisConfig, RecommendationDetail, RecommendationKind};
use common::{approx, article, daily_articles};

#[test]
fn top_performing_follows_tag_order() {
    let records = vec![
        article(1, "A", "2024-01-01T09:00:00Z", &["low"], 1, 0, 1),
        article(2, "B", "2024-01-02T09:00:00Z", &["high"], 50, 5, 1),
        article(3, "C", "2024-01-03T09:00:00Z", &["mid"], 10, 1, 1),
    ];
    let mut config = AnalysisConfig::default();
    config.top_performing_tags = 2;
    let report = analyze(&records, &config);

    let top: Vec<(&str, usize)> = report
        .recommendations_of(RecommendationKind::TopPerforming)
        .map(|recommendation| match &recommendation.detail {
            RecommendationDetail::TopPerforming { tag, rank, .. } => (tag.as_str(), *rank),
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(top, vec![("high", 1), ("mid", 2)]);
}

#[test]
fn underused_tags_beat_the_median_with_few_posts() {
    let records = vec![
        article(1, "A1", "2024-01-01T09:00:00Z", &["steady"], 9, 1, 1),
        article(2, "A2", "2024-01-02T09:00:00Z", &["steady"], 9, 1, 1),
        article(3, "A3", "2024-01-03T09:00:00Z", &["steady"], 9, 1, 1),
        article(4, "B", "2024-01-04T09:00:00Z", &["gem"], 90, 10, 1),
        article(5, "C", "2024-01-05T09:00:00Z", &["dud"], 2, 0, 1),
    ];
    let report = analyze(&records, &AnalysisConfig::default());

    let underused: Vec<&RecommendationDetail> = report
        .recommendations_of(RecommendationKind::Underused)
        .map(|recommendation| &recommendation.detail)
        .collect();
    assert_eq!(underused.len(), 1);
    match underused[0] {
        RecommendationDetail::Underused {
            tag,
            post_count,
            median_engagement_score,
            ..
        } => {
            assert_eq!(tag, "gem");
            assert_eq!(*post_count, 1);
            assert!(approx(*median_engagement_score, 10.0));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn combinations_need_repeated_co_occurrence() {
    let records = vec![
        article(1, "A", "2024-01-01T09:00:00Z", &["rust", "wasm"], 10, 0, 1),
        article(2, "B", "2024-01-02T09:00:00Z", &["rust", "wasm"], 20, 2, 1),
        article(3, "C", "2024-01-03T09:00:00Z", &["go", "rust"], 99, 9, 1),
    ];
    let report = analyze(&records, &AnalysisConfig::default());

    let combinations: Vec<&RecommendationDetail> = report
        .recommendations_of(RecommendationKind::Combination)
        .map(|recommendation| &recommendation.detail)
        .collect();
    assert_eq!(combinations.len(), 1);
    match combinations[0] {
        RecommendationDetail::Combination {
            tags,
            co_occurrences,
            average_engagement,
            ..
        } => {
            assert_eq!(tags, &vec!["rust".to_string(), "wasm".to_string()]);
            assert_eq!(*co_occurrences, 2);
            assert!(approx(*average_engagement, 16.0));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn trending_tags_concentrate_in_recent_posts() {
    let records = daily_articles(&[
        &["rust"],
        &["rust"],
        &["rust"],
        &["rust"],
        &["rust"],
        &["rust"],
        &["rust", "ai"],
        &["rust", "ai"],
    ]);
    let report = analyze(&records, &AnalysisConfig::default());

    let trending: Vec<&RecommendationDetail> = report
        .recommendations_of(RecommendationKind::Trending)
        .map(|recommendation| &recommendation.detail)
        .collect();
    assert_eq!(trending.len(), 1);
    match trending[0] {
        RecommendationDetail::Trending {
            tag,
            recent_posts,
            window_posts,
            lift,
            ..
        } => {
            assert_eq!(tag, "ai");
            assert_eq!(*recent_posts, 2);
            assert_eq!(*window_posts, 2);
            assert!(approx(*lift, 4.0));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn recommendations_are_grouped_by_kind_and_described() {
    let records = daily_articles(&[&["go", "rust"], &["go", "rust"], &["go"], &["rust", "ai"], &["ai"]]);
    let report = analyze(&records, &AnalysisConfig::default());

    let kinds: Vec<RecommendationKind> = report.recommendations.iter().map(|r| r.kind()).collect();
    let mut sorted = kinds.clone();
    sorted.sort_by_key(|kind| *kind as u8);
    assert_eq!(kinds, sorted);
    assert!(report
        .recommendations
        .iter()
        .all(|r| !r.title.is_empty() && !r.description.is_empty()));
}

#[test]
fn window_length_rounds_up() {
    assert_eq!(recent_window_len(8, 0.25), 2);
    assert_eq!(recent_window_len(5, 0.25), 2);
    assert_eq!(recent_window_len(1, 0.25), 1);
}
