use std::env;
use std::sync::Mutex;

use blog_insights::config::{AnalysisConfig, AppConfig};
use blog_insights::error::ConfigError;

// `AppConfig::load` reads the process environment; tests calling it hold this lock.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn defaults_match_the_documented_thresholds() {
    let config = AnalysisConfig::default();
    assert_eq!(config.top_posts, 5);
    assert_eq!(config.best_combinations, 6);
    assert_eq!(config.min_slot_posts, 2);
    assert_eq!(config.top_performing_tags, 5);
    assert_eq!(config.underused_max_posts, 2);
    assert_eq!(config.min_co_occurrence, 2);
    assert!((config.trending_window - 0.25).abs() < 1e-9);
    assert_eq!(config.timezone_offset_minutes, 0);
}

#[test]
fn written_config_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("insights.toml");

    let mut config = AppConfig::default();
    config.analysis.best_combinations = 3;
    config.analysis.trending_window = 0.5;
    config.fetch.per_page = 100;
    config.llm.provider = "groq".to_string();
    config.llm.model = Some("llama-3.3-70b-versatile".to_string());
    config.write(&path).unwrap();

    let restored = AppConfig::read(&path).unwrap();
    assert_eq!(restored.analysis.best_combinations, 3);
    assert!((restored.analysis.trending_window - 0.5).abs() < 1e-9);
    assert_eq!(restored.fetch.per_page, 100);
    assert_eq!(restored.llm.provider, "groq");
    assert_eq!(restored.llm.model.as_deref(), Some("llama-3.3-70b-versatile"));
}

#[test]
fn partial_files_fall_back_to_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("insights.toml");
    std::fs::write(&path, "[analysis]\nmax_trending = 2\n").unwrap();

    let (config, resolved) = AppConfig::load(Some(path.clone())).unwrap();
    assert_eq!(resolved, Some(path));
    assert_eq!(config.analysis.max_trending, 2);
    assert_eq!(config.analysis.best_combinations, 6);
    assert_eq!(config.fetch.per_page, 30);
}

#[test]
fn missing_file_loads_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = AppConfig::load(Some(dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.analysis.min_co_occurrence, 2);
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[analysis\ntop_posts = ").unwrap();

    assert!(matches!(AppConfig::read(&path), Err(ConfigError::Parse { .. })));
}

#[test]
fn environment_overrides_file_values() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("insights.toml");
    std::fs::write(
        &path,
        "[analysis]\ntop_posts = 3\nbest_combinations = 4\n\n[fetch]\napi_base = \"https://file.example/api\"\n",
    )
    .unwrap();

    env::set_var("DEVTO_API_BASE", "http://localhost:9000/api");
    env::set_var("INSIGHTS_TOP_POSTS", "8");
    env::set_var("INSIGHTS_TZ_OFFSET_MINUTES", "-300");
    let (config, _) = AppConfig::load(Some(path.clone())).unwrap();

    env::set_var("DEVTO_API_BASE", "   ");
    env::set_var("INSIGHTS_TOP_POSTS", "many");
    let (ignored, _) = AppConfig::load(Some(path)).unwrap();

    env::remove_var("DEVTO_API_BASE");
    env::remove_var("INSIGHTS_TOP_POSTS");
    env::remove_var("INSIGHTS_TZ_OFFSET_MINUTES");

    assert_eq!(config.fetch.api_base, "http://localhost:9000/api");
    assert_eq!(config.analysis.top_posts, 8);
    assert_eq!(config.analysis.timezone_offset_minutes, -300);
    assert_eq!(config.analysis.best_combinations, 4);

    assert_eq!(ignored.fetch.api_base, "https://file.example/api");
    assert_eq!(ignored.analysis.top_posts, 3);
}
