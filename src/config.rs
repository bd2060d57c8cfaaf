use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Thresholds and list sizes used by the aggregation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Length of every top-post list.
    pub top_posts: usize,
    /// Cap for the best (day, hour) combinations list.
    pub best_combinations: usize,
    /// Slots with fewer posts never count as a "best" slot.
    pub min_slot_posts: usize,
    pub top_performing_tags: usize,
    /// Tags used on at most this many posts are candidates for `Underused`.
    pub underused_max_posts: usize,
    pub min_co_occurrence: usize,
    pub max_combinations: usize,
    /// Fraction of the most recent posts that forms the trending window.
    pub trending_window: f64,
    pub trending_min_recent_posts: usize,
    pub max_trending: usize,
    pub most_used_tags: usize,
    pub llm_top_tags: usize,
    /// Fixed offset applied to publish timestamps before day/hour bucketing.
    pub timezone_offset_minutes: i32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_posts: 5,
            best_combinations: 6,
            min_slot_posts: 2,
            top_performing_tags: 5,
            underused_max_posts: 2,
            min_co_occurrence: 2,
            max_combinations: 5,
            trending_window: 0.25,
            trending_min_recent_posts: 2,
            max_trending: 5,
            most_used_tags: 5,
            llm_top_tags: 10,
            timezone_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub api_base: String,
    pub max_pages: u32,
    pub per_page: u32,
    pub fetch_details: bool,
    pub timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_base: "https://dev.to/api".to_string(),
            max_pages: 5,
            per_page: 30,
            fetch_details: true,
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// One of `openai`, `groq`, `mock` or `none`.
    pub provider: String,
    pub model: Option<String>,
    pub temperature: f64,
    pub topic_ideas: usize,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            temperature: 0.4,
            topic_ideas: 5,
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub fetch: FetchConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => Self::read(path)?,
            _ => AppConfig::default(),
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = toml::to_string_pretty(self)?;
        std::fs::write(path, payload).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base) = env::var("DEVTO_API_BASE") {
            if !base.trim().is_empty() {
                self.fetch.api_base = base;
            }
        }
        if let Ok(pages) = env::var("DEVTO_MAX_PAGES") {
            if let Ok(value) = pages.parse::<u32>() {
                self.fetch.max_pages = value;
            }
        }
        if let Ok(provider) = env::var("LLM_PROVIDER") {
            if !provider.trim().is_empty() {
                self.llm.provider = provider.trim().to_lowercase();
            }
        }
        if let Ok(model) = env::var("LLM_MODEL") {
            if !model.trim().is_empty() {
                self.llm.model = Some(model);
            }
        }
        if let Ok(top_posts) = env::var("INSIGHTS_TOP_POSTS") {
            if let Ok(value) = top_posts.parse::<usize>() {
                self.analysis.top_posts = value;
            }
        }
        if let Ok(offset) = env::var("INSIGHTS_TZ_OFFSET_MINUTES") {
            if let Ok(value) = offset.parse::<i32>() {
                self.analysis.timezone_offset_minutes = value;
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("INSIGHTS_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/insights.toml")))
}
