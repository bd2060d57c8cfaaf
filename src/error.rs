use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Why a raw post record was left out of the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("missing required field `{field}`")]
    MissingField { field: String },
    #[error("invalid value for `{field}`: {detail}")]
    InvalidField { field: String, detail: String },
    #[error("unparsable timestamp `{value}`")]
    UnparsableTimestamp { value: String },
    #[error("duplicate post id `{id}`")]
    DuplicateId { id: String },
}

impl SkipReason {
    pub fn missing(field: &str) -> Self {
        SkipReason::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, detail: impl Into<String>) -> Self {
        SkipReason::InvalidField {
            field: field.to_string(),
            detail: detail.into(),
        }
    }
}

/// A raw record the normalizer dropped. Never fatal; collected for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Position of the record in the input sequence.
    pub index: usize,
    /// The record id when one could be read.
    pub id: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no analyzable posts ({skipped} of {input_records} records skipped)")]
    NoAnalyzableData { input_records: usize, skipped: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown csv section `{0}` (expected tags, days, hours, combinations, reading_time, posts, series or recommendations)")]
    UnknownSection(String),
}

#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("completion did not contain a JSON {0}")]
    MissingJson(&'static str),
    #[error("completion JSON did not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}
