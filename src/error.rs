use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the fine-tuning engine.
///
/// Every variant is fatal for the operation that raised it: sessions abort,
/// and the search driver aborts the whole sweep rather than skipping a trial.
#[derive(Debug, Error)]
pub enum TuneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Malformed batch: {0}")]
    MalformedBatch(String),

    #[error("Model state mismatch: {0}")]
    StateMismatch(String),

    #[error("Corrupt checkpoint {path}: {reason}")]
    CorruptCheckpoint { path: PathBuf, reason: String },

    #[error("Model state is not finite: {0}")]
    NonFiniteState(String),

    #[error("No checkpoint stored for epoch {0}")]
    MissingCheckpoint(usize),

    #[error("Failed to write checkpoint for epoch {epoch}: {source}")]
    CheckpointWrite {
        epoch: usize,
        #[source]
        source: Box<TuneError>,
    },

    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TuneError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedBatch(msg.into())
    }

    pub fn mismatch(msg: impl Into<String>) -> Self {
        Self::StateMismatch(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, TuneError>;
