//! Error types for dashboard config loading.

use thiserror::Error;

/// Errors returned while loading or validating `memos.json5` layers.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a layer from disk failed.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// A layer is not valid JSON5.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// The merged document does not fit the config model.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A field in a specific layer failed schema validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// An environment override carried an unusable value.
    #[error("invalid value in {name}: {message}")]
    InvalidEnv { name: String, message: String },
    /// Cross-field validation of the effective config failed.
    #[error("invalid config: {0}")]
    Invalid(String),
}
