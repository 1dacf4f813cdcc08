//! Error types for local dashboard state.

/// Errors returned by the key/value store backing session identity.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The state file exists but does not hold a JSON object of strings.
    #[error("corrupt state file {path}: expected an object of strings")]
    Corrupt { path: String },
}
