//! Dashboard configuration models and layered config loading.
//!
//! This crate owns the `memos.json5` schema, validation, and layer-merging
//! logic used by the terminal dashboard and the headless CLI.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{
    ConfigLayer, ConfigLayerSource, ENV_API_BASE_URL, LayeredConfig, LayeredConfigOptions,
};
/// Configuration schema models.
pub use model::*;
