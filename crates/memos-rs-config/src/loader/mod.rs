//! Layered configuration loader.
//!
//! Discovers `memos.json5` layers (user, cwd, runtime), validates each against
//! the schema, merges them, applies environment overrides, and produces the
//! final `DashboardConfig`.

mod layer_io;
mod merge;
mod schema;

#[cfg(test)]
mod tests;

use crate::{
    ConfigError, DashboardConfig, DashboardView, MAX_CONDENSATION_ATTEMPTS, MAX_TOP_K,
};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "memos.json5";
/// Default config directory under the home directory.
const DEFAULT_CONFIG_DIR: &str = ".memos";
/// Default session state filename under the config directory.
const DEFAULT_STATE_FILE: &str = "session.json";
/// Environment variable overriding `api.base_url`.
pub const ENV_API_BASE_URL: &str = "MEMOS_API_BASE_URL";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: DashboardConfig,
    /// Metadata for each layer applied during load.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// `~/.memos/memos.json5`.
    User,
    /// `./memos.json5`.
    Cwd,
    /// Explicit `--config` paths.
    Runtime,
    /// Environment variables (highest precedence).
    Env,
}

/// Metadata about an applied config layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    /// Location on disk; `None` for environment overrides.
    pub path: Option<PathBuf>,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to find the cwd layer.
    pub cwd: PathBuf,
    /// Optional user config path (defaults to `~/.memos/memos.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied after file layers.
    pub runtime_paths: Vec<PathBuf>,
    /// Read `MEMOS_*` environment overrides.
    pub read_env: bool,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
            read_env: true,
        }
    }

    /// Add a runtime override config path.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Skip environment overrides.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }
}

impl DashboardConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value: Value = json5::from_str(&contents)?;
        config_from_value(value, "config")
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations.
    ///
    /// Layer precedence (low -> high): user, cwd, runtime, environment.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let mut layers = Vec::new();
        let mut merged = Value::Object(serde_json::Map::new());
        let mut seen_paths = HashSet::new();

        let mut candidates = Vec::new();
        if let Some(path) = options.user_config_path.clone() {
            candidates.push((ConfigLayerSource::User, path, false));
        }
        candidates.push((
            ConfigLayerSource::Cwd,
            options.cwd.join(DEFAULT_CONFIG_FILE),
            false,
        ));
        for path in &options.runtime_paths {
            candidates.push((ConfigLayerSource::Runtime, path.clone(), true));
        }

        for (source, path, required) in candidates {
            if !required && !path.exists() {
                debug!(
                    "skipping missing layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            if !seen_paths.insert(layer_io::unique_path(&path)) {
                debug!(
                    "skipping duplicate layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            let value = layer_io::load_layer(source, &path)?;
            merge::merge_json_values(&mut merged, &value);
            layers.push(ConfigLayer {
                source,
                path: Some(path),
            });
        }

        let mut config = config_from_value(merged, "effective")?;
        if options.read_env && config.apply_env_overrides(|name| std::env::var(name).ok())? {
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Env,
                path: None,
            });
        }
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Apply `MEMOS_*` overrides read through `lookup`. Returns whether any applied.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<bool, ConfigError> {
        let Some(base_url) = lookup(ENV_API_BASE_URL) else {
            return Ok(false);
        };
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Ok(false);
        }
        if !is_http_url(base_url) {
            return Err(ConfigError::InvalidEnv {
                name: ENV_API_BASE_URL.to_string(),
                message: "expected http:// or https:// URL".to_string(),
            });
        }
        debug!("applying env override (name={})", ENV_API_BASE_URL);
        self.api.base_url = base_url.to_string();
        Ok(true)
    }

    /// Session state file, falling back to `~/.memos/session.json`.
    pub fn resolved_state_path(&self) -> Option<PathBuf> {
        self.session
            .state_path
            .clone()
            .or_else(layer_io::default_state_path)
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(self.api.base_url.trim()) {
            return Err(ConfigError::Invalid(
                "api.base_url must start with http:// or https://".to_string(),
            ));
        }
        if self.polling.stats_interval_ms == 0 || self.polling.pipeline_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "polling intervals must be greater than zero".to_string(),
            ));
        }
        if self.polling.condensation_backoff_ms.is_empty() {
            return Err(ConfigError::Invalid(
                "polling.condensation_backoff_ms requires at least one delay".to_string(),
            ));
        }
        if self.polling.condensation_backoff_ms.len() > MAX_CONDENSATION_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "polling.condensation_backoff_ms allows at most {MAX_CONDENSATION_ATTEMPTS} delays"
            )));
        }
        for (name, value) in [
            ("query.top_k", self.query.top_k),
            ("query.radar_top_k", self.query.radar_top_k),
        ] {
            if value == 0 || value > MAX_TOP_K {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 1 and {MAX_TOP_K}"
                )));
            }
        }
        if self.session.default_namespace.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "session.default_namespace must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn config_from_value(value: Value, label: &str) -> Result<DashboardConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: DashboardConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

/// Names accepted for `ui.default_view`.
fn view_names() -> Vec<&'static str> {
    DashboardView::ALL.iter().map(|view| view.as_str()).collect()
}
