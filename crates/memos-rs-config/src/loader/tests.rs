//! Tests for layered configuration loading.

use super::*;
use crate::{DEFAULT_API_BASE_URL, DEFAULT_CONDENSATION_BACKOFF_MS};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options rooted in a temp dir with no user layer and no env lookups.
fn isolated_options(cwd: &Path) -> LayeredConfigOptions {
    LayeredConfigOptions {
        cwd: cwd.to_path_buf(),
        user_config_path: None,
        runtime_paths: Vec::new(),
        read_env: false,
    }
}

/// Verify that an empty config yields documented defaults.
#[test]
fn parse_minimal_config() {
    let config = DashboardConfig::load_from_str("{}").expect("config");
    assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.polling.stats_interval(), Duration::from_secs(2));
    assert_eq!(
        config.polling.condensation_backoff_ms,
        DEFAULT_CONDENSATION_BACKOFF_MS.to_vec()
    );
    assert_eq!(config.query.top_k, 6);
    assert_eq!(config.query.radar_top_k, 12);
    assert_eq!(config.session.default_namespace, "Project_X");
    assert_eq!(config.ui.default_view, DashboardView::Radar);
    assert!(!config.ui.mock);
}

/// JSON5 comments, trailing commas and unquoted keys are accepted.
#[test]
fn parse_json5_syntax() {
    let json5 = r#"{
        // backend on another host
        api: { base_url: "http://memos.internal:9000", timeout_ms: 1500, },
        ui: { default_view: "rag_debugger" },
    }"#;
    let config = DashboardConfig::load_from_str(json5).expect("config");
    assert_eq!(config.api.base_url, "http://memos.internal:9000");
    assert_eq!(config.api.timeout(), Some(Duration::from_millis(1500)));
    assert_eq!(config.ui.default_view, DashboardView::RagDebugger);
}

/// Reject unexpected top-level config keys.
#[test]
fn rejects_unknown_top_level_key() {
    let err = DashboardConfig::load_from_str("{ unexpected: true }").unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

/// Reject view names the dashboard does not have.
#[test]
fn rejects_unknown_default_view() {
    let err = DashboardConfig::load_from_str(r#"{ ui: { default_view: "graphs" } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("ui.default_view"));
    assert!(msg.contains("rag_debugger"));
}

/// Reject negative durations at the schema layer.
#[test]
fn rejects_negative_interval() {
    let err =
        DashboardConfig::load_from_str("{ polling: { stats_interval_ms: -5 } }").unwrap_err();
    assert!(format!("{err}").contains("polling.stats_interval_ms"));
}

/// Out-of-range retrieval sizes fail validation.
#[test]
fn rejects_top_k_out_of_range() {
    let err = DashboardConfig::load_from_str("{ query: { radar_top_k: 51 } }").unwrap_err();
    assert!(format!("{err}").contains("query.radar_top_k"));
    assert!(DashboardConfig::load_from_str("{ query: { top_k: 0 } }").is_err());
}

/// An empty backoff list would never poll, so it is rejected.
#[test]
fn rejects_empty_backoff() {
    let err = DashboardConfig::load_from_str("{ polling: { condensation_backoff_ms: [] } }")
        .unwrap_err();
    assert!(format!("{err}").contains("condensation_backoff_ms"));
}

/// The poll makes at most six attempts, one per delay.
#[test]
fn rejects_backoff_longer_than_six() {
    let err = DashboardConfig::load_from_str(
        "{ polling: { condensation_backoff_ms: [1, 1, 1, 1, 1, 1, 1, 1, 1, 1] } }",
    )
    .unwrap_err();
    assert!(format!("{err}").contains("at most 6 delays"));
    let six = "{ polling: { condensation_backoff_ms: [1, 1, 1, 1, 1, 1] } }";
    assert!(DashboardConfig::load_from_str(six).is_ok());
}

/// Non-HTTP base URLs are refused.
#[test]
fn rejects_non_http_base_url() {
    let err = DashboardConfig::load_from_str(r#"{ api: { base_url: "ftp://x" } }"#).unwrap_err();
    assert!(format!("{err}").contains("api.base_url"));
}

/// Runtime layers override cwd layers, which override user layers.
#[test]
fn layered_config_precedence() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("work");
    fs::create_dir_all(&cwd).expect("cwd");

    let user_config = root.join("home").join(".memos").join("memos.json5");
    write_json5(
        &user_config,
        r#"{ api: { base_url: "http://user:1" }, query: { top_k: 3 }, ui: { mock: true } }"#,
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ api: { base_url: "http://cwd:2" }, query: { radar_top_k: 20 } }"#,
    );
    let runtime = root.join("runtime.json5");
    write_json5(&runtime, r#"{ api: { base_url: "http://runtime:3" } }"#);

    let mut options = isolated_options(&cwd).with_runtime_path(&runtime);
    options.user_config_path = Some(user_config.clone());
    let layered = DashboardConfig::load_layered_with_options(options).expect("layered");

    assert_eq!(layered.config.api.base_url, "http://runtime:3");
    assert_eq!(layered.config.query.top_k, 3);
    assert_eq!(layered.config.query.radar_top_k, 20);
    assert!(layered.config.ui.mock);
    let sources: Vec<ConfigLayerSource> = layered.layers.iter().map(|l| l.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Runtime
        ]
    );
}

/// Missing optional layers are skipped; a missing runtime layer is an error.
#[test]
fn missing_runtime_layer_fails() {
    let temp = TempDir::new().expect("tmp");
    let layered =
        DashboardConfig::load_layered_with_options(isolated_options(temp.path())).expect("empty");
    assert!(layered.layers.is_empty());
    assert_eq!(layered.config, DashboardConfig::default());

    let options = isolated_options(temp.path()).with_runtime_path(temp.path().join("nope.json5"));
    let err = DashboardConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}

/// The same file reached through two layers is applied once.
#[test]
fn duplicate_layer_paths_load_once() {
    let temp = TempDir::new().expect("tmp");
    let cwd_config = temp.path().join(DEFAULT_CONFIG_FILE);
    write_json5(&cwd_config, "{ query: { top_k: 9 } }");

    let mut options = isolated_options(temp.path()).with_runtime_path(&cwd_config);
    options.user_config_path = Some(cwd_config.clone());
    let layered = DashboardConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::User);
}

/// Schema errors name the layer they came from.
#[test]
fn layer_errors_carry_layer_label() {
    let temp = TempDir::new().expect("tmp");
    write_json5(
        &temp.path().join(DEFAULT_CONFIG_FILE),
        "{ session: { default_namespace: 7 } }",
    );
    let err =
        DashboardConfig::load_layered_with_options(isolated_options(temp.path())).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("));
    assert!(msg.contains("session.default_namespace"));
}

/// The env override replaces the base URL and blank values are ignored.
#[test]
fn env_override_sets_base_url() {
    let mut config = DashboardConfig::default();
    let applied = config
        .apply_env_overrides(|name| {
            (name == ENV_API_BASE_URL).then(|| "https://memos.example.com/".to_string())
        })
        .expect("env");
    assert!(applied);
    assert_eq!(config.api.base_url, "https://memos.example.com/");

    let mut untouched = DashboardConfig::default();
    assert!(!untouched
        .apply_env_overrides(|_| Some("   ".to_string()))
        .expect("blank"));
    assert_eq!(untouched.api.base_url, DEFAULT_API_BASE_URL);
}

/// A malformed env override is reported with the variable name.
#[test]
fn env_override_rejects_garbage() {
    let mut config = DashboardConfig::default();
    let err = config
        .apply_env_overrides(|_| Some("localhost:8000".to_string()))
        .unwrap_err();
    assert!(format!("{err}").contains(ENV_API_BASE_URL));
}

/// An explicit state path wins over the home-directory default.
#[test]
fn explicit_state_path_is_used() {
    let config =
        DashboardConfig::load_from_str(r#"{ session: { state_path: "/tmp/memos-state.json" } }"#)
            .expect("config");
    assert_eq!(
        config.resolved_state_path(),
        Some(PathBuf::from("/tmp/memos-state.json"))
    );
}

/// View names parse with common aliases.
#[test]
fn view_names_parse_with_aliases() {
    assert_eq!("rag".parse::<DashboardView>(), Ok(DashboardView::RagDebugger));
    assert_eq!(
        "context-pack".parse::<DashboardView>(),
        Ok(DashboardView::ContextPack)
    );
    assert_eq!("Audit".parse::<DashboardView>(), Ok(DashboardView::Audit));
    assert!("nope".parse::<DashboardView>().is_err());
}
