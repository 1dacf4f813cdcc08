//! Schema validation for `memos.json5` layers.
//!
//! Runs on every layer before merging so a typo is reported against the file
//! that contains it rather than the merged result.

use super::view_names;
use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &["$schema", "api", "polling", "session", "query", "ui"],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("api") {
        validate_api(value, layer, "api")?;
    }
    if let Some(value) = map.get("polling") {
        validate_polling(value, layer, "polling")?;
    }
    if let Some(value) = map.get("session") {
        validate_session(value, layer, "session")?;
    }
    if let Some(value) = map.get("query") {
        validate_query(value, layer, "query")?;
    }
    if let Some(value) = map.get("ui") {
        validate_ui(value, layer, "ui")?;
    }
    Ok(())
}

fn validate_api(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["base_url", "timeout_ms"], layer, path)?;
    if let Some(value) = map.get("base_url") {
        expect_string(value, layer, &join_path(path, "base_url"))?;
    }
    if let Some(value) = map.get("timeout_ms")
        && !value.is_null()
    {
        expect_u64(value, layer, &join_path(path, "timeout_ms"))?;
    }
    Ok(())
}

fn validate_polling(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "stats_interval_ms",
            "pipeline_interval_ms",
            "condensation_backoff_ms",
        ],
        layer,
        path,
    )?;
    for key in ["stats_interval_ms", "pipeline_interval_ms"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("condensation_backoff_ms") {
        let key_path = join_path(path, "condensation_backoff_ms");
        let arr = expect_array(value, layer, &key_path)?;
        for (idx, entry) in arr.iter().enumerate() {
            expect_u64(entry, layer, &format!("{key_path}[{idx}]"))?;
        }
    }
    Ok(())
}

fn validate_session(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["state_path", "default_namespace"], layer, path)?;
    if let Some(value) = map.get("state_path")
        && !value.is_null()
    {
        expect_string(value, layer, &join_path(path, "state_path"))?;
    }
    if let Some(value) = map.get("default_namespace") {
        expect_string(value, layer, &join_path(path, "default_namespace"))?;
    }
    Ok(())
}

fn validate_query(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["top_k", "radar_top_k"], layer, path)?;
    for key in ["top_k", "radar_top_k"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

fn validate_ui(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["default_view", "mock"], layer, path)?;
    if let Some(value) = map.get("default_view") {
        let key_path = join_path(path, "default_view");
        let name = value
            .as_str()
            .ok_or_else(|| invalid_field(layer, &key_path, "expected string"))?;
        let allowed = view_names();
        if !allowed.contains(&name) {
            return Err(invalid_field(
                layer,
                &key_path,
                &format!("expected one of {}", allowed.join(", ")),
            ));
        }
    }
    if let Some(value) = map.get("mock")
        && !matches!(value, Value::Bool(_))
    {
        return Err(invalid_field(layer, &join_path(path, "mock"), "expected bool"));
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON array or return a typed error.
fn expect_array<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Vec<Value>, ConfigError> {
    match value {
        Value::Array(arr) => Ok(arr),
        _ => Err(invalid_field(layer, path, "expected array")),
    }
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a non-negative JSON integer.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
