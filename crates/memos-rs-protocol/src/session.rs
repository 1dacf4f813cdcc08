//! Session administration endpoints.

use crate::ops::push_text;
use serde::{Deserialize, Serialize};

/// Query-string parameters of `POST /v1/dev/seed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DevSeedParams {
    pub namespace: Option<String>,
    pub session_id: Option<String>,
    /// Wipe the session before seeding.
    pub reset: Option<bool>,
}

impl DevSeedParams {
    /// Query-string pairs; unset and empty values are left out.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_text(&mut pairs, "namespace", self.namespace.as_deref());
        push_text(&mut pairs, "session_id", self.session_id.as_deref());
        if let Some(reset) = self.reset {
            pairs.push(("reset", reset.to_string()));
        }
        pairs
    }
}

/// Response of `POST /v1/dev/seed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevSeedResponse {
    pub ok: bool,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub session_id: String,
    pub inserted: u64,
    #[serde(default)]
    pub memory_ids: Vec<String>,
}

/// Body of `POST /v1/sessions/reset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetSessionRequest {
    pub namespace: String,
    pub session_id: String,
    /// Must be `true` for the backend to act.
    pub confirm: bool,
    /// Report what would be deleted without deleting. Always sent.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_audit: Option<bool>,
}

/// Per-store deletion counts reported by a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeletedCounts {
    pub redis_keys: u64,
    pub memories: u64,
    pub condensations: u64,
    pub audit: u64,
}

impl DeletedCounts {
    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.redis_keys + self.memories + self.condensations + self.audit
    }
}

/// Response of `POST /v1/sessions/reset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetSessionResponse {
    pub ok: bool,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub reset_at: String,
    #[serde(default)]
    pub deleted_counts: DeletedCounts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn reset_request_always_sends_dry_run() {
        let req = ResetSessionRequest {
            namespace: "Project_X".to_string(),
            session_id: "s-1".to_string(),
            confirm: true,
            dry_run: false,
            clear_audit: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "namespace": "Project_X",
                "session_id": "s-1",
                "confirm": true,
                "dry_run": false
            })
        );
    }

    #[test]
    fn seed_params_render_reset_flag() {
        let params = DevSeedParams {
            namespace: Some("Project_X".to_string()),
            session_id: None,
            reset: Some(true),
        };
        assert_eq!(
            params.query_pairs(),
            vec![("namespace", "Project_X".to_string()), ("reset", "true".to_string())]
        );
    }
}
