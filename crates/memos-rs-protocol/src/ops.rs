//! Operational/debug endpoints (`/v1/ops/*`, `/health`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Response of `GET /v1/ops/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct OpsStatsResponse {
    pub total_memories: u64,
    pub active_contexts: u64,
    pub token_savings: u64,
    pub compression_ratio: f64,
}

/// Depth of one worker queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpsQueueDepth {
    pub name: String,
    pub count: u64,
}

/// Condensation row as listed by the pipeline endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpsRecentCondensation {
    pub id: String,
    pub namespace: String,
    pub session_id: String,
    pub token_original: u64,
    pub token_condensed: u64,
    pub created_at: String,
}

/// Response of `GET /v1/ops/pipeline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OpsPipelineResponse {
    #[serde(default)]
    pub queues: Vec<OpsQueueDepth>,
    #[serde(default)]
    pub recent_condensations: Vec<OpsRecentCondensation>,
}

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpsAuditEvent {
    pub id: String,
    pub namespace: String,
    pub session_id: String,
    pub event_type: String,
    #[serde(default)]
    pub details: Map<String, Value>,
    pub created_at: String,
}

/// Response of `GET /v1/ops/audit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OpsAuditResponse {
    #[serde(default)]
    pub events: Vec<OpsAuditEvent>,
}

/// Full condensation record from the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpsCondensation {
    pub id: String,
    pub namespace: String,
    pub session_id: String,
    pub version: String,
    #[serde(default)]
    pub trigger_reason: Option<String>,
    #[serde(default)]
    pub trigger_details: Map<String, Value>,
    #[serde(default)]
    pub source_memory_ids: Vec<String>,
    pub condensed_text: String,
    pub token_original: u64,
    pub token_condensed: u64,
    pub created_at: String,
}

/// Response of `GET /v1/ops/condensations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OpsCondensationsResponse {
    #[serde(default)]
    pub condensations: Vec<OpsCondensation>,
}

/// Stored context pack assembled for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpsContextPack {
    pub id: String,
    pub namespace: String,
    pub session_id: String,
    pub query_text: String,
    #[serde(default)]
    pub session_summary_id: Option<String>,
    pub retrieved_count: u64,
    pub created_at: String,
    /// Pack body; only populated when requested with `include_pack=true`.
    #[serde(default)]
    pub pack: Map<String, Value>,
}

/// Response of `GET /v1/ops/context_packs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OpsContextPacksResponse {
    #[serde(default)]
    pub context_packs: Vec<OpsContextPack>,
}

/// Response of `GET /v1/ops/procedural`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OpsProceduralResponse {
    #[serde(default)]
    pub prompt_registry: Map<String, Value>,
    #[serde(default)]
    pub tool_registry: Map<String, Value>,
}

/// Filter for the audit and condensation history endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryParams {
    pub namespace: Option<String>,
    pub session_id: Option<String>,
    pub limit: Option<u32>,
}

impl HistoryParams {
    /// Query-string pairs; unset and empty values are left out.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_text(&mut pairs, "namespace", self.namespace.as_deref());
        push_text(&mut pairs, "session_id", self.session_id.as_deref());
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Filter for the context-pack history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextPackParams {
    pub namespace: Option<String>,
    pub session_id: Option<String>,
    pub limit: Option<u32>,
    pub include_pack: Option<bool>,
}

impl ContextPackParams {
    /// Query-string pairs; unset and empty values are left out.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = HistoryParams {
            namespace: self.namespace.clone(),
            session_id: self.session_id.clone(),
            limit: self.limit,
        }
        .query_pairs();
        if let Some(include_pack) = self.include_pack {
            pairs.push(("include_pack", include_pack.to_string()));
        }
        pairs
    }
}

pub(crate) fn push_text(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value
        && !value.is_empty()
    {
        pairs.push((key, value.to_string()));
    }
}
