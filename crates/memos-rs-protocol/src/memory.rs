//! Ingest and query payloads.

use crate::{ChatRole, MemoryTier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Body of `POST /v1/ingest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub namespace: String,
    pub session_id: String,
    pub role: ChatRole,
    pub text: String,
    /// Arbitrary metadata stored alongside the turn.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl IngestRequest {
    /// Build a request with empty metadata.
    pub fn new(
        namespace: impl Into<String>,
        session_id: impl Into<String>,
        role: ChatRole,
        text: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            session_id: session_id.into(),
            role,
            text: text.into(),
            metadata: Map::new(),
        }
    }
}

/// Response of `POST /v1/ingest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub memory_id: String,
    #[serde(default = "default_true")]
    pub accepted: bool,
}

fn default_true() -> bool {
    true
}

/// Body of `POST /v1/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub namespace: String,
    pub session_id: String,
    pub query: String,
    /// Number of chunks to retrieve; the backend applies its own default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// One candidate chunk returned by retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub tier: MemoryTier,
    pub text: String,
    /// Vector similarity score.
    pub score: f64,
    /// Backend metadata; may carry `rerank_score`.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Breakdown of one rerank pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankDebug {
    pub method: String,
    #[serde(default)]
    pub components: BTreeMap<String, f64>,
}

/// Response of `POST /v1/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub id: String,
    pub source_tier: MemoryTier,
    pub similarity: f64,
    #[serde(default)]
    pub raw_chunks: Vec<RetrievedChunk>,
    /// Either a memory-card JSON document or a plain-text fallback.
    pub condensed_summary: String,
    pub token_usage_original: u64,
    pub token_usage_condensed: u64,
    #[serde(default)]
    pub rerank_debug: Vec<RerankDebug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_summary_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_summary_cache_hit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_summary_enqueued: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_pack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_pack: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn ingest_request_omits_empty_metadata() {
        let req = IngestRequest::new("Project_X", "s-1", ChatRole::User, "hello");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "namespace": "Project_X",
                "session_id": "s-1",
                "role": "user",
                "text": "hello"
            })
        );
    }

    #[test]
    fn ingest_response_defaults_accepted() {
        let resp: IngestResponse = serde_json::from_value(json!({"memory_id": "m-1"})).unwrap();
        assert!(resp.accepted);
    }

    #[test]
    fn query_response_tolerates_missing_optional_fields() {
        let resp: QueryResponse = serde_json::from_value(json!({
            "id": "ret-1",
            "source_tier": "L2 Semantic (Vector DB)",
            "similarity": 0.91,
            "raw_chunks": [{
                "id": "c-1",
                "tier": "L1 Scratchpad (Redis)",
                "text": "deadline moved",
                "score": 0.7,
                "metadata": {"rerank_score": 0.93}
            }],
            "condensed_summary": "fallback",
            "token_usage_original": 120,
            "token_usage_condensed": 30
        }))
        .unwrap();
        assert_eq!(resp.source_tier, MemoryTier::L2Semantic);
        assert_eq!(resp.raw_chunks.len(), 1);
        assert_eq!(resp.raw_chunks[0].metadata["rerank_score"], json!(0.93));
        assert!(resp.rerank_debug.is_empty());
        assert_eq!(resp.context_pack_id, None);
    }
}
