use memos_rs_protocol::{OpsCondensation, OpsCondensationsResponse, QueryResponse};
use serde_json::{Map, json};

/// Memory card document with one entry per bucket.
pub fn card_json() -> String {
    json!({
        "schema": "memos.memory_card.v2",
        "facts": ["Project Phoenix deadline moved to Jan 2024"],
        "preferences": [],
        "constraints": ["frontend module must ship first"],
        "decisions": ["manager approved the delay"],
        "risks": ["frontend slips again"],
        "actions": ["update the roadmap"],
        "raw_excerpt": "User requested to move the deadline to Jan 2024."
    })
    .to_string()
}

/// Query response with two chunks and the given summary.
pub fn query_response(id: &str, condensed_summary: &str) -> QueryResponse {
    serde_json::from_value(json!({
        "id": id,
        "source_tier": "L2 Semantic (Vector DB)",
        "similarity": 0.91,
        "raw_chunks": [
            {
                "id": "chunk-a",
                "tier": "L2 Semantic (Vector DB)",
                "text": "User asked about the Project Phoenix deadline.",
                "score": 0.91,
                "metadata": {"rerank_score": 0.88}
            },
            {
                "id": "chunk-b",
                "tier": "L1 Scratchpad (Redis)",
                "text": "System replied deadline is Q4.",
                "score": 0.72,
                "metadata": {"rerank_score": 0.31}
            }
        ],
        "condensed_summary": condensed_summary,
        "token_usage_original": 145,
        "token_usage_condensed": 28
    }))
    .expect("query response fixture")
}

/// Condensation row for a session.
pub fn condensation(id: &str, namespace: &str, session_id: &str, text: &str) -> OpsCondensation {
    OpsCondensation {
        id: id.to_string(),
        namespace: namespace.to_string(),
        session_id: session_id.to_string(),
        version: "v2".to_string(),
        trigger_reason: Some("query".to_string()),
        trigger_details: Map::new(),
        source_memory_ids: vec!["m-1".to_string(), "m-2".to_string()],
        condensed_text: text.to_string(),
        token_original: 300,
        token_condensed: 60,
        created_at: "2024-01-01T10:00:00Z".to_string(),
    }
}

/// History response holding `rows`.
pub fn condensations(rows: Vec<OpsCondensation>) -> OpsCondensationsResponse {
    OpsCondensationsResponse {
        condensations: rows,
    }
}
