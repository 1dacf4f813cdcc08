//! View models shared by every dashboard surface.

use chrono::{DateTime, Utc};
use memos_rs_protocol::{MemoryTier, OpsCondensation, QueryResponse, RerankDebug, RetrievedChunk};
use serde_json::Value;
use std::fmt;

/// Speaker of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Agent,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::User => "user",
            Self::Agent => "agent",
            Self::System => "system",
        };
        f.write_str(label)
    }
}

/// One line of the local RAG debugger transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        let timestamp = Utc::now();
        Self {
            id: format!("msg-{}", uuid::Uuid::new_v4().simple()),
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// Retrieval result shown by the RAG debugger. Replaced wholesale per query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalContext {
    pub id: String,
    pub source_tier: MemoryTier,
    pub similarity: f64,
    pub original_text: String,
    pub condensed_text: String,
    pub token_usage_original: u64,
    pub token_usage_condensed: u64,
    pub context_pack_id: Option<String>,
    pub context_pack: Option<Value>,
    pub raw_chunks: Vec<RetrievedChunk>,
    pub rerank_debug: Vec<RerankDebug>,
}

impl RetrievalContext {
    /// Map a query response. The original text is the retrieved chunk texts
    /// in rank order, one paragraph each.
    pub fn from_query(response: QueryResponse) -> Self {
        let original_text = response
            .raw_chunks
            .iter()
            .map(|chunk| chunk.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            id: response.id,
            source_tier: response.source_tier,
            similarity: response.similarity,
            original_text,
            condensed_text: response.condensed_summary,
            token_usage_original: response.token_usage_original,
            token_usage_condensed: response.token_usage_condensed,
            context_pack_id: response.context_pack_id,
            context_pack: response.context_pack,
            raw_chunks: response.raw_chunks,
            rerank_debug: response.rerank_debug,
        }
    }

    /// Swap in a finished condensation.
    pub fn apply_condensation(&mut self, row: &OpsCondensation) {
        self.condensed_text = row.condensed_text.clone();
        self.token_usage_original = row.token_original;
        self.token_usage_condensed = row.token_condensed;
    }

    /// Rounded percentage of tokens saved by condensation.
    pub fn saved_percent(&self) -> i64 {
        saved_percent(self.token_usage_original, self.token_usage_condensed)
    }

    /// Similarity as a percentage with one decimal.
    pub fn similarity_label(&self) -> String {
        format!("{:.1}%", self.similarity * 100.0)
    }
}

/// `round((1 - condensed / original) * 100)`, or 0 when nothing was retrieved.
pub fn saved_percent(original: u64, condensed: u64) -> i64 {
    if original == 0 {
        return 0;
    }
    ((1.0 - condensed as f64 / original as f64) * 100.0).round() as i64
}

/// Point in the cortex visualizer.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryNode {
    pub id: String,
    pub content: String,
    pub tier: MemoryTier,
    /// In `[0, 1]`.
    pub importance_score: f64,
    pub embedding: [f64; 3],
    pub timestamp: DateTime<Utc>,
    pub namespace: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response() -> QueryResponse {
        serde_json::from_value(serde_json::json!({
            "id": "ret-42",
            "source_tier": "L2 Semantic (Vector DB)",
            "similarity": 0.8934,
            "raw_chunks": [
                {"id": "a", "tier": "L1 Scratchpad (Redis)", "text": " first ", "score": 0.9},
                {"id": "b", "tier": "L2 Semantic (Vector DB)", "text": "", "score": 0.5},
                {"id": "c", "tier": "L2 Semantic (Vector DB)", "text": "second", "score": 0.4}
            ],
            "condensed_summary": "short",
            "token_usage_original": 145,
            "token_usage_condensed": 28
        }))
        .expect("response")
    }

    #[test]
    fn from_query_joins_chunk_texts() {
        let ctx = RetrievalContext::from_query(response());
        assert_eq!(ctx.id, "ret-42");
        assert_eq!(ctx.original_text, "first\n\nsecond");
        assert_eq!(ctx.condensed_text, "short");
        assert_eq!(ctx.raw_chunks.len(), 3);
    }

    #[test]
    fn saved_percent_rounds() {
        let ctx = RetrievalContext::from_query(response());
        assert_eq!(ctx.saved_percent(), 81);
        assert_eq!(ctx.similarity_label(), "89.3%");
        assert_eq!(saved_percent(0, 0), 0);
        assert_eq!(saved_percent(10, 20), -100);
    }
}
