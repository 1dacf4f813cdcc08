//! Wire protocol types for the MemOS backend REST API.

mod memory;
mod ops;
mod session;

pub use memory::{
    IngestRequest, IngestResponse, QueryRequest, QueryResponse, RerankDebug, RetrievedChunk,
};
pub use ops::{
    ContextPackParams, HealthResponse, HistoryParams, OpsAuditEvent, OpsAuditResponse,
    OpsCondensation, OpsCondensationsResponse, OpsContextPack, OpsContextPacksResponse,
    OpsPipelineResponse, OpsProceduralResponse, OpsQueueDepth, OpsRecentCondensation,
    OpsStatsResponse,
};
pub use session::{
    DeletedCounts, DevSeedParams, DevSeedResponse, ResetSessionRequest, ResetSessionResponse,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend storage tier a chunk or context came from.
///
/// Wire values are the human-readable labels the backend emits. Labels the
/// dashboard does not recognise are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemoryTier {
    /// Short-lived conversation scratchpad.
    L1Scratchpad,
    /// Vector store of embedded chunks.
    L2Semantic,
    /// Entity graph.
    L3Entity,
    /// Unrecognised label.
    Other(String),
}

impl MemoryTier {
    /// Wire label for the tier.
    pub fn label(&self) -> &str {
        match self {
            Self::L1Scratchpad => "L1 Scratchpad (Redis)",
            Self::L2Semantic => "L2 Semantic (Vector DB)",
            Self::L3Entity => "L3 Entity Graph (Neo4j)",
            Self::Other(label) => label,
        }
    }

    /// Compact `L1`/`L2`/`L3` tag used in narrow table columns.
    pub fn short(&self) -> &str {
        match self {
            Self::L1Scratchpad => "L1",
            Self::L2Semantic => "L2",
            Self::L3Entity => "L3",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for MemoryTier {
    fn from(value: String) -> Self {
        match value.as_str() {
            "L1 Scratchpad (Redis)" => Self::L1Scratchpad,
            "L2 Semantic (Vector DB)" => Self::L2Semantic,
            "L3 Entity Graph (Neo4j)" => Self::L3Entity,
            _ => Self::Other(value),
        }
    }
}

impl From<MemoryTier> for String {
    fn from(value: MemoryTier) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for MemoryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Speaker of an ingested chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
    System,
    Tool,
}

impl ChatRole {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
            Self::System => "system",
            Self::Tool => "tool",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
