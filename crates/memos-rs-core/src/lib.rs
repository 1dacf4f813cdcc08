//! Dashboard state and view models for the MemOS memory backend.
//!
//! Everything here is UI-agnostic: controllers take a [`memos_rs_client::MemosApi`]
//! and produce plain data that a renderer can draw.

pub mod audit;
pub mod card;
pub mod context_pack;
mod error;
pub mod format;
pub mod history;
pub mod mock;
pub mod pipeline;
pub mod poll;
pub mod radar;
pub mod session;
pub mod stats;
mod store;
pub mod types;
pub mod workbench;

pub use audit::{AuditFilter, AuditPanel, AuditRow, AuditScope};
pub use card::{CardBucket, MemoryCard, is_memory_card, parse_memory_card};
pub use context_pack::ContextPackView;
pub use error::StoreError;
pub use history::{CondensationHistory, CondensationRow, ContextPackEntry, ContextPackHistory};
pub use mock::MockMemosApi;
pub use pipeline::{PipelineFilter, PipelineStage, PipelineView};
pub use poll::{CondensationPoller, PollOutcome, PollTicket};
pub use radar::{RadarBlip, RadarState, Zone};
pub use session::SessionState;
pub use stats::{StatsBoard, SystemStats};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::{ChatMessage, MemoryNode, MessageRole, RetrievalContext};
pub use workbench::{CondensationStatus, PendingSend, Workbench};
