//! TUI event types for input, pollers and backend results.

use crossterm::event::KeyEvent;
use memos_rs_client::ApiResult;
use memos_rs_core::{PendingSend, PollOutcome, PollTicket};
use memos_rs_protocol::{
    DevSeedResponse, OpsAuditResponse, OpsCondensationsResponse, OpsContextPacksResponse,
    OpsPipelineResponse, OpsProceduralResponse, OpsStatsResponse, QueryResponse,
    ResetSessionRequest, ResetSessionResponse,
};

/// Application event emitted by input handlers or background tasks.
///
/// Results that belong to a session carry the session id they were issued
/// for, so the loop can drop answers that arrive after a rotation.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event.
    Input(KeyEvent),
    /// Periodic tick event.
    Tick,
    /// Scroll event in the active view.
    Scroll(i16),
    /// Stats poll result.
    Stats(ApiResult<OpsStatsResponse>),
    /// Pipeline poll result.
    Pipeline(ApiResult<OpsPipelineResponse>),
    /// Ingest + query finished for a debugger send.
    SendFinished {
        pending: PendingSend,
        result: ApiResult<QueryResponse>,
    },
    /// Condensation poll finished.
    Condensation {
        ticket: PollTicket,
        outcome: PollOutcome,
    },
    /// Radar query finished.
    Radar {
        session_id: String,
        result: ApiResult<QueryResponse>,
    },
    Audit {
        session_id: String,
        result: ApiResult<OpsAuditResponse>,
    },
    Condensations {
        session_id: String,
        result: ApiResult<OpsCondensationsResponse>,
    },
    ContextPacks {
        session_id: String,
        packs: ApiResult<OpsContextPacksResponse>,
        procedural: ApiResult<OpsProceduralResponse>,
    },
    Reset {
        request: ResetSessionRequest,
        result: ApiResult<ResetSessionResponse>,
    },
    Seed(ApiResult<DevSeedResponse>),
    /// Error from an action that has no panel of its own.
    ActionError(String),
}
