//! RAG debugger controller.
//!
//! The workbench owns the transcript, the current retrieval context and the
//! namespace/session identity. Backend calls are split into a synchronous
//! `begin_*`, an async step that only needs the API, and a synchronous
//! `finish_*`, so an event loop can run the middle step on a spawned task and
//! hand the result back.

use crate::StoreError;
use crate::card::parse_memory_card;
use crate::poll::PollTicket;
use crate::session::SessionState;
use crate::types::{ChatMessage, MessageRole, RetrievalContext};
use log::{info, warn};
use memos_rs_client::{ApiResult, MemosApi};
use memos_rs_protocol::{
    ChatRole, DevSeedParams, DevSeedResponse, IngestRequest, OpsCondensation, QueryRequest,
    QueryResponse, ResetSessionRequest, ResetSessionResponse,
};
use std::sync::Arc;

/// Progress of the follow-up condensation for the current context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CondensationStatus {
    #[default]
    Idle,
    /// Poll running.
    Condensing,
    /// Poll gave up without a structured record.
    Pending,
}

/// A send that has been accepted and is waiting on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub namespace: String,
    pub session_id: String,
    pub text: String,
    pub top_k: u32,
    /// Local-state generation the send was accepted in.
    pub generation: u64,
}

impl PendingSend {
    pub fn ingest_request(&self) -> IngestRequest {
        IngestRequest::new(&self.namespace, &self.session_id, ChatRole::User, &self.text)
    }

    pub fn query_request(&self) -> QueryRequest {
        QueryRequest {
            namespace: self.namespace.clone(),
            session_id: self.session_id.clone(),
            query: self.text.clone(),
            top_k: Some(self.top_k),
        }
    }

    /// Store the user turn, then retrieve context for it.
    pub async fn execute(&self, api: &dyn MemosApi) -> ApiResult<QueryResponse> {
        api.ingest(&self.ingest_request()).await?;
        api.query(&self.query_request()).await
    }
}

pub struct Workbench {
    api: Arc<dyn MemosApi>,
    session: SessionState,
    transcript: Vec<ChatMessage>,
    context: Option<RetrievalContext>,
    processing: bool,
    api_error: Option<String>,
    status: Option<String>,
    condensation: CondensationStatus,
    top_k: u32,
    /// Bumped whenever local state is cleared.
    generation: u64,
}

impl Workbench {
    pub fn new(api: Arc<dyn MemosApi>, session: SessionState, top_k: u32) -> Self {
        Self {
            api,
            session,
            transcript: Vec::new(),
            context: None,
            processing: false,
            api_error: None,
            status: None,
            condensation: CondensationStatus::Idle,
            top_k,
            generation: 0,
        }
    }

    pub fn api(&self) -> Arc<dyn MemosApi> {
        self.api.clone()
    }

    pub fn namespace(&self) -> &str {
        self.session.namespace()
    }

    pub fn session_id(&self) -> &str {
        self.session.session_id()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn context(&self) -> Option<&RetrievalContext> {
        self.context.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn api_error(&self) -> Option<&str> {
        self.api_error.as_deref()
    }

    /// Last informational message (seed/reset outcome).
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn condensation_status(&self) -> CondensationStatus {
        self.condensation
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.api_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.api_error = None;
    }

    /// Accept a message for sending. Returns `None` for blank input or
    /// while another send is in flight.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingSend> {
        let text = text.trim();
        if text.is_empty() || self.processing {
            return None;
        }
        self.transcript.push(ChatMessage::new(MessageRole::User, text));
        self.processing = true;
        self.api_error = None;
        info!(
            "sending message (namespace={}, session_id={}, chars={})",
            self.namespace(),
            self.session_id(),
            text.chars().count()
        );
        Some(PendingSend {
            namespace: self.namespace().to_string(),
            session_id: self.session_id().to_string(),
            text: text.to_string(),
            top_k: self.top_k,
            generation: self.generation,
        })
    }

    /// Apply the outcome of a send.
    ///
    /// Results for a session that is no longer active, or that was cleared
    /// while the send was in flight, are dropped. On failure
    /// the previous context is kept and the error recorded. Returns a poll
    /// ticket when the summary is free text and a condensation is worth
    /// waiting for.
    pub fn finish_send(
        &mut self,
        pending: &PendingSend,
        result: ApiResult<QueryResponse>,
    ) -> Option<PollTicket> {
        self.processing = false;
        if pending.namespace != self.namespace() || pending.session_id != self.session_id() {
            info!(
                "dropping result for inactive session (session_id={})",
                pending.session_id
            );
            return None;
        }
        if pending.generation != self.generation {
            info!(
                "dropping result for cleared session (session_id={})",
                pending.session_id
            );
            return None;
        }
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "send failed (session_id={}, error={})",
                    pending.session_id, err
                );
                self.api_error = Some(err.to_string());
                return None;
            }
        };

        let context = RetrievalContext::from_query(response);
        self.transcript
            .push(ChatMessage::new(MessageRole::Agent, agent_reply(&context)));
        let needs_poll = parse_memory_card(&context.condensed_text).is_none();
        let ticket = needs_poll.then(|| PollTicket {
            response_id: context.id.clone(),
            namespace: pending.namespace.clone(),
            session_id: pending.session_id.clone(),
        });
        self.condensation = if needs_poll {
            CondensationStatus::Condensing
        } else {
            CondensationStatus::Idle
        };
        info!(
            "context updated (response_id={}, chunks={}, poll={})",
            context.id,
            context.raw_chunks.len(),
            needs_poll
        );
        self.context = Some(context);
        ticket
    }

    /// Send a message and wait for the result.
    pub async fn send_message(&mut self, text: &str) -> Option<PollTicket> {
        let pending = self.begin_send(text)?;
        let api = self.api.clone();
        let result = pending.execute(api.as_ref()).await;
        self.finish_send(&pending, result)
    }

    /// Apply a finished condensation when the context still belongs to the
    /// retrieval the poll was started for.
    pub fn apply_condensation(&mut self, ticket: &PollTicket, row: &OpsCondensation) -> bool {
        if ticket.session_id != self.session_id() {
            return false;
        }
        let Some(context) = self.context.as_mut() else {
            return false;
        };
        if context.id != ticket.response_id {
            return false;
        }
        context.apply_condensation(row);
        self.condensation = CondensationStatus::Idle;
        true
    }

    /// Record that the poll for `ticket` gave up.
    pub fn mark_condensation_pending(&mut self, ticket: &PollTicket) {
        if self
            .context
            .as_ref()
            .is_some_and(|context| context.id == ticket.response_id)
        {
            self.condensation = CondensationStatus::Pending;
        }
    }

    /// Switch namespace; rotates the session and clears local state.
    /// Blank input is ignored and returns `Ok(false)`.
    pub fn set_namespace(&mut self, namespace: &str) -> Result<bool, StoreError> {
        if !self.session.set_namespace(namespace)? {
            return Ok(false);
        }
        self.clear_local();
        Ok(true)
    }

    /// Rotate the session id and clear local state.
    pub fn new_session(&mut self) -> Result<(), StoreError> {
        self.session.new_session()?;
        self.clear_local();
        Ok(())
    }

    pub fn reset_request(&self, dry_run: bool, clear_audit: bool) -> ResetSessionRequest {
        ResetSessionRequest {
            namespace: self.namespace().to_string(),
            session_id: self.session_id().to_string(),
            confirm: true,
            dry_run,
            clear_audit: clear_audit.then_some(true),
        }
    }

    /// Apply a reset outcome. Local state is cleared only after a successful
    /// non-dry-run reset of the active session.
    pub fn apply_reset(
        &mut self,
        request: &ResetSessionRequest,
        result: ApiResult<ResetSessionResponse>,
    ) -> Option<ResetSessionResponse> {
        match result {
            Ok(response) => {
                let counts = response.deleted_counts;
                let prefix = if request.dry_run { "Dry run: would delete" } else { "Deleted" };
                self.status = Some(format!(
                    "{prefix} {} items (redis_keys={}, memories={}, condensations={}, audit={})",
                    counts.total(),
                    counts.redis_keys,
                    counts.memories,
                    counts.condensations,
                    counts.audit
                ));
                self.api_error = None;
                if !request.dry_run && request.session_id == self.session_id() {
                    self.clear_local();
                }
                info!(
                    "session reset (session_id={}, dry_run={}, deleted={})",
                    request.session_id,
                    request.dry_run,
                    counts.total()
                );
                Some(response)
            }
            Err(err) => {
                warn!(
                    "session reset failed (session_id={}, error={})",
                    request.session_id, err
                );
                self.api_error = Some(err.to_string());
                None
            }
        }
    }

    pub async fn reset_session(
        &mut self,
        dry_run: bool,
        clear_audit: bool,
    ) -> Option<ResetSessionResponse> {
        let request = self.reset_request(dry_run, clear_audit);
        let result = self.api.reset_session(&request).await;
        self.apply_reset(&request, result)
    }

    pub fn seed_params(&self, reset: bool) -> DevSeedParams {
        DevSeedParams {
            namespace: Some(self.namespace().to_string()),
            session_id: Some(self.session_id().to_string()),
            reset: Some(reset),
        }
    }

    pub fn apply_seed(&mut self, result: ApiResult<DevSeedResponse>) -> Option<DevSeedResponse> {
        match result {
            Ok(response) => {
                self.status = Some(format!(
                    "Seeded {} memories into {}/{}",
                    response.inserted, response.namespace, response.session_id
                ));
                self.api_error = None;
                Some(response)
            }
            Err(err) => {
                self.api_error = Some(err.to_string());
                None
            }
        }
    }

    /// Seed demo data for the active namespace and session.
    pub async fn seed_demo(&mut self, reset: bool) -> Option<DevSeedResponse> {
        let params = self.seed_params(reset);
        let result = self.api.dev_seed(&params).await;
        self.apply_seed(result)
    }

    fn clear_local(&mut self) {
        self.generation += 1;
        self.transcript.clear();
        self.context = None;
        self.api_error = None;
        self.condensation = CondensationStatus::Idle;
    }
}

fn agent_reply(context: &RetrievalContext) -> String {
    let summary = match parse_memory_card(&context.condensed_text) {
        Some(card) => format!(
            "Memory card: {} facts, {} decisions.",
            card.facts.len(),
            card.decisions.len()
        ),
        None => context.condensed_text.clone(),
    };
    format!(
        "I've updated the context based on your input. Specifically, I accessed the {} and found related entities. {}",
        context.source_tier, summary
    )
}
