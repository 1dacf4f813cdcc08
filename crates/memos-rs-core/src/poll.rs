//! Follow-up polling for a session condensation.
//!
//! A query that returns a free-text summary has usually enqueued a
//! condensation job. The poller re-reads the latest condensation for the
//! session on a fixed backoff until a memory card shows up or the schedule
//! runs out.

use crate::card::is_memory_card;
use log::{debug, info};
use memos_rs_client::MemosApi;
use memos_rs_protocol::{HistoryParams, OpsCondensation};
use std::time::Duration;

/// Delays before each attempt, in milliseconds.
pub const DEFAULT_BACKOFF_MS: [u64; 6] = [600, 900, 1200, 1600, 2200, 3000];
/// Attempt cap; longer schedules are cut to this length.
pub const MAX_POLL_ATTEMPTS: usize = 6;

/// Identity of the retrieval a poll was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    /// Query response id the condensation should be applied to.
    pub response_id: String,
    pub namespace: String,
    pub session_id: String,
}

/// Result of one polling run.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Found {
        row: OpsCondensation,
        attempts: usize,
    },
    Exhausted {
        attempts: usize,
    },
}

impl PollOutcome {
    pub fn attempts(&self) -> usize {
        match self {
            Self::Found { attempts, .. } | Self::Exhausted { attempts } => *attempts,
        }
    }
}

/// Fixed-schedule poller.
#[derive(Debug, Clone)]
pub struct CondensationPoller {
    delays: Vec<Duration>,
}

impl Default for CondensationPoller {
    fn default() -> Self {
        Self::from_millis(&DEFAULT_BACKOFF_MS)
    }
}

impl CondensationPoller {
    pub fn new(mut delays: Vec<Duration>) -> Self {
        delays.truncate(MAX_POLL_ATTEMPTS);
        Self { delays }
    }

    pub fn from_millis(delays: &[u64]) -> Self {
        Self::new(delays.iter().copied().map(Duration::from_millis).collect())
    }

    pub fn max_attempts(&self) -> usize {
        self.delays.len()
    }

    /// Poll until a structured condensation for the ticket's session appears.
    ///
    /// Fetch errors count as attempts.
    pub async fn run(&self, api: &dyn MemosApi, ticket: &PollTicket) -> PollOutcome {
        let params = HistoryParams {
            namespace: Some(ticket.namespace.clone()),
            session_id: Some(ticket.session_id.clone()),
            limit: Some(1),
        };
        let mut attempts = 0;
        for delay in &self.delays {
            tokio::time::sleep(*delay).await;
            attempts += 1;
            match api.ops_condensations(&params).await {
                Ok(response) => {
                    let found = response.condensations.into_iter().find(|row| {
                        row.session_id == ticket.session_id && is_memory_card(&row.condensed_text)
                    });
                    if let Some(row) = found {
                        info!(
                            "condensation ready (response_id={}, condensation_id={}, attempts={})",
                            ticket.response_id, row.id, attempts
                        );
                        return PollOutcome::Found { row, attempts };
                    }
                    debug!(
                        "condensation not ready (response_id={}, attempt={})",
                        ticket.response_id, attempts
                    );
                }
                Err(err) => {
                    debug!(
                        "condensation poll failed (response_id={}, attempt={}, error={})",
                        ticket.response_id, attempts, err
                    );
                }
            }
        }
        debug!(
            "condensation poll gave up (response_id={}, attempts={})",
            ticket.response_id, attempts
        );
        PollOutcome::Exhausted { attempts }
    }
}
