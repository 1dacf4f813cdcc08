//! Memory pipeline view: condensation queue and structured vault.

use crate::format::parse_timestamp;
use chrono::{DateTime, Duration, Utc};
use memos_rs_client::ApiResult;
use memos_rs_protocol::{MemoryTier, OpsPipelineResponse, OpsRecentCondensation};

/// Queue whose depth drives the pipeline.
pub const CONDENSATION_QUEUE: &str = "condensation";
pub const MAX_PENDING_JOBS: usize = 5;
pub const MAX_VAULT_ITEMS: usize = 10;

/// What the worker is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Summarizing,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Summarizing => "summarizing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
}

/// Queue entry shown in the ingestion column.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineJob {
    pub id: String,
    pub text: String,
    pub status: JobStatus,
    pub timestamp: DateTime<Utc>,
}

/// Condensed session in the vault.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultItem {
    pub id: String,
    pub session_id: String,
    pub summary: String,
    pub entities: Vec<String>,
    pub tier: MemoryTier,
    pub saved_tokens: u64,
    pub timestamp: DateTime<Utc>,
}

impl VaultItem {
    fn from_row(row: &OpsRecentCondensation, now: DateTime<Utc>) -> Self {
        Self {
            id: row.id.clone(),
            session_id: row.session_id.clone(),
            summary: format!("Condensed session {} ({})", row.session_id, row.namespace),
            entities: vec![row.namespace.clone()],
            tier: MemoryTier::L2Semantic,
            saved_tokens: row.token_original.saturating_sub(row.token_condensed),
            timestamp: parse_timestamp(&row.created_at).unwrap_or(now),
        }
    }
}

/// Vault filter; blank fields match anything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineFilter {
    pub namespace: String,
    pub session_id: String,
}

impl PipelineFilter {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            session_id: String::new(),
        }
    }

    pub fn matches(&self, row: &OpsRecentCondensation) -> bool {
        (self.namespace.is_empty() || row.namespace == self.namespace)
            && (self.session_id.is_empty() || row.session_id == self.session_id)
    }

    /// Show condensations across all contexts.
    pub fn clear(&mut self) {
        self.namespace.clear();
        self.session_id.clear();
    }
}

/// Pipeline view state, refreshed by polling.
#[derive(Debug, Clone, Default)]
pub struct PipelineView {
    pub filter: PipelineFilter,
    pub queue_count: u64,
    pub vault: Vec<VaultItem>,
    pub last_updated: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl PipelineView {
    pub fn new(filter: PipelineFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Apply a poll result. Failures keep the last data.
    pub fn apply(&mut self, result: ApiResult<OpsPipelineResponse>) {
        self.apply_at(result, Utc::now());
    }

    pub fn apply_at(&mut self, result: ApiResult<OpsPipelineResponse>, now: DateTime<Utc>) {
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.error = Some(err.to_string());
                return;
            }
        };
        self.queue_count = response
            .queues
            .iter()
            .find(|queue| queue.name == CONDENSATION_QUEUE)
            .map(|queue| queue.count)
            .unwrap_or(0);
        self.vault = response
            .recent_condensations
            .iter()
            .filter(|row| self.filter.matches(row))
            .take(MAX_VAULT_ITEMS)
            .map(|row| VaultItem::from_row(row, now))
            .collect();
        self.last_updated = Some(now);
        self.error = None;
    }

    pub fn stage(&self) -> PipelineStage {
        if self.queue_count > 0 {
            PipelineStage::Summarizing
        } else {
            PipelineStage::Idle
        }
    }

    /// Job the worker is on, if the queue is non-empty.
    pub fn processing_job(&self, now: DateTime<Utc>) -> Option<PipelineJob> {
        (self.queue_count > 0).then(|| PipelineJob {
            id: format!("job-{}", self.queue_count),
            text: "Condensation queue is processing recent sessions…".to_string(),
            status: JobStatus::Processing,
            timestamp: now,
        })
    }

    /// Up to [`MAX_PENDING_JOBS`] placeholders for queued work.
    pub fn pending_jobs(&self, now: DateTime<Utc>) -> Vec<PipelineJob> {
        let pending = usize::try_from(self.queue_count)
            .unwrap_or(usize::MAX)
            .min(MAX_PENDING_JOBS);
        (0..pending)
            .map(|idx| PipelineJob {
                id: format!("pending-{}", idx + 1),
                text: "Pending condensation job (from /v1/query enqueue)".to_string(),
                status: JobStatus::Pending,
                timestamp: now - Duration::seconds(idx as i64),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memos_rs_client::ApiError;
    use memos_rs_protocol::OpsQueueDepth;
    use pretty_assertions::assert_eq;

    fn row(id: &str, namespace: &str, session_id: &str, created_at: &str) -> OpsRecentCondensation {
        OpsRecentCondensation {
            id: id.to_string(),
            namespace: namespace.to_string(),
            session_id: session_id.to_string(),
            token_original: 100,
            token_condensed: 30,
            created_at: created_at.to_string(),
        }
    }

    fn response(count: u64, rows: Vec<OpsRecentCondensation>) -> OpsPipelineResponse {
        OpsPipelineResponse {
            queues: vec![
                OpsQueueDepth {
                    name: "ingest".to_string(),
                    count: 99,
                },
                OpsQueueDepth {
                    name: CONDENSATION_QUEUE.to_string(),
                    count,
                },
            ],
            recent_condensations: rows,
        }
    }

    #[test]
    fn filters_vault_and_counts_condensation_queue() {
        let now = Utc::now();
        let mut view = PipelineView::new(PipelineFilter::new("Project_X"));
        let rows = (0..15)
            .map(|i| row(&format!("c-{i}"), "Project_X", "s-1", "2024-01-01T00:00:00Z"))
            .chain([row("other", "Team_B", "s-2", "bad")])
            .collect();
        view.apply_at(Ok(response(7, rows)), now);

        assert_eq!(view.queue_count, 7);
        assert_eq!(view.stage(), PipelineStage::Summarizing);
        assert_eq!(view.vault.len(), MAX_VAULT_ITEMS);
        assert_eq!(view.vault[0].summary, "Condensed session s-1 (Project_X)");
        assert_eq!(view.vault[0].saved_tokens, 70);
        assert_eq!(view.pending_jobs(now).len(), MAX_PENDING_JOBS);
        assert_eq!(
            view.processing_job(now).map(|job| job.id),
            Some("job-7".to_string())
        );
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_now() {
        let now = Utc::now();
        let mut view = PipelineView::default();
        view.apply_at(Ok(response(0, vec![row("c", "ns", "s", "garbage")])), now);
        assert_eq!(view.vault[0].timestamp, now);
        assert_eq!(view.stage(), PipelineStage::Idle);
        assert!(view.processing_job(now).is_none());
        assert!(view.pending_jobs(now).is_empty());
    }

    #[test]
    fn errors_keep_previous_data() {
        let now = Utc::now();
        let mut view = PipelineView::default();
        view.apply_at(Ok(response(2, vec![row("c", "ns", "s", "x")])), now);
        view.apply_at(
            Err(ApiError::Decode {
                path: "/v1/ops/pipeline".to_string(),
                message: "bad".to_string(),
            }),
            now,
        );
        assert_eq!(view.queue_count, 2);
        assert_eq!(view.vault.len(), 1);
        assert!(view.error.is_some());
    }

    #[test]
    fn session_filter_narrows_and_clear_widens() {
        let mut filter = PipelineFilter::new("ns");
        filter.session_id = "s-1".to_string();
        assert!(filter.matches(&row("a", "ns", "s-1", "")));
        assert!(!filter.matches(&row("b", "ns", "s-2", "")));
        filter.clear();
        assert!(filter.matches(&row("c", "other", "s-9", "")));
    }
}
