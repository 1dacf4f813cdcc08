//! Condensation and context-pack history panels.
//!
//! Both are debug/replay views over persisted backend records for the active
//! session. Neither is on the main user flow.

use crate::audit::parse_limit;
use crate::card::{MemoryCard, parse_memory_card};
use crate::context_pack::{ContextPackView, tail};
use crate::format::{SHORT_JSON_MAX, format_timestamp, short_json};
use crate::types::saved_percent;
use memos_rs_client::ApiResult;
use memos_rs_protocol::{
    ContextPackParams, HistoryParams, OpsCondensation, OpsCondensationsResponse,
    OpsContextPacksResponse, OpsProceduralResponse,
};
use serde_json::Value;

pub const DEFAULT_CONDENSATION_LIMIT: u32 = 10;
pub const MAX_CONDENSATION_LIMIT: u32 = 50;
pub const DEFAULT_CONTEXT_PACK_LIMIT: u32 = 5;
pub const MAX_CONTEXT_PACK_LIMIT: u32 = 50;

/// One rendered condensation.
#[derive(Debug, Clone, PartialEq)]
pub struct CondensationRow {
    pub short_id: String,
    pub version: String,
    pub timestamp: String,
    pub source_count: usize,
    /// `-` when the backend recorded no reason.
    pub trigger_reason: String,
    pub trigger_details: String,
    pub saved_tokens: u64,
    pub saved_percent: i64,
    pub condensed_text: String,
    pub card: Option<MemoryCard>,
}

impl CondensationRow {
    pub fn from_record(row: &OpsCondensation) -> Self {
        Self {
            short_id: tail(&row.id, 8),
            version: row.version.clone(),
            timestamp: format_timestamp(&row.created_at),
            source_count: row.source_memory_ids.len(),
            trigger_reason: row
                .trigger_reason
                .as_deref()
                .filter(|reason| !reason.is_empty())
                .unwrap_or("-")
                .to_string(),
            trigger_details: short_json(
                &Value::Object(row.trigger_details.clone()),
                SHORT_JSON_MAX,
            ),
            saved_tokens: row.token_original.saturating_sub(row.token_condensed),
            saved_percent: saved_percent(row.token_original, row.token_condensed),
            condensed_text: row.condensed_text.clone(),
            card: parse_memory_card(&row.condensed_text),
        }
    }

    /// `version | timestamp`
    pub fn title(&self) -> String {
        format!("{} | {}", self.version, self.timestamp)
    }

    /// `id=… | src_ids=… | reason=…`
    pub fn subtitle(&self) -> String {
        format!(
            "id={} | src_ids={} | reason={}",
            self.short_id, self.source_count, self.trigger_reason
        )
    }
}

#[derive(Debug, Clone)]
pub struct CondensationHistory {
    limit: u32,
    pub rows: Vec<CondensationRow>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for CondensationHistory {
    fn default() -> Self {
        Self {
            limit: DEFAULT_CONDENSATION_LIMIT,
            rows: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl CondensationHistory {
    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit.clamp(1, MAX_CONDENSATION_LIMIT);
    }

    pub fn set_limit_input(&mut self, input: &str) {
        self.limit = parse_limit(input, DEFAULT_CONDENSATION_LIMIT, MAX_CONDENSATION_LIMIT);
    }

    pub fn params(&self, namespace: &str, session_id: &str) -> HistoryParams {
        HistoryParams {
            namespace: Some(namespace.to_string()),
            session_id: Some(session_id.to_string()),
            limit: Some(self.limit),
        }
    }

    pub fn begin_load(&mut self, namespace: &str, session_id: &str) -> HistoryParams {
        self.loading = true;
        self.error = None;
        self.params(namespace, session_id)
    }

    pub fn finish_load(&mut self, result: ApiResult<OpsCondensationsResponse>) {
        self.loading = false;
        match result {
            Ok(response) => {
                self.rows = response
                    .condensations
                    .iter()
                    .map(CondensationRow::from_record)
                    .collect();
            }
            Err(err) => self.error = Some(err.to_string()),
        }
    }
}

/// One stored context pack.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextPackEntry {
    pub id: String,
    pub query_text: String,
    pub retrieved_count: u64,
    pub timestamp: String,
    pub view: ContextPackView,
}

/// Recent context packs plus the procedural registries.
#[derive(Debug, Clone)]
pub struct ContextPackHistory {
    limit: u32,
    pub entries: Vec<ContextPackEntry>,
    /// Pretty-printed prompt registry.
    pub prompt_registry: String,
    /// Pretty-printed tool registry.
    pub tool_registry: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for ContextPackHistory {
    fn default() -> Self {
        Self {
            limit: DEFAULT_CONTEXT_PACK_LIMIT,
            entries: Vec::new(),
            prompt_registry: String::new(),
            tool_registry: String::new(),
            loading: false,
            error: None,
        }
    }
}

impl ContextPackHistory {
    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn set_limit_input(&mut self, input: &str) {
        self.limit = parse_limit(input, DEFAULT_CONTEXT_PACK_LIMIT, MAX_CONTEXT_PACK_LIMIT);
    }

    pub fn begin_load(&mut self, namespace: &str, session_id: &str) -> ContextPackParams {
        self.loading = true;
        self.error = None;
        ContextPackParams {
            namespace: Some(namespace.to_string()),
            session_id: Some(session_id.to_string()),
            limit: Some(self.limit),
            include_pack: Some(true),
        }
    }

    pub fn finish_load(
        &mut self,
        packs: ApiResult<OpsContextPacksResponse>,
        procedural: ApiResult<OpsProceduralResponse>,
    ) {
        self.loading = false;
        let mut errors = Vec::new();
        match packs {
            Ok(response) => {
                self.entries = response
                    .context_packs
                    .into_iter()
                    .map(|pack| ContextPackEntry {
                        timestamp: format_timestamp(&pack.created_at),
                        view: ContextPackView::from_value(&Value::Object(pack.pack)),
                        id: pack.id,
                        query_text: pack.query_text,
                        retrieved_count: pack.retrieved_count,
                    })
                    .collect();
            }
            Err(err) => errors.push(err.to_string()),
        }
        match procedural {
            Ok(response) => {
                self.prompt_registry = pretty(&Value::Object(response.prompt_registry));
                self.tool_registry = pretty(&Value::Object(response.tool_registry));
            }
            Err(err) => errors.push(err.to_string()),
        }
        if !errors.is_empty() {
            self.error = Some(errors.join("; "));
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memos_rs_test_utils::{card_json, condensation, condensations};
    use pretty_assertions::assert_eq;

    #[test]
    fn rows_render_metadata_and_card() {
        let mut record = condensation("cond-0123456789", "Project_X", "s-1", &card_json());
        record.trigger_reason = None;
        let row = CondensationRow::from_record(&record);
        assert_eq!(row.subtitle(), "id=23456789 | src_ids=2 | reason=-");
        assert_eq!(row.saved_tokens, 240);
        assert_eq!(row.saved_percent, 80);
        assert!(row.card.is_some());
        assert!(row.title().starts_with("v2 | "));
    }

    #[test]
    fn saved_tokens_never_negative() {
        let mut record = condensation("c", "ns", "s", "plain");
        record.token_original = 10;
        record.token_condensed = 40;
        let row = CondensationRow::from_record(&record);
        assert_eq!(row.saved_tokens, 0);
        assert!(row.card.is_none());
    }

    #[test]
    fn history_limit_and_load() {
        let mut history = CondensationHistory::default();
        history.set_limit(500);
        assert_eq!(history.limit(), MAX_CONDENSATION_LIMIT);
        history.set_limit_input("");
        assert_eq!(history.limit(), DEFAULT_CONDENSATION_LIMIT);

        let params = history.begin_load("Project_X", "s-1");
        assert_eq!(params.limit, Some(10));
        assert!(history.loading);
        history.finish_load(Ok(condensations(vec![condensation("c-1", "Project_X", "s-1", "x")])));
        assert!(!history.loading);
        assert_eq!(history.rows.len(), 1);
    }

    #[test]
    fn context_pack_history_requests_full_packs() {
        let mut history = ContextPackHistory::default();
        let params = history.begin_load("Project_X", "s-1");
        assert_eq!(params.include_pack, Some(true));
        assert_eq!(params.limit, Some(DEFAULT_CONTEXT_PACK_LIMIT));
        history.finish_load(
            Ok(OpsContextPacksResponse::default()),
            Ok(OpsProceduralResponse::default()),
        );
        assert_eq!(history.prompt_registry, "{}");
        assert_eq!(history.error, None);
    }
}
