//! Audit trail panel.

use crate::format::{SHORT_JSON_MAX, format_timestamp, short_json};
use memos_rs_client::ApiResult;
use memos_rs_protocol::{HistoryParams, OpsAuditEvent, OpsAuditResponse};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_AUDIT_LIMIT: u32 = 20;
pub const MAX_AUDIT_LIMIT: u32 = 200;

/// Which events the panel lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditScope {
    /// Active namespace and session.
    #[default]
    Session,
    /// Active namespace, any session.
    Namespace,
    /// Everything.
    All,
}

impl AuditScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Namespace => "namespace",
            Self::All => "all",
        }
    }

    /// Session -> namespace -> all -> session.
    pub fn next(self) -> Self {
        match self {
            Self::Session => Self::Namespace,
            Self::Namespace => Self::All,
            Self::All => Self::Session,
        }
    }
}

impl fmt::Display for AuditScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Self::Session),
            "namespace" | "ns" => Ok(Self::Namespace),
            "all" => Ok(Self::All),
            other => Err(format!("unknown audit scope `{other}`")),
        }
    }
}

/// Parse a user-entered limit: non-numeric or zero input falls back to
/// `default`, anything else is clamped to `1..=max`.
pub fn parse_limit(input: &str, default: u32, max: u32) -> u32 {
    match input.trim().parse::<i64>() {
        Ok(0) | Err(_) => default,
        Ok(value) => value.clamp(1, i64::from(max)) as u32,
    }
}

/// Scope plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditFilter {
    pub scope: AuditScope,
    limit: u32,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self {
            scope: AuditScope::Session,
            limit: DEFAULT_AUDIT_LIMIT,
        }
    }
}

impl AuditFilter {
    pub fn new(scope: AuditScope, limit: u32) -> Self {
        let mut filter = Self { scope, limit: 0 };
        filter.set_limit(limit);
        filter
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit.clamp(1, MAX_AUDIT_LIMIT);
    }

    pub fn set_limit_input(&mut self, input: &str) {
        self.limit = parse_limit(input, DEFAULT_AUDIT_LIMIT, MAX_AUDIT_LIMIT);
    }

    /// Namespace is dropped for `all`; session id is only sent for `session`.
    pub fn params(&self, namespace: &str, session_id: &str) -> HistoryParams {
        HistoryParams {
            namespace: (self.scope != AuditScope::All).then(|| namespace.to_string()),
            session_id: (self.scope == AuditScope::Session).then(|| session_id.to_string()),
            limit: Some(self.limit),
        }
    }

    /// `scope=… | ns=… | session=…`
    pub fn header(&self, namespace: &str, session_id: &str) -> String {
        format!(
            "scope={} | ns={} | session={}",
            self.scope, namespace, session_id
        )
    }
}

/// One rendered audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    pub timestamp: String,
    pub event_type: String,
    pub namespace: String,
    pub session_id: String,
    pub details: String,
}

impl AuditRow {
    pub fn from_event(event: &OpsAuditEvent) -> Self {
        Self {
            timestamp: format_timestamp(&event.created_at),
            event_type: event.event_type.clone(),
            namespace: event.namespace.clone(),
            session_id: event.session_id.clone(),
            details: short_json(&Value::Object(event.details.clone()), SHORT_JSON_MAX),
        }
    }
}

/// Audit panel state.
#[derive(Debug, Clone, Default)]
pub struct AuditPanel {
    pub filter: AuditFilter,
    pub rows: Vec<AuditRow>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuditPanel {
    pub fn begin_load(&mut self, namespace: &str, session_id: &str) -> HistoryParams {
        self.loading = true;
        self.error = None;
        self.filter.params(namespace, session_id)
    }

    pub fn finish_load(&mut self, result: ApiResult<OpsAuditResponse>) {
        self.loading = false;
        match result {
            Ok(response) => {
                self.rows = response.events.iter().map(AuditRow::from_event).collect();
            }
            Err(err) => self.error = Some(err.to_string()),
        }
    }

    /// Session scope hides other sessions, which looks empty right after a
    /// namespace switch.
    pub fn show_scope_hint(&self) -> bool {
        self.filter.scope == AuditScope::Session
    }
}
