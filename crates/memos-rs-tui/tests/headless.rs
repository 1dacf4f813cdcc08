use memos_rs_config::DashboardConfig;
use memos_rs_core::{AuditScope, MemoryStore, SessionState};
use memos_rs_protocol::{HistoryParams, QueryRequest};
use memos_rs_test_utils::{StubApi, StubCall, StubFailure, query_response};
use memos_rs_tui::Backend;
use memos_rs_tui::cli::{Command, OutputArgs, execute};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn stub_backend(stub: &Arc<StubApi>) -> Backend {
    Backend {
        api: stub.clone(),
        mock: None,
        label: "stub".to_string(),
    }
}

fn session() -> SessionState {
    SessionState::load(Arc::new(MemoryStore::new()), "Project_X").expect("load session")
}

#[tokio::test]
async fn audit_all_scope_drops_identity_filters() {
    let stub = Arc::new(StubApi::new());
    let mut out = Vec::new();
    execute(
        Command::Audit {
            scope: AuditScope::All,
            limit: Some(7),
            output: OutputArgs::default(),
        },
        &stub_backend(&stub),
        session(),
        &DashboardConfig::default(),
        &mut out,
    )
    .await
    .expect("audit");

    assert_eq!(
        stub.calls(),
        vec![StubCall::OpsAudit(HistoryParams {
            namespace: None,
            session_id: None,
            limit: Some(7),
        })]
    );
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("no audit events"));
}

#[tokio::test]
async fn query_uses_configured_top_k_and_stored_identity() {
    let stub = Arc::new(StubApi::new());
    stub.push_query(Ok(query_response("ret-1", "plain summary")));
    let state = session();
    let session_id = state.session_id().to_string();
    let mut config = DashboardConfig::default();
    config.query.top_k = 4;

    let mut out = Vec::new();
    execute(
        Command::Query {
            text: "  deadline?  ".to_string(),
            top_k: None,
            output: OutputArgs::default(),
        },
        &stub_backend(&stub),
        state,
        &config,
        &mut out,
    )
    .await
    .expect("query");

    assert_eq!(
        stub.calls(),
        vec![StubCall::Query(QueryRequest {
            namespace: "Project_X".to_string(),
            session_id,
            query: "deadline?".to_string(),
            top_k: Some(4),
        })]
    );
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("response   ret-1"));
    assert!(text.contains("  plain summary"));
}

#[tokio::test]
async fn failed_reset_reports_status_text() {
    let stub = Arc::new(StubApi::new());
    stub.push_reset(Err(StubFailure::new(503, "Service Unavailable")));
    let mut out = Vec::new();
    let err = execute(
        Command::Reset {
            dry_run: false,
            clear_audit: true,
            output: OutputArgs::default(),
        },
        &stub_backend(&stub),
        session(),
        &DashboardConfig::default(),
        &mut out,
    )
    .await
    .expect_err("reset fails");

    assert_eq!(
        err.to_string(),
        "reset failed: Request failed: 503 Service Unavailable"
    );
    assert!(out.is_empty());
}
