//! Workbench lifecycle integration tests.

use memos_rs_core::{
    CondensationPoller, CondensationStatus, FileStore, KeyValueStore, MemoryStore, MockMemosApi,
    PollOutcome, SessionState, Workbench,
};
use memos_rs_test_utils::{
    StubApi, StubCall, StubFailure, card_json, condensation, condensations, query_response,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn workbench_with(api: Arc<StubApi>) -> Workbench {
    let session = SessionState::load(Arc::new(MemoryStore::new()), "Project_X").expect("session");
    Workbench::new(api, session, 6)
}

/// A send ingests the user turn, then queries with the same identity.
#[tokio::test]
async fn send_ingests_then_queries() {
    let api = Arc::new(StubApi::new());
    api.push_query(Ok(query_response("ret-1", &card_json())));
    let mut bench = workbench_with(api.clone());
    let session_id = bench.session_id().to_string();

    let ticket = bench.send_message("what's the deadline?").await;
    assert!(ticket.is_none());

    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    match (&calls[0], &calls[1]) {
        (StubCall::Ingest(ingest), StubCall::Query(query)) => {
            assert_eq!(ingest.session_id, session_id);
            assert_eq!(ingest.text, "what's the deadline?");
            assert_eq!(query.namespace, "Project_X");
            assert_eq!(query.top_k, Some(6));
        }
        other => panic!("unexpected calls: {other:?}"),
    }
    let context = bench.context().expect("context");
    assert_eq!(context.id, "ret-1");
    assert_eq!(bench.transcript().len(), 2);
    assert!(!bench.is_processing());
}

/// A failed query leaves the previous context untouched and records the error.
#[tokio::test]
async fn failed_query_keeps_previous_context() {
    let api = Arc::new(StubApi::new());
    api.push_query(Ok(query_response("ret-1", &card_json())));
    api.push_query(Err(StubFailure::new(503, "Service Unavailable")));
    let mut bench = workbench_with(api);

    bench.send_message("first").await;
    let before = bench.context().cloned();
    bench.send_message("second").await;

    assert_eq!(bench.context().cloned(), before);
    assert_eq!(
        bench.api_error(),
        Some("Request failed: 503 Service Unavailable")
    );
    assert!(!bench.is_processing());
}

/// A failed ingest aborts the send before querying.
#[tokio::test]
async fn failed_ingest_skips_query() {
    let api = Arc::new(StubApi::new());
    api.push_ingest(Err(StubFailure::new(422, "Unprocessable Entity")));
    let mut bench = workbench_with(api.clone());

    assert!(bench.send_message("hello").await.is_none());
    assert!(bench.context().is_none());
    assert!(bench.api_error().is_some());
    assert!(
        !api.calls()
            .iter()
            .any(|call| matches!(call, StubCall::Query(_)))
    );
}

/// Namespace changes always rotate the session and clear local state.
#[tokio::test]
async fn namespace_change_rotates_session_and_clears() {
    let api = Arc::new(StubApi::new());
    for name in ["ret-1", "ret-2", "ret-3"] {
        api.push_query(Ok(query_response(name, &card_json())));
    }
    let mut bench = workbench_with(api);

    for namespace in ["Team_B", "  Team_B  ", "Project_X"] {
        bench.send_message("hello").await;
        assert!(bench.context().is_some());
        let before = bench.session_id().to_string();

        assert!(bench.set_namespace(namespace).expect("set namespace"));
        assert_ne!(bench.session_id(), before);
        assert_eq!(bench.namespace(), namespace.trim());
        assert!(bench.transcript().is_empty());
        assert!(bench.context().is_none());
    }
}

/// Blank namespaces are ignored.
#[tokio::test]
async fn blank_namespace_is_ignored() {
    let api = Arc::new(StubApi::new());
    api.push_query(Ok(query_response("ret-1", &card_json())));
    let mut bench = workbench_with(api);
    bench.send_message("hello").await;
    let session_id = bench.session_id().to_string();

    assert!(!bench.set_namespace("   ").expect("set namespace"));
    assert_eq!(bench.session_id(), session_id);
    assert_eq!(bench.namespace(), "Project_X");
    assert!(bench.context().is_some());
}

/// Reset clears local state only on success and never for a dry run.
#[tokio::test]
async fn reset_clears_only_on_success() {
    let api = Arc::new(StubApi::new());
    api.push_query(Ok(query_response("ret-1", &card_json())));
    api.push_reset(Err(StubFailure::new(500, "Internal Server Error")));
    let mut bench = workbench_with(api.clone());
    bench.send_message("hello").await;

    assert!(bench.reset_session(false, false).await.is_none());
    assert!(bench.context().is_some());
    assert_eq!(bench.transcript().len(), 2);
    assert!(bench.api_error().is_some());

    let dry = bench.reset_session(true, false).await.expect("dry run");
    assert!(dry.ok);
    assert!(bench.context().is_some());
    assert!(bench.status().is_some_and(|s| s.starts_with("Dry run")));

    bench.reset_session(false, true).await.expect("reset");
    assert!(bench.context().is_none());
    assert!(bench.transcript().is_empty());
    assert_eq!(bench.api_error(), None);

    let Some(StubCall::ResetSession(last)) = api.calls().last().cloned() else {
        panic!("expected reset call");
    };
    assert!(last.confirm);
    assert_eq!(last.clear_audit, Some(true));
}

/// Seeding targets the active namespace and session.
#[tokio::test]
async fn seed_uses_active_identity() {
    let api = Arc::new(StubApi::new());
    let mut bench = workbench_with(api.clone());
    let response = bench.seed_demo(true).await.expect("seed");
    assert_eq!(response.session_id, bench.session_id());
    assert_eq!(
        api.calls(),
        vec![StubCall::DevSeed(bench.seed_params(true))]
    );
    assert!(bench.status().is_some_and(|s| s.starts_with("Seeded 0 memories")));
}

/// Free-text summaries are followed by a poll that swaps in the card.
#[tokio::test(start_paused = true)]
async fn poll_applies_structured_condensation() {
    let api = Arc::new(StubApi::new());
    api.push_query(Ok(query_response("ret-7", "plain fallback summary")));
    let mut bench = workbench_with(api.clone());
    let session_id = bench.session_id().to_string();

    let ticket = bench
        .send_message("what's the deadline?")
        .await
        .expect("poll ticket");
    assert_eq!(ticket.response_id, "ret-7");
    assert_eq!(bench.condensation_status(), CondensationStatus::Condensing);

    api.push_condensations(Ok(condensations(Vec::new())));
    api.push_condensations(Err(StubFailure::new(500, "Internal Server Error")));
    api.push_condensations(Ok(condensations(vec![condensation(
        "cond-1",
        "Project_X",
        &session_id,
        &card_json(),
    )])));

    let start = tokio::time::Instant::now();
    let outcome = CondensationPoller::default()
        .run(api.as_ref(), &ticket)
        .await;
    assert_eq!(start.elapsed(), Duration::from_millis(600 + 900 + 1200));

    let PollOutcome::Found { row, attempts } = outcome else {
        panic!("expected a condensation");
    };
    assert_eq!(attempts, 3);
    assert_eq!(api.condensation_calls(), 3);
    assert!(bench.apply_condensation(&ticket, &row));

    let context = bench.context().expect("context");
    assert_eq!(context.condensed_text, card_json());
    assert_eq!(context.token_usage_original, 300);
    assert_eq!(context.token_usage_condensed, 60);
    assert_eq!(bench.condensation_status(), CondensationStatus::Idle);
}

/// The poll gives up after six attempts when only free text comes back.
#[tokio::test(start_paused = true)]
async fn poll_stops_after_six_attempts() {
    let api = Arc::new(StubApi::new());
    api.push_query(Ok(query_response("ret-8", "plain")));
    let mut bench = workbench_with(api.clone());
    let session_id = bench.session_id().to_string();
    let ticket = bench.send_message("hello").await.expect("ticket");
    for _ in 0..10 {
        api.push_condensations(Ok(condensations(vec![condensation(
            "cond-x",
            "Project_X",
            &session_id,
            "still free text",
        )])));
    }

    let outcome = CondensationPoller::default()
        .run(api.as_ref(), &ticket)
        .await;
    assert_eq!(outcome, PollOutcome::Exhausted { attempts: 6 });
    assert_eq!(api.condensation_calls(), 6);

    bench.mark_condensation_pending(&ticket);
    assert_eq!(bench.condensation_status(), CondensationStatus::Pending);
    assert_eq!(bench.context().map(|c| c.condensed_text.as_str()), Some("plain"));
}

/// A schedule longer than six delays still stops at six attempts.
#[tokio::test(start_paused = true)]
async fn long_schedule_is_capped_at_six_attempts() {
    let api = Arc::new(StubApi::new());
    api.push_query(Ok(query_response("ret-9", "plain")));
    let mut bench = workbench_with(api.clone());
    let session_id = bench.session_id().to_string();
    let ticket = bench.send_message("hello").await.expect("ticket");
    for _ in 0..10 {
        api.push_condensations(Ok(condensations(vec![condensation(
            "cond-y",
            "Project_X",
            &session_id,
            "still free text",
        )])));
    }

    let poller = CondensationPoller::from_millis(&[1; 10]);
    assert_eq!(poller.max_attempts(), 6);
    let outcome = poller.run(api.as_ref(), &ticket).await;
    assert_eq!(outcome, PollOutcome::Exhausted { attempts: 6 });
    assert_eq!(api.condensation_calls(), 6);
}

/// A condensation for a superseded retrieval is not applied.
#[tokio::test]
async fn stale_condensation_is_ignored() {
    let api = Arc::new(StubApi::new());
    api.push_query(Ok(query_response("ret-1", "plain")));
    api.push_query(Ok(query_response("ret-2", "plain")));
    let mut bench = workbench_with(api);
    let session_id = bench.session_id().to_string();

    let first = bench.send_message("one").await.expect("ticket");
    bench.send_message("two").await.expect("ticket");
    let row = condensation("cond-1", "Project_X", &session_id, &card_json());

    assert!(!bench.apply_condensation(&first, &row));
    assert_eq!(bench.context().map(|c| c.id.as_str()), Some("ret-2"));
    assert_eq!(bench.context().map(|c| c.condensed_text.as_str()), Some("plain"));
}

/// Session identity survives a restart through the file store.
#[test]
fn session_identity_persists_across_restart() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("session.json");

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).expect("open"));
    let mut state = SessionState::load(store, "Project_X").expect("load");
    state.set_namespace("Team_B").expect("set");
    let session_id = state.session_id().to_string();

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).expect("reopen"));
    let restored = SessionState::load(store, "Project_X").expect("load");
    assert_eq!(restored.namespace(), "Team_B");
    assert_eq!(restored.session_id(), session_id);
}

/// The offline backend drives the whole send and poll cycle.
#[tokio::test(start_paused = true)]
async fn mock_backend_round_trip() {
    let api = Arc::new(MockMemosApi::seeded(1, Duration::from_millis(1500)));
    let session = SessionState::load(Arc::new(MemoryStore::new()), "Project_X").expect("session");
    let mut bench = Workbench::new(api.clone(), session, 12);

    let ticket = bench.send_message("deadline?").await.expect("ticket");
    let context = bench.context().expect("context");
    assert_eq!(context.token_usage_original, 145);
    assert_eq!(context.saved_percent(), 81);
    assert!(context.original_text.contains("Project Phoenix"));

    let PollOutcome::Found { row, attempts } =
        CondensationPoller::default().run(api.as_ref(), &ticket).await
    else {
        panic!("mock backend should condense");
    };
    assert_eq!(attempts, 1);
    assert!(bench.apply_condensation(&ticket, &row));
    assert!(bench.transcript()[1].content.starts_with("I've updated the context"));
}
