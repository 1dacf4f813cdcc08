use async_trait::async_trait;
use memos_rs_client::{ApiError, ApiResult, MemosApi};
use memos_rs_protocol::{
    ContextPackParams, DevSeedParams, DevSeedResponse, HealthResponse, HistoryParams,
    IngestRequest, IngestResponse, OpsAuditResponse, OpsCondensationsResponse,
    OpsContextPacksResponse, OpsPipelineResponse, OpsProceduralResponse, OpsStatsResponse,
    QueryRequest, QueryResponse, ResetSessionRequest, ResetSessionResponse,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;

/// Recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum StubCall {
    Health,
    Ingest(IngestRequest),
    Query(QueryRequest),
    OpsStats,
    OpsPipeline,
    OpsAudit(HistoryParams),
    OpsCondensations(HistoryParams),
    OpsContextPacks(ContextPackParams),
    OpsProcedural,
    DevSeed(DevSeedParams),
    ResetSession(ResetSessionRequest),
}

/// Scripted failure, turned into [`ApiError::Status`] when replayed.
#[derive(Debug, Clone)]
pub struct StubFailure {
    pub status: u16,
    pub status_text: String,
}

impl StubFailure {
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
        }
    }

    fn into_error(self) -> ApiError {
        ApiError::Status {
            payload: json!({ "detail": self.status_text }),
            status: self.status,
            status_text: self.status_text,
        }
    }
}

type Script<T> = VecDeque<Result<T, StubFailure>>;

#[derive(Default)]
struct Scripts {
    ingest: Script<IngestResponse>,
    query: Script<QueryResponse>,
    stats: Script<OpsStatsResponse>,
    pipeline: Script<OpsPipelineResponse>,
    audit: Script<OpsAuditResponse>,
    condensations: Script<OpsCondensationsResponse>,
    context_packs: Script<OpsContextPacksResponse>,
    seed: Script<DevSeedResponse>,
    reset: Script<ResetSessionResponse>,
}

/// In-memory [`MemosApi`] replaying scripted responses in order.
///
/// Unscripted calls fall back to an empty success, except `query` which
/// fails with a 500 so a missing script is visible in assertions.
#[derive(Default)]
pub struct StubApi {
    scripts: Mutex<Scripts>,
    calls: Mutex<Vec<StubCall>>,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ingest(&self, response: Result<IngestResponse, StubFailure>) {
        self.scripts.lock().ingest.push_back(response);
    }

    pub fn push_query(&self, response: Result<QueryResponse, StubFailure>) {
        self.scripts.lock().query.push_back(response);
    }

    pub fn push_stats(&self, response: Result<OpsStatsResponse, StubFailure>) {
        self.scripts.lock().stats.push_back(response);
    }

    pub fn push_pipeline(&self, response: Result<OpsPipelineResponse, StubFailure>) {
        self.scripts.lock().pipeline.push_back(response);
    }

    pub fn push_audit(&self, response: Result<OpsAuditResponse, StubFailure>) {
        self.scripts.lock().audit.push_back(response);
    }

    pub fn push_condensations(&self, response: Result<OpsCondensationsResponse, StubFailure>) {
        self.scripts.lock().condensations.push_back(response);
    }

    pub fn push_context_packs(&self, response: Result<OpsContextPacksResponse, StubFailure>) {
        self.scripts.lock().context_packs.push_back(response);
    }

    pub fn push_seed(&self, response: Result<DevSeedResponse, StubFailure>) {
        self.scripts.lock().seed.push_back(response);
    }

    pub fn push_reset(&self, response: Result<ResetSessionResponse, StubFailure>) {
        self.scripts.lock().reset.push_back(response);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<StubCall> {
        self.calls.lock().clone()
    }

    /// Number of `ops_condensations` calls made so far.
    pub fn condensation_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, StubCall::OpsCondensations(_)))
            .count()
    }

    fn record(&self, call: StubCall) {
        self.calls.lock().push(call);
    }
}

fn replay<T>(
    script: Option<Result<T, StubFailure>>,
    fallback: impl FnOnce() -> ApiResult<T>,
) -> ApiResult<T> {
    match script {
        Some(Ok(value)) => Ok(value),
        Some(Err(failure)) => Err(failure.into_error()),
        None => fallback(),
    }
}

#[async_trait]
impl MemosApi for StubApi {
    async fn health(&self) -> ApiResult<HealthResponse> {
        self.record(StubCall::Health);
        Ok(HealthResponse {
            status: "ok".to_string(),
        })
    }

    async fn ingest(&self, request: &IngestRequest) -> ApiResult<IngestResponse> {
        self.record(StubCall::Ingest(request.clone()));
        let next = self.scripts.lock().ingest.pop_front();
        replay(next, || {
            Ok(IngestResponse {
                memory_id: "mem-stub".to_string(),
                accepted: true,
            })
        })
    }

    async fn query(&self, request: &QueryRequest) -> ApiResult<QueryResponse> {
        self.record(StubCall::Query(request.clone()));
        let next = self.scripts.lock().query.pop_front();
        replay(next, || Err(StubFailure::new(500, "Internal Server Error").into_error()))
    }

    async fn ops_stats(&self) -> ApiResult<OpsStatsResponse> {
        self.record(StubCall::OpsStats);
        let next = self.scripts.lock().stats.pop_front();
        replay(next, || Ok(OpsStatsResponse::default()))
    }

    async fn ops_pipeline(&self) -> ApiResult<OpsPipelineResponse> {
        self.record(StubCall::OpsPipeline);
        let next = self.scripts.lock().pipeline.pop_front();
        replay(next, || Ok(OpsPipelineResponse::default()))
    }

    async fn ops_audit(&self, params: &HistoryParams) -> ApiResult<OpsAuditResponse> {
        self.record(StubCall::OpsAudit(params.clone()));
        let next = self.scripts.lock().audit.pop_front();
        replay(next, || Ok(OpsAuditResponse::default()))
    }

    async fn ops_condensations(
        &self,
        params: &HistoryParams,
    ) -> ApiResult<OpsCondensationsResponse> {
        self.record(StubCall::OpsCondensations(params.clone()));
        let next = self.scripts.lock().condensations.pop_front();
        replay(next, || Ok(OpsCondensationsResponse::default()))
    }

    async fn ops_context_packs(
        &self,
        params: &ContextPackParams,
    ) -> ApiResult<OpsContextPacksResponse> {
        self.record(StubCall::OpsContextPacks(params.clone()));
        let next = self.scripts.lock().context_packs.pop_front();
        replay(next, || Ok(OpsContextPacksResponse::default()))
    }

    async fn ops_procedural(&self) -> ApiResult<OpsProceduralResponse> {
        self.record(StubCall::OpsProcedural);
        Ok(OpsProceduralResponse::default())
    }

    async fn dev_seed(&self, params: &DevSeedParams) -> ApiResult<DevSeedResponse> {
        self.record(StubCall::DevSeed(params.clone()));
        let next = self.scripts.lock().seed.pop_front();
        replay(next, || {
            Ok(DevSeedResponse {
                ok: true,
                namespace: params.namespace.clone().unwrap_or_default(),
                session_id: params.session_id.clone().unwrap_or_default(),
                inserted: 0,
                memory_ids: Vec::new(),
            })
        })
    }

    async fn reset_session(
        &self,
        request: &ResetSessionRequest,
    ) -> ApiResult<ResetSessionResponse> {
        self.record(StubCall::ResetSession(request.clone()));
        let next = self.scripts.lock().reset.pop_front();
        replay(next, || {
            Ok(ResetSessionResponse {
                ok: true,
                namespace: request.namespace.clone(),
                session_id: request.session_id.clone(),
                reset_at: "2024-01-01T00:00:00Z".to_string(),
                deleted_counts: Default::default(),
            })
        })
    }
}
