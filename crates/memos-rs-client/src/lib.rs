//! Typed client for the MemOS backend REST API.
//!
//! [`MemosApi`] is the seam every dashboard component talks through. The
//! production implementation is [`HttpMemosClient`]; tests and the offline
//! demo mode provide their own.

mod error;
mod http;

pub use error::{ApiError, ApiResult};
pub use http::{DEFAULT_API_BASE_URL, HttpMemosClient, normalize_base_url};

use async_trait::async_trait;
use memos_rs_protocol::{
    ContextPackParams, DevSeedParams, DevSeedResponse, HealthResponse, HistoryParams,
    IngestRequest, IngestResponse, OpsAuditResponse, OpsCondensationsResponse,
    OpsContextPacksResponse, OpsPipelineResponse, OpsProceduralResponse, OpsStatsResponse,
    QueryRequest, QueryResponse, ResetSessionRequest, ResetSessionResponse,
};

/// Backend operations consumed by the dashboard.
#[async_trait]
pub trait MemosApi: Send + Sync {
    /// `GET /health`.
    async fn health(&self) -> ApiResult<HealthResponse>;
    /// `POST /v1/ingest`: store one chat turn.
    async fn ingest(&self, request: &IngestRequest) -> ApiResult<IngestResponse>;
    /// `POST /v1/query`: retrieve and condense context.
    async fn query(&self, request: &QueryRequest) -> ApiResult<QueryResponse>;
    /// `GET /v1/ops/stats`.
    async fn ops_stats(&self) -> ApiResult<OpsStatsResponse>;
    /// `GET /v1/ops/pipeline`.
    async fn ops_pipeline(&self) -> ApiResult<OpsPipelineResponse>;
    /// `GET /v1/ops/audit`.
    async fn ops_audit(&self, params: &HistoryParams) -> ApiResult<OpsAuditResponse>;
    /// `GET /v1/ops/condensations`.
    async fn ops_condensations(&self, params: &HistoryParams)
    -> ApiResult<OpsCondensationsResponse>;
    /// `GET /v1/ops/context_packs`.
    async fn ops_context_packs(
        &self,
        params: &ContextPackParams,
    ) -> ApiResult<OpsContextPacksResponse>;
    /// `GET /v1/ops/procedural`.
    async fn ops_procedural(&self) -> ApiResult<OpsProceduralResponse>;
    /// `POST /v1/dev/seed`.
    async fn dev_seed(&self, params: &DevSeedParams) -> ApiResult<DevSeedResponse>;
    /// `POST /v1/sessions/reset`.
    async fn reset_session(&self, request: &ResetSessionRequest)
    -> ApiResult<ResetSessionResponse>;
}
