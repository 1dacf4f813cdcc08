//! reqwest-backed implementation of [`MemosApi`].

use crate::{ApiError, ApiResult, MemosApi};
use async_trait::async_trait;
use log::{debug, warn};
use memos_rs_protocol::{
    ContextPackParams, DevSeedParams, DevSeedResponse, HealthResponse, HistoryParams,
    IngestRequest, IngestResponse, OpsAuditResponse, OpsCondensationsResponse,
    OpsContextPacksResponse, OpsPipelineResponse, OpsProceduralResponse, OpsStatsResponse,
    QueryRequest, QueryResponse, ResetSessionRequest, ResetSessionResponse,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Backend address used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Resolve a configured base URL: blank values fall back to the default and
/// trailing slashes are dropped.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let base = if trimmed.is_empty() {
        DEFAULT_API_BASE_URL
    } else {
        trimmed
    };
    base.trim_end_matches('/').to_string()
}

/// HTTP client for the MemOS backend.
#[derive(Clone, Debug)]
pub struct HttpMemosClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMemosClient {
    /// Create a client with the library default timeout.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client with an optional overall request timeout.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: normalize_base_url(base_url),
        })
    }

    /// Resolved base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> ApiResult<T> {
        let mut builder = self.request(Method::GET, path);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        self.execute(path, builder).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let builder = self.request(Method::POST, path).json(body);
        self.execute(path, builder).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        debug!("backend request (path={})", path);
        let response = builder.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        let body = response.text().await?;
        let payload = if is_json {
            match serde_json::from_str::<Value>(&body) {
                Ok(value) => value,
                Err(_) => Value::String(body),
            }
        } else {
            Value::String(body)
        };

        if !status.is_success() {
            warn!(
                "backend request failed (path={}, status={})",
                path,
                status.as_u16()
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                payload,
            });
        }

        serde_json::from_value(payload).map_err(|err| ApiError::Decode {
            path: path.to_string(),
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl MemosApi for HttpMemosClient {
    async fn health(&self) -> ApiResult<HealthResponse> {
        self.get("/health", &[]).await
    }

    async fn ingest(&self, request: &IngestRequest) -> ApiResult<IngestResponse> {
        self.post("/v1/ingest", request).await
    }

    async fn query(&self, request: &QueryRequest) -> ApiResult<QueryResponse> {
        self.post("/v1/query", request).await
    }

    async fn ops_stats(&self) -> ApiResult<OpsStatsResponse> {
        self.get("/v1/ops/stats", &[]).await
    }

    async fn ops_pipeline(&self) -> ApiResult<OpsPipelineResponse> {
        self.get("/v1/ops/pipeline", &[]).await
    }

    async fn ops_audit(&self, params: &HistoryParams) -> ApiResult<OpsAuditResponse> {
        self.get("/v1/ops/audit", &params.query_pairs()).await
    }

    async fn ops_condensations(
        &self,
        params: &HistoryParams,
    ) -> ApiResult<OpsCondensationsResponse> {
        self.get("/v1/ops/condensations", &params.query_pairs())
            .await
    }

    async fn ops_context_packs(
        &self,
        params: &ContextPackParams,
    ) -> ApiResult<OpsContextPacksResponse> {
        self.get("/v1/ops/context_packs", &params.query_pairs())
            .await
    }

    async fn ops_procedural(&self) -> ApiResult<OpsProceduralResponse> {
        self.get("/v1/ops/procedural", &[]).await
    }

    async fn dev_seed(&self, params: &DevSeedParams) -> ApiResult<DevSeedResponse> {
        let path = "/v1/dev/seed";
        let pairs = params.query_pairs();
        let mut builder = self.request(Method::POST, path);
        if !pairs.is_empty() {
            builder = builder.query(&pairs);
        }
        self.execute(path, builder).await
    }

    async fn reset_session(
        &self,
        request: &ResetSessionRequest,
    ) -> ApiResult<ResetSessionResponse> {
        self.post("/v1/sessions/reset", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_strips_trailing_slash() {
        assert_eq!(normalize_base_url("http://memos:9000/"), "http://memos:9000");
        assert_eq!(normalize_base_url(" http://memos:9000 "), "http://memos:9000");
    }

    #[test]
    fn normalize_falls_back_to_default_when_blank() {
        assert_eq!(normalize_base_url(""), DEFAULT_API_BASE_URL);
        assert_eq!(normalize_base_url("   "), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn client_keeps_normalized_base_url() {
        let client = HttpMemosClient::new("http://localhost:8000/").expect("client");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
