use super::{
    PHOENIX_LOG, PHOENIX_SUMMARY, PHOENIX_TOKENS_CONDENSED, PHOENIX_TOKENS_ORIGINAL,
    generate_mock_memories,
};
use crate::types::MemoryNode;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use memos_rs_client::{ApiError, ApiResult, MemosApi};
use memos_rs_protocol::{
    ContextPackParams, DeletedCounts, DevSeedParams, DevSeedResponse, HealthResponse,
    HistoryParams, IngestRequest, IngestResponse, MemoryTier, OpsAuditEvent, OpsAuditResponse,
    OpsCondensation, OpsCondensationsResponse, OpsContextPack, OpsContextPacksResponse,
    OpsPipelineResponse, OpsProceduralResponse, OpsQueueDepth, OpsRecentCondensation,
    OpsStatsResponse, QueryRequest, QueryResponse, RerankDebug, ResetSessionRequest,
    ResetSessionResponse, RetrievedChunk,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::time::Duration;

/// Simulated processing time of a query.
pub const MOCK_QUERY_LATENCY: Duration = Duration::from_millis(1500);
const DEFAULT_TOP_K: usize = 12;

#[derive(Debug, Clone)]
struct StoredTurn {
    id: String,
    namespace: String,
    session_id: String,
    role: String,
    text: String,
}

struct MockState {
    rng: StdRng,
    seq: u64,
    stats: OpsStatsResponse,
    memories: Vec<MemoryNode>,
    turns: Vec<StoredTurn>,
    queued: Vec<OpsCondensation>,
    condensations: Vec<OpsCondensation>,
    context_packs: Vec<OpsContextPack>,
    audit: Vec<OpsAuditEvent>,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.seq += 1;
        format!("{prefix}-{}-{}", Utc::now().timestamp_millis(), self.seq)
    }

    fn record(&mut self, namespace: &str, session_id: &str, event_type: &str, details: Value) {
        let id = self.next_id("audit");
        self.audit.push(OpsAuditEvent {
            id,
            namespace: namespace.to_string(),
            session_id: session_id.to_string(),
            event_type: event_type.to_string(),
            details: object(details),
            created_at: Utc::now().to_rfc3339(),
        });
    }

    /// Queued condensations land on the next history read.
    fn flush_queue(&mut self) {
        self.condensations.append(&mut self.queued);
    }
}

/// In-process stand-in for the backend.
///
/// Every send adds a memory node and bumps the counters; each query
/// enqueues a memory-card condensation for its session, so the follow-up
/// poll has something to find.
pub struct MockMemosApi {
    state: Mutex<MockState>,
    latency: Duration,
}

impl Default for MockMemosApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMemosApi {
    pub fn new() -> Self {
        Self::with_rng(StdRng::seed_from_u64(rand::random()), MOCK_QUERY_LATENCY)
    }

    /// Deterministic instance with the given query latency.
    pub fn seeded(seed: u64, latency: Duration) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), latency)
    }

    fn with_rng(mut rng: StdRng, latency: Duration) -> Self {
        let memories = generate_mock_memories(super::MOCK_MEMORY_COUNT, &mut rng);
        Self {
            state: Mutex::new(MockState {
                rng,
                seq: 0,
                stats: OpsStatsResponse {
                    total_memories: 14052,
                    active_contexts: 3,
                    token_savings: 845200,
                    compression_ratio: 0.82,
                },
                memories,
                turns: Vec::new(),
                queued: Vec::new(),
                condensations: Vec::new(),
                context_packs: Vec::new(),
                audit: Vec::new(),
            }),
            latency,
        }
    }

    /// Snapshot of the simulated memory cloud.
    pub fn memories(&self) -> Vec<MemoryNode> {
        self.state.lock().memories.clone()
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn matches(params_ns: Option<&str>, params_sid: Option<&str>, ns: &str, sid: &str) -> bool {
    params_ns.is_none_or(|want| want.is_empty() || want == ns)
        && params_sid.is_none_or(|want| want.is_empty() || want == sid)
}

fn limit(params: Option<u32>, default: usize) -> usize {
    params.map(|limit| limit as usize).unwrap_or(default)
}

fn phoenix_card() -> String {
    json!({
        "schema": "memos.memory_card.v2",
        "facts": [
            "Project Phoenix deadline moved from Q4 to Jan 2024",
            "Delay caused by the frontend module"
        ],
        "preferences": [],
        "constraints": ["Frontend module must be unblocked before release"],
        "decisions": ["Manager approved the new deadline (Ref #442)"],
        "risks": ["Further frontend slippage"],
        "actions": ["Update the project roadmap to Jan 2024"],
        "raw_excerpt": PHOENIX_SUMMARY
    })
    .to_string()
}

fn bad_request(detail: &str) -> ApiError {
    ApiError::Status {
        status: 400,
        status_text: "Bad Request".to_string(),
        payload: json!({ "detail": detail }),
    }
}

#[async_trait]
impl MemosApi for MockMemosApi {
    async fn health(&self) -> ApiResult<HealthResponse> {
        Ok(HealthResponse {
            status: "ok".to_string(),
        })
    }

    async fn ingest(&self, request: &IngestRequest) -> ApiResult<IngestResponse> {
        let mut state = self.state.lock();
        let memory_id = state.next_id("mem");
        state.turns.push(StoredTurn {
            id: memory_id.clone(),
            namespace: request.namespace.clone(),
            session_id: request.session_id.clone(),
            role: request.role.as_str().to_string(),
            text: request.text.clone(),
        });
        state.record(
            &request.namespace,
            &request.session_id,
            "ingest",
            json!({ "memory_id": memory_id, "role": request.role.as_str() }),
        );
        Ok(IngestResponse {
            memory_id,
            accepted: true,
        })
    }

    async fn query(&self, request: &QueryRequest) -> ApiResult<QueryResponse> {
        tokio::time::sleep(self.latency).await;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let id = state.next_id("ret");
        let similarity = 0.89 + state.rng.random::<f64>() * 0.1;

        let base_scores = [0.93, 0.71, 0.84, 0.9, 0.86];
        let rerank_bias = [0.02, -0.4, 0.0, 0.04, 0.01];
        let mut raw_chunks: Vec<RetrievedChunk> = Vec::new();
        for (idx, line) in PHOENIX_LOG.iter().enumerate() {
            let jitter = (state.rng.random::<f64>() - 0.5) * 0.06;
            let score = (base_scores[idx] + jitter).clamp(0.0, 1.0);
            let rerank = (score + rerank_bias[idx]).clamp(0.0, 1.0);
            raw_chunks.push(RetrievedChunk {
                id: format!("phoenix-log-{idx}"),
                tier: if idx == 4 {
                    MemoryTier::L3Entity
                } else {
                    MemoryTier::L2Semantic
                },
                text: (*line).to_string(),
                score,
                metadata: object(json!({ "rerank_score": rerank })),
            });
        }
        let distractors = state.memories.len().min(7);
        for offset in 0..distractors {
            let pick = state.rng.random_range(0..state.memories.len());
            let node = state.memories[pick].clone();
            let score = 0.55 + state.rng.random::<f64>() * 0.3;
            let rerank = state.rng.random::<f64>() * 0.45;
            raw_chunks.push(RetrievedChunk {
                id: format!("{}-{offset}", node.id),
                tier: node.tier,
                text: node.content,
                score,
                metadata: object(json!({ "rerank_score": rerank })),
            });
        }
        raw_chunks.sort_by(|a, b| b.score.total_cmp(&a.score));
        raw_chunks.truncate(limit(request.top_k, DEFAULT_TOP_K));

        let tier = MemoryTier::L2Semantic;
        let embedding = [
            state.rng.random::<f64>() * 2.0,
            state.rng.random::<f64>() * 2.0,
            state.rng.random::<f64>() * 2.0,
        ];
        let node_id = state.next_id("new");
        state.memories.push(MemoryNode {
            id: node_id,
            content: request.query.clone(),
            tier: tier.clone(),
            importance_score: 1.0,
            embedding,
            timestamp: Utc::now(),
            namespace: "Active_Session".to_string(),
        });
        state.stats.total_memories += 1;
        state.stats.token_savings += PHOENIX_TOKENS_ORIGINAL - PHOENIX_TOKENS_CONDENSED;

        let condensation_id = state.next_id("cond");
        let source_memory_ids: Vec<String> = state
            .turns
            .iter()
            .filter(|turn| turn.session_id == request.session_id)
            .map(|turn| turn.id.clone())
            .collect();
        state.queued.push(OpsCondensation {
            id: condensation_id.clone(),
            namespace: request.namespace.clone(),
            session_id: request.session_id.clone(),
            version: "v2".to_string(),
            trigger_reason: Some("query".to_string()),
            trigger_details: object(json!({ "response_id": id })),
            source_memory_ids,
            condensed_text: phoenix_card(),
            token_original: PHOENIX_TOKENS_ORIGINAL,
            token_condensed: PHOENIX_TOKENS_CONDENSED,
            created_at: Utc::now().to_rfc3339(),
        });

        let l1_window: Vec<Value> = state
            .turns
            .iter()
            .filter(|turn| turn.session_id == request.session_id)
            .rev()
            .take(10)
            .map(|turn| json!({ "role": turn.role, "text": turn.text }))
            .collect();
        let chunk_refs: Vec<Value> = raw_chunks
            .iter()
            .map(|chunk| json!({ "id": chunk.id, "score": chunk.score, "tier": chunk.tier }))
            .collect();
        let latest_summary = state
            .condensations
            .iter()
            .rev()
            .find(|row| row.session_id == request.session_id);
        let pack = json!({
            "schema": "memos.context_pack.v1",
            "query_text": request.query,
            "procedural": {
                "prompt": {"name": "memos-default", "description": "Answer from retrieved memory only"},
                "tools": [
                    {"name": "memos.query", "endpoint": "/v1/query"},
                    {"name": "memos.ingest", "endpoint": "/v1/ingest"}
                ]
            },
            "working_memory": {
                "l1_window": l1_window,
                "session_summary": latest_summary.map(|row| row.condensed_text.clone()).unwrap_or_default(),
                "session_summary_id": latest_summary.map(|row| row.id.clone()).unwrap_or_default()
            },
            "retrieval": { "raw_chunks": chunk_refs }
        });
        let pack_id = state.next_id("pack");
        state.context_packs.push(OpsContextPack {
            id: pack_id.clone(),
            namespace: request.namespace.clone(),
            session_id: request.session_id.clone(),
            query_text: request.query.clone(),
            session_summary_id: None,
            retrieved_count: raw_chunks.len() as u64,
            created_at: Utc::now().to_rfc3339(),
            pack: object(pack.clone()),
        });
        state.record(
            &request.namespace,
            &request.session_id,
            "query",
            json!({ "response_id": id, "top_k": request.top_k, "retrieved": raw_chunks.len() }),
        );
        debug!(
            "mock query served (response_id={}, chunks={})",
            id,
            raw_chunks.len()
        );

        Ok(QueryResponse {
            id,
            source_tier: tier,
            similarity,
            raw_chunks,
            condensed_summary: PHOENIX_SUMMARY.to_string(),
            token_usage_original: PHOENIX_TOKENS_ORIGINAL,
            token_usage_condensed: PHOENIX_TOKENS_CONDENSED,
            rerank_debug: vec![RerankDebug {
                method: "vector+token_overlap".to_string(),
                components: BTreeMap::from([
                    ("vector".to_string(), 0.7),
                    ("token_overlap".to_string(), 0.3),
                ]),
            }],
            session_summary_id: None,
            session_summary_cache_hit: Some(false),
            session_summary_enqueued: Some(true),
            context_pack_id: Some(pack_id),
            context_pack: Some(pack),
        })
    }

    async fn ops_stats(&self) -> ApiResult<OpsStatsResponse> {
        Ok(self.state.lock().stats)
    }

    async fn ops_pipeline(&self) -> ApiResult<OpsPipelineResponse> {
        let mut state = self.state.lock();
        let queued = state.queued.len() as u64;
        state.flush_queue();
        let recent_condensations = state
            .condensations
            .iter()
            .rev()
            .take(20)
            .map(|row| OpsRecentCondensation {
                id: row.id.clone(),
                namespace: row.namespace.clone(),
                session_id: row.session_id.clone(),
                token_original: row.token_original,
                token_condensed: row.token_condensed,
                created_at: row.created_at.clone(),
            })
            .collect();
        Ok(OpsPipelineResponse {
            queues: vec![OpsQueueDepth {
                name: "condensation".to_string(),
                count: queued,
            }],
            recent_condensations,
        })
    }

    async fn ops_audit(&self, params: &HistoryParams) -> ApiResult<OpsAuditResponse> {
        let state = self.state.lock();
        let events = state
            .audit
            .iter()
            .rev()
            .filter(|event| {
                matches(
                    params.namespace.as_deref(),
                    params.session_id.as_deref(),
                    &event.namespace,
                    &event.session_id,
                )
            })
            .take(limit(params.limit, 20))
            .cloned()
            .collect();
        Ok(OpsAuditResponse { events })
    }

    async fn ops_condensations(
        &self,
        params: &HistoryParams,
    ) -> ApiResult<OpsCondensationsResponse> {
        let mut state = self.state.lock();
        state.flush_queue();
        let condensations = state
            .condensations
            .iter()
            .rev()
            .filter(|row| {
                matches(
                    params.namespace.as_deref(),
                    params.session_id.as_deref(),
                    &row.namespace,
                    &row.session_id,
                )
            })
            .take(limit(params.limit, 10))
            .cloned()
            .collect();
        Ok(OpsCondensationsResponse { condensations })
    }

    async fn ops_context_packs(
        &self,
        params: &ContextPackParams,
    ) -> ApiResult<OpsContextPacksResponse> {
        let state = self.state.lock();
        let include_pack = params.include_pack.unwrap_or(false);
        let context_packs = state
            .context_packs
            .iter()
            .rev()
            .filter(|pack| {
                matches(
                    params.namespace.as_deref(),
                    params.session_id.as_deref(),
                    &pack.namespace,
                    &pack.session_id,
                )
            })
            .take(limit(params.limit, 10))
            .map(|pack| OpsContextPack {
                pack: if include_pack {
                    pack.pack.clone()
                } else {
                    Map::new()
                },
                ..pack.clone()
            })
            .collect();
        Ok(OpsContextPacksResponse { context_packs })
    }

    async fn ops_procedural(&self) -> ApiResult<OpsProceduralResponse> {
        Ok(OpsProceduralResponse {
            prompt_registry: object(json!({
                "memos-default": {"description": "Answer from retrieved memory only", "version": 1}
            })),
            tool_registry: object(json!({
                "memos.query": {"endpoint": "/v1/query", "method": "POST"},
                "memos.ingest": {"endpoint": "/v1/ingest", "method": "POST"}
            })),
        })
    }

    async fn dev_seed(&self, params: &DevSeedParams) -> ApiResult<DevSeedResponse> {
        let namespace = params.namespace.clone().unwrap_or_else(|| "Project_X".to_string());
        let Some(session_id) = params.session_id.clone().filter(|sid| !sid.is_empty()) else {
            return Err(bad_request("session_id is required"));
        };
        let mut state = self.state.lock();
        if params.reset.unwrap_or(false) {
            state.turns.retain(|turn| turn.session_id != session_id);
        }
        let mut memory_ids = Vec::new();
        for (idx, line) in PHOENIX_LOG.iter().enumerate() {
            let id = state.next_id("seed");
            state.turns.push(StoredTurn {
                id: id.clone(),
                namespace: namespace.clone(),
                session_id: session_id.clone(),
                role: if idx % 2 == 0 { "user" } else { "assistant" }.to_string(),
                text: (*line).to_string(),
            });
            memory_ids.push(id);
        }
        state.stats.total_memories += memory_ids.len() as u64;
        state.record(
            &namespace,
            &session_id,
            "dev_seed",
            json!({ "inserted": memory_ids.len() }),
        );
        Ok(DevSeedResponse {
            ok: true,
            namespace,
            session_id,
            inserted: memory_ids.len() as u64,
            memory_ids,
        })
    }

    async fn reset_session(
        &self,
        request: &ResetSessionRequest,
    ) -> ApiResult<ResetSessionResponse> {
        if !request.confirm {
            return Err(bad_request("confirm must be true"));
        }
        let mut state = self.state.lock();
        state.flush_queue();
        let in_session =
            |ns: &str, sid: &str| ns == request.namespace && sid == request.session_id;
        let memories = state
            .turns
            .iter()
            .filter(|turn| in_session(&turn.namespace, &turn.session_id))
            .count() as u64;
        let condensations = state
            .condensations
            .iter()
            .filter(|row| in_session(&row.namespace, &row.session_id))
            .count() as u64;
        let audit = if request.clear_audit.unwrap_or(false) {
            state
                .audit
                .iter()
                .filter(|event| in_session(&event.namespace, &event.session_id))
                .count() as u64
        } else {
            0
        };
        let counts = DeletedCounts {
            redis_keys: u64::from(memories > 0),
            memories,
            condensations,
            audit,
        };
        if !request.dry_run {
            state
                .turns
                .retain(|turn| !in_session(&turn.namespace, &turn.session_id));
            state
                .condensations
                .retain(|row| !in_session(&row.namespace, &row.session_id));
            state
                .context_packs
                .retain(|pack| !in_session(&pack.namespace, &pack.session_id));
            if audit > 0 {
                state
                    .audit
                    .retain(|event| !in_session(&event.namespace, &event.session_id));
            }
            state.record(
                &request.namespace,
                &request.session_id,
                "session_reset",
                json!({ "deleted": counts.total() }),
            );
        }
        Ok(ResetSessionResponse {
            ok: true,
            namespace: request.namespace.clone(),
            session_id: request.session_id.clone(),
            reset_at: Utc::now().to_rfc3339(),
            deleted_counts: counts,
        })
    }
}
