//! Semantic radar: polar view of retrieval scores.
//!
//! Each retrieved chunk becomes a blip. Its distance from the centre is
//! `max(5, (1 - score) * 100)` percent of the radar radius, so better matches
//! sit closer to the middle; its bearing is a stable hash of the chunk id.

use memos_rs_client::ApiError;
use memos_rs_protocol::{MemoryTier, QueryRequest, QueryResponse, RetrievedChunk};
use serde_json::{Map, Value};

/// Radar radius in display units.
pub const RADAR_HALF_WIDTH: f64 = 250.0;
/// Minimum radius percentage so a perfect match stays off the exact centre.
pub const MIN_RADIUS_PERCENT: f64 = 5.0;
/// Rerank score below which a blip is dimmed.
pub const RERANK_KEEP_THRESHOLD: f64 = 0.6;
/// Raw-minus-rerank gap flagged as a vector false positive.
pub const NOISE_GAP: f64 = 0.3;
/// Degrees the sweep advances per tick.
pub const SWEEP_STEP_DEGREES: u16 = 2;

/// `h = h * 31 + unit` over UTF-16 code units with 32-bit wraparound, then `h % 360`.
pub fn hash_angle(id: &str) -> u16 {
    let mut h: u32 = 0;
    for unit in id.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(u32::from(unit));
    }
    (h % 360) as u16
}

/// Clamp into `[0, 1]`; NaN maps to 0.
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Radius as a percentage of the radar half-width.
pub fn radius_percent(score: f64) -> f64 {
    ((1.0 - score) * 100.0).max(MIN_RADIUS_PERCENT)
}

/// `metadata.rerank_score` when it is a finite number, else `fallback`.
pub fn extract_rerank_score(metadata: &Map<String, Value>, fallback: f64) -> f64 {
    match metadata.get("rerank_score").and_then(Value::as_f64) {
        Some(score) if score.is_finite() => clamp01(score),
        _ => fallback,
    }
}

/// Quality band of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// `>= 0.8`
    Precise,
    /// `>= 0.6`
    Usable,
    Noise,
}

impl Zone {
    pub fn of(score: f64) -> Self {
        if score >= 0.8 {
            Self::Precise
        } else if score >= 0.6 {
            Self::Usable
        } else {
            Self::Noise
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Precise => "precise",
            Self::Usable => "usable",
            Self::Noise => "noise",
        }
    }
}

/// One plotted chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarBlip {
    pub id: String,
    pub content: String,
    pub tier: MemoryTier,
    /// Clamped vector similarity.
    pub raw_score: f64,
    /// Clamped rerank score, or the raw score when the backend sent none.
    pub rerank_score: f64,
    /// Bearing in degrees, `0..360`, 0 at twelve o'clock.
    pub angle: u16,
}

impl RadarBlip {
    pub fn from_chunk(chunk: &RetrievedChunk) -> Self {
        let raw_score = clamp01(chunk.score);
        Self {
            id: chunk.id.clone(),
            content: chunk.text.clone(),
            tier: chunk.tier.clone(),
            raw_score,
            rerank_score: extract_rerank_score(&chunk.metadata, raw_score),
            angle: hash_angle(&chunk.id),
        }
    }

    /// Score plotted in the current mode.
    pub fn score(&self, rerank_enabled: bool) -> f64 {
        if rerank_enabled {
            self.rerank_score
        } else {
            self.raw_score
        }
    }

    pub fn zone(&self, rerank_enabled: bool) -> Zone {
        Zone::of(self.score(rerank_enabled))
    }

    /// Cartesian position relative to the radar centre, in display units.
    /// Positive `y` points down, matching screen coordinates.
    pub fn offset(&self, rerank_enabled: bool) -> (f64, f64) {
        let radius = radius_percent(self.score(rerank_enabled)) / 100.0 * RADAR_HALF_WIDTH;
        let radians = (f64::from(self.angle) - 90.0).to_radians();
        (radius * radians.cos(), radius * radians.sin())
    }

    /// Dimmed because the reranker scored it below the keep threshold.
    pub fn is_filtered(&self, rerank_enabled: bool) -> bool {
        rerank_enabled && self.rerank_score < RERANK_KEEP_THRESHOLD
    }

    /// The reranker demoted this blip sharply.
    pub fn is_noise_filtered(&self, rerank_enabled: bool) -> bool {
        rerank_enabled && self.raw_score - self.rerank_score > NOISE_GAP
    }
}

/// Radar view state.
#[derive(Debug, Clone, Default)]
pub struct RadarState {
    pub query: String,
    pub rerank_enabled: bool,
    pub blips: Vec<RadarBlip>,
    active: Option<usize>,
    pub loading: bool,
    pub error: Option<String>,
    /// Sweep bearing in degrees.
    pub sweep_angle: u16,
}

impl RadarState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query, namespace and session must all be non-blank.
    pub fn can_query(&self, namespace: &str, session_id: &str) -> bool {
        !self.query.trim().is_empty()
            && !namespace.trim().is_empty()
            && !session_id.trim().is_empty()
    }

    /// Mark the query in flight and build its request, or `None` when not allowed.
    pub fn begin_query(
        &mut self,
        namespace: &str,
        session_id: &str,
        top_k: u32,
    ) -> Option<QueryRequest> {
        if self.loading || !self.can_query(namespace, session_id) {
            return None;
        }
        self.loading = true;
        self.error = None;
        Some(QueryRequest {
            namespace: namespace.to_string(),
            session_id: session_id.to_string(),
            query: self.query.trim().to_string(),
            top_k: Some(top_k),
        })
    }

    /// Replace blips with the query result. The first blip becomes active.
    /// On failure the previous blips stay and the error is recorded.
    pub fn finish_query(&mut self, result: Result<QueryResponse, ApiError>) {
        self.loading = false;
        match result {
            Ok(response) => {
                self.blips = response.raw_chunks.iter().map(RadarBlip::from_chunk).collect();
                self.active = if self.blips.is_empty() { None } else { Some(0) };
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
    }

    pub fn toggle_rerank(&mut self) {
        self.rerank_enabled = !self.rerank_enabled;
    }

    pub fn active_blip(&self) -> Option<&RadarBlip> {
        self.active.and_then(|idx| self.blips.get(idx))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn select_next(&mut self) {
        if self.blips.is_empty() {
            return;
        }
        self.active = Some(match self.active {
            Some(idx) => (idx + 1) % self.blips.len(),
            None => 0,
        });
    }

    pub fn select_prev(&mut self) {
        if self.blips.is_empty() {
            return;
        }
        let len = self.blips.len();
        self.active = Some(match self.active {
            Some(idx) => (idx + len - 1) % len,
            None => len - 1,
        });
    }

    /// Advance the sweep.
    pub fn tick(&mut self) {
        self.sweep_angle = (self.sweep_angle + SWEEP_STEP_DEGREES) % 360;
    }

    /// Drop results tied to a previous session.
    pub fn clear(&mut self) {
        self.blips.clear();
        self.active = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn chunk(id: &str, score: f64, metadata: Value) -> RetrievedChunk {
        serde_json::from_value(json!({
            "id": id,
            "tier": "L2 Semantic (Vector DB)",
            "text": format!("text {id}"),
            "score": score,
            "metadata": metadata
        }))
        .expect("chunk")
    }

    #[test]
    fn hash_angle_matches_reference_values() {
        assert_eq!(hash_angle(""), 0);
        // 'a' = 97
        assert_eq!(hash_angle("a"), 97);
        // 97 * 31 + 98 = 3105 -> 3105 % 360 = 225
        assert_eq!(hash_angle("ab"), 225);
        // long ids wrap at 2^32 without panicking
        let angle = hash_angle(&"memory-chunk-".repeat(50));
        assert!(angle < 360);
    }

    #[test]
    fn radius_is_monotonic_and_floored() {
        assert_eq!(radius_percent(1.0), 5.0);
        assert_eq!(radius_percent(0.99), 5.0);
        assert_eq!(radius_percent(0.0), 100.0);
        let mut last = f64::INFINITY;
        for step in 0..=100 {
            let r = radius_percent(f64::from(step) / 100.0);
            assert!(r <= last);
            assert!(r >= MIN_RADIUS_PERCENT);
            last = r;
        }
    }

    #[test]
    fn rerank_score_falls_back_to_raw() {
        let with = RadarBlip::from_chunk(&chunk("a", 0.9, json!({"rerank_score": 0.4})));
        assert_eq!(with.rerank_score, 0.4);
        let without = RadarBlip::from_chunk(&chunk("b", 1.7, json!({"rerank_score": "n/a"})));
        assert_eq!(without.raw_score, 1.0);
        assert_eq!(without.rerank_score, 1.0);
        let clamped = RadarBlip::from_chunk(&chunk("c", 0.5, json!({"rerank_score": -2.0})));
        assert_eq!(clamped.rerank_score, 0.0);
    }

    #[test]
    fn zones_filtering_and_noise() {
        let blip = RadarBlip::from_chunk(&chunk("a", 0.92, json!({"rerank_score": 0.5})));
        assert_eq!(blip.zone(false), Zone::Precise);
        assert_eq!(blip.zone(true), Zone::Noise);
        assert!(!blip.is_filtered(false));
        assert!(blip.is_filtered(true));
        assert!(blip.is_noise_filtered(true));
        assert!(!blip.is_noise_filtered(false));
        assert_eq!(Zone::of(0.6), Zone::Usable);
    }

    #[test]
    fn zero_degree_blip_sits_at_twelve_o_clock() {
        let blip = RadarBlip {
            id: String::new(),
            content: String::new(),
            tier: MemoryTier::L1Scratchpad,
            raw_score: 0.0,
            rerank_score: 0.0,
            angle: 0,
        };
        let (x, y) = blip.offset(false);
        assert!(x.abs() < 1e-9);
        assert!((y + RADAR_HALF_WIDTH).abs() < 1e-9);
    }

    #[test]
    fn query_requires_all_identity_fields() {
        let mut state = RadarState::new();
        assert!(state.begin_query("ns", "s", 12).is_none());
        state.query = "  deadline  ".to_string();
        assert!(state.begin_query(" ", "s", 12).is_none());
        assert!(state.begin_query("ns", "", 12).is_none());

        let request = state.begin_query("ns", "s", 12).expect("request");
        assert_eq!(request.query, "deadline");
        assert_eq!(request.top_k, Some(12));
        assert!(state.loading);
        assert!(state.begin_query("ns", "s", 12).is_none());
    }

    #[test]
    fn finish_query_activates_first_blip_and_keeps_blips_on_error() {
        let mut state = RadarState::new();
        let response: QueryResponse = serde_json::from_value(json!({
            "id": "ret-1",
            "source_tier": "L2 Semantic (Vector DB)",
            "similarity": 0.9,
            "raw_chunks": [
                {"id": "a", "tier": "L2 Semantic (Vector DB)", "text": "A", "score": 0.9},
                {"id": "b", "tier": "L2 Semantic (Vector DB)", "text": "B", "score": 0.3}
            ],
            "condensed_summary": "",
            "token_usage_original": 0,
            "token_usage_condensed": 0
        }))
        .expect("response");
        state.loading = true;
        state.finish_query(Ok(response));
        assert_eq!(state.active_blip().map(|b| b.id.as_str()), Some("a"));
        state.select_prev();
        assert_eq!(state.active_index(), Some(1));
        state.select_next();
        assert_eq!(state.active_index(), Some(0));

        state.finish_query(Err(ApiError::Decode {
            path: "/v1/query".to_string(),
            message: "bad".to_string(),
        }));
        assert_eq!(state.blips.len(), 2);
        assert!(state.error.is_some());
        assert!(!state.loading);
    }

    #[test]
    fn sweep_wraps() {
        let mut state = RadarState::new();
        state.sweep_angle = 358;
        state.tick();
        assert_eq!(state.sweep_angle, 0);
    }
}
