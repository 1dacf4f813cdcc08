//! System overview: headline counters, throughput series and tier health.

use crate::format::format_thousands;
use log::debug;
use memos_rs_client::ApiResult;
use memos_rs_protocol::OpsStatsResponse;

/// Headline counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemStats {
    pub total_memories: u64,
    pub active_contexts: u64,
    pub token_savings: u64,
    /// Fraction in `[0, 1]`.
    pub compression_ratio: f64,
}

impl SystemStats {
    /// Counters shown before the first poll lands.
    pub const PLACEHOLDER: Self = Self {
        total_memories: 14052,
        active_contexts: 3,
        token_savings: 845200,
        compression_ratio: 0.82,
    };
}

impl Default for SystemStats {
    fn default() -> Self {
        Self::PLACEHOLDER
    }
}

impl From<OpsStatsResponse> for SystemStats {
    fn from(value: OpsStatsResponse) -> Self {
        Self {
            total_memories: value.total_memories,
            active_contexts: value.active_contexts,
            token_savings: value.token_savings,
            compression_ratio: value.compression_ratio,
        }
    }
}

/// One stat card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub unit: Option<&'static str>,
}

/// `0.82` -> `82.0%`
pub fn compression_label(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Polled stats snapshot.
#[derive(Debug, Clone, Default)]
pub struct StatsBoard {
    pub stats: SystemStats,
    pub polls: u64,
}

impl StatsBoard {
    /// Take a fresh snapshot. Failures keep the last values.
    pub fn apply(&mut self, result: ApiResult<OpsStatsResponse>) {
        match result {
            Ok(response) => {
                self.stats = response.into();
                self.polls += 1;
            }
            Err(err) => debug!("stats poll failed (error={})", err),
        }
    }

    pub fn cards(&self) -> [StatCard; 4] {
        let stats = &self.stats;
        [
            StatCard {
                label: "Total Memories",
                value: format_thousands(stats.total_memories),
                unit: None,
            },
            StatCard {
                label: "Active Contexts",
                value: stats.active_contexts.to_string(),
                unit: None,
            },
            StatCard {
                label: "Token Savings",
                value: format_thousands(stats.token_savings),
                unit: Some("tok"),
            },
            StatCard {
                label: "Compression Ratio",
                value: compression_label(stats.compression_ratio),
                unit: None,
            },
        ]
    }
}

/// One sample of the throughput chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputPoint {
    pub label: &'static str,
    /// Memory ingestion.
    pub load: f64,
    /// Token savings.
    pub savings: f64,
}

const fn point(label: &'static str, load: f64, savings: f64) -> ThroughputPoint {
    ThroughputPoint {
        label,
        load,
        savings,
    }
}

/// Fixed day profile for "System Throughput & Token Optimization".
pub const THROUGHPUT: [ThroughputPoint; 7] = [
    point("00:00", 40.0, 24.0),
    point("04:00", 30.0, 13.0),
    point("08:00", 20.0, 58.0),
    point("12:00", 27.0, 39.0),
    point("16:00", 18.0, 48.0),
    point("20:00", 23.0, 38.0),
    point("24:00", 34.0, 43.0),
];

/// Static health bar for one storage tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierHealth {
    pub tier: &'static str,
    pub percent: u16,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub online: bool,
}

pub const TIER_HEALTH: [TierHealth; 3] = [
    TierHealth {
        tier: "L1 Scratchpad (Redis)",
        percent: 12,
        primary: "Usage: 12% (124MB)",
        secondary: "Latency: 2ms",
        online: true,
    },
    TierHealth {
        tier: "L2 Semantic (Vector)",
        percent: 45,
        primary: "Usage: 45% (4.2GB)",
        secondary: "Latency: 85ms",
        online: true,
    },
    TierHealth {
        tier: "L3 Entity Graph (Neo4j)",
        percent: 28,
        primary: "Nodes: 12,403",
        secondary: "Edges: 45,201",
        online: true,
    },
];
