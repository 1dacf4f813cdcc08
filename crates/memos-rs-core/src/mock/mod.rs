//! Synthetic data for offline use.
//!
//! The point cloud and heatmap are always fed from generated memories; the
//! [`MockMemosApi`] stands in for the whole backend when no server is
//! reachable.

mod backend;

pub use backend::MockMemosApi;

use crate::types::MemoryNode;
use chrono::{Duration, Utc};
use memos_rs_protocol::MemoryTier;
use rand::Rng;
use std::f64::consts::PI;

/// Memories generated for the cortex view.
pub const MOCK_MEMORY_COUNT: usize = 150;
/// Radius of the generated point cloud.
pub const CLOUD_RADIUS: f64 = 4.0;
/// Only the first points get neighbour links.
pub const MAX_LINKED_POINTS: usize = 50;
pub const LINK_DISTANCE: f64 = 2.5;
pub const HEATMAP_CELLS: usize = 84;

/// Raw conversation log behind the canned retrieval.
pub const PHOENIX_LOG: [&str; 5] = [
    "[TIMESTAMP 2023-10-27T10:00:00] User asked about the \"Project Phoenix\" deadline.",
    "[TIMESTAMP 2023-10-27T10:01:00] System replied deadline is Q4.",
    "[TIMESTAMP 2023-10-27T10:02:00] User mentioned a delay in the frontend module.",
    "[TIMESTAMP 2023-10-27T10:05:00] User requested to move the deadline to Jan 2024.",
    "[TIMESTAMP 2023-10-27T10:06:00] Manager approved request via email reference #442.",
];
pub const PHOENIX_SUMMARY: &str = "User delayed \"Project Phoenix\" deadline to Jan 2024 due to frontend module issues. Change approved by Manager (Ref #442).";
pub const PHOENIX_TOKENS_ORIGINAL: u64 = 145;
pub const PHOENIX_TOKENS_CONDENSED: u64 = 28;

/// Uniform points inside a ball of [`CLOUD_RADIUS`], mostly L2.
pub fn generate_mock_memories<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<MemoryNode> {
    let now = Utc::now();
    (0..count)
        .map(|i| {
            let theta = rng.random::<f64>() * 2.0 * PI;
            let phi = (2.0 * rng.random::<f64>() - 1.0).acos();
            let r = rng.random::<f64>().cbrt() * CLOUD_RADIUS;
            let embedding = [
                r * phi.sin() * theta.cos(),
                r * phi.sin() * theta.sin(),
                r * phi.cos(),
            ];
            let tier_roll = rng.random::<f64>();
            let tier = if tier_roll > 0.8 {
                MemoryTier::L3Entity
            } else if tier_roll < 0.1 {
                MemoryTier::L1Scratchpad
            } else {
                MemoryTier::L2Semantic
            };
            let age_ms = rng.random_range(0..24 * 60 * 60 * 1000);
            MemoryNode {
                id: format!("mem-{i}"),
                content: format!(
                    "Simulated memory content chunk {i} regarding project specifications..."
                ),
                tier,
                importance_score: rng.random::<f64>(),
                embedding,
                timestamp: now - Duration::milliseconds(age_ms),
                namespace: if rng.random::<f64>() > 0.5 {
                    "Project_Alpha".to_string()
                } else {
                    "User_Preferences".to_string()
                },
            }
        })
        .collect()
}

fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Link each of the first [`MAX_LINKED_POINTS`] points to its nearest
/// neighbour closer than [`LINK_DISTANCE`].
pub fn cortex_links(nodes: &[MemoryNode]) -> Vec<(usize, usize)> {
    let mut links = Vec::new();
    for (i, start) in nodes.iter().enumerate().take(MAX_LINKED_POINTS) {
        let mut nearest: Option<(usize, f64)> = None;
        for (j, end) in nodes.iter().enumerate() {
            if i == j {
                continue;
            }
            let dist = distance(&start.embedding, &end.embedding);
            if dist < LINK_DISTANCE && nearest.is_none_or(|(_, best)| dist < best) {
                nearest = Some((j, dist));
            }
        }
        if let Some((j, _)) = nearest {
            links.push((i, j));
        }
    }
    links
}

/// Heat band of a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heat {
    /// Importance above 0.8.
    Hot,
    Warm,
    /// Importance below 0.3.
    Decaying,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatCell {
    pub id: String,
    pub content: String,
    pub importance: f64,
    /// `0.2 + 0.8 * importance`
    pub intensity: f64,
    pub heat: Heat,
}

/// Most recent [`HEATMAP_CELLS`] memories, newest first.
pub fn heatmap_cells(nodes: &[MemoryNode]) -> Vec<HeatCell> {
    let mut sorted: Vec<&MemoryNode> = nodes.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
        .into_iter()
        .take(HEATMAP_CELLS)
        .map(|node| {
            let importance = node.importance_score;
            let heat = if importance > 0.8 {
                Heat::Hot
            } else if importance < 0.3 {
                Heat::Decaying
            } else {
                Heat::Warm
            };
            HeatCell {
                id: node.id.clone(),
                content: node.content.clone(),
                importance,
                intensity: 0.2 + importance * 0.8,
                heat,
            }
        })
        .collect()
}
