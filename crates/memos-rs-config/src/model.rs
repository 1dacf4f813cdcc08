//! Configuration schema for the MemOS dashboard.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Backend address used when no layer sets one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
/// Namespace selected on first launch.
pub const DEFAULT_NAMESPACE: &str = "Project_X";
/// Backoff schedule for the condensation follow-up poll.
pub const DEFAULT_CONDENSATION_BACKOFF_MS: [u64; 6] = [600, 900, 1200, 1600, 2200, 3000];
/// Most attempts a condensation poll may make.
pub const MAX_CONDENSATION_ATTEMPTS: usize = 6;
/// Upper bound the backend accepts for `top_k`.
pub const MAX_TOP_K: u32 = 50;

/// Root config for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Overall request timeout; unset keeps the HTTP library default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Background refresh cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub stats_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub pipeline_interval_ms: u64,
    /// Delays before each condensation follow-up attempt. One attempt per entry.
    #[serde(default = "default_backoff_ms")]
    pub condensation_backoff_ms: Vec<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            stats_interval_ms: default_interval_ms(),
            pipeline_interval_ms: default_interval_ms(),
            condensation_backoff_ms: default_backoff_ms(),
        }
    }
}

impl PollingConfig {
    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    pub fn pipeline_interval(&self) -> Duration {
        Duration::from_millis(self.pipeline_interval_ms)
    }

    pub fn condensation_backoff(&self) -> Vec<Duration> {
        self.condensation_backoff_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }
}

/// Where the namespace/session pair is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session state file; defaults to `~/.memos/session.json`.
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_path: None,
            default_namespace: default_namespace(),
        }
    }
}

/// Retrieval sizes used by the query views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_radar_top_k")]
    pub radar_top_k: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            radar_top_k: default_radar_top_k(),
        }
    }
}

/// Front-end behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub default_view: DashboardView,
    /// Run against the in-process demo backend instead of HTTP.
    #[serde(default)]
    pub mock: bool,
}

/// Top-level dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DashboardView {
    Dashboard,
    Pipeline,
    #[default]
    Radar,
    RagDebugger,
    Audit,
    Cortex,
    ContextPack,
}

impl DashboardView {
    /// All views in navigation order.
    pub const ALL: [DashboardView; 7] = [
        DashboardView::Dashboard,
        DashboardView::Pipeline,
        DashboardView::Radar,
        DashboardView::RagDebugger,
        DashboardView::Audit,
        DashboardView::Cortex,
        DashboardView::ContextPack,
    ];

    /// Config/CLI name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Pipeline => "pipeline",
            Self::Radar => "radar",
            Self::RagDebugger => "rag_debugger",
            Self::Audit => "audit",
            Self::Cortex => "cortex",
            Self::ContextPack => "context_pack",
        }
    }

    /// Tab title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "System Overview",
            Self::Pipeline => "Memory Pipeline",
            Self::Radar => "Semantic Radar",
            Self::RagDebugger => "RAG Debugger",
            Self::Audit => "Audit",
            Self::Cortex => "Cortex",
            Self::ContextPack => "Context Packs",
        }
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DashboardView {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        let alias = match normalized.as_str() {
            "rag" => "rag_debugger",
            "context" | "pack" => "context_pack",
            "overview" => "dashboard",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|view| view.as_str() == alias)
            .ok_or_else(|| format!("unknown view: {value}"))
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_backoff_ms() -> Vec<u64> {
    DEFAULT_CONDENSATION_BACKOFF_MS.to_vec()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_top_k() -> u32 {
    6
}

fn default_radar_top_k() -> u32 {
    12
}
