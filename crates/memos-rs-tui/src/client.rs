//! Backend and session wiring shared by the dashboard and headless commands.

use anyhow::{Context, Result};
use log::{debug, info};
use memos_rs_client::{HttpMemosClient, MemosApi};
use memos_rs_config::DashboardConfig;
use memos_rs_core::{FileStore, KeyValueStore, MemoryStore, MockMemosApi, SessionState};
use std::sync::Arc;

/// Connected backend plus what the header shows for it.
#[derive(Clone)]
pub struct Backend {
    pub api: Arc<dyn MemosApi>,
    /// Set when running against the in-process demo backend.
    pub mock: Option<Arc<MockMemosApi>>,
    pub label: String,
}

impl Backend {
    /// Build the HTTP client, or the demo backend when `ui.mock` is set.
    pub fn connect(config: &DashboardConfig) -> Result<Self> {
        if config.ui.mock {
            info!("using in-process mock backend");
            return Ok(Self::from_mock(Arc::new(MockMemosApi::new())));
        }
        let client = HttpMemosClient::with_timeout(&config.api.base_url, config.api.timeout())
            .context("failed to build HTTP client")?;
        let label = client.base_url().to_string();
        info!("using HTTP backend (base_url={})", label);
        Ok(Self {
            api: Arc::new(client),
            mock: None,
            label,
        })
    }

    pub fn from_mock(mock: Arc<MockMemosApi>) -> Self {
        Self {
            api: mock.clone(),
            mock: Some(mock),
            label: "mock".to_string(),
        }
    }
}

/// Open the persisted namespace/session pair.
///
/// Without a resolvable state path the identity only lives for this process.
pub fn open_session(config: &DashboardConfig) -> Result<SessionState> {
    let store: Arc<dyn KeyValueStore> = match config.resolved_state_path() {
        Some(path) => {
            debug!("opening session store (path={})", path.display());
            Arc::new(
                FileStore::open(&path)
                    .with_context(|| format!("failed to open session store {}", path.display()))?,
            )
        }
        None => Arc::new(MemoryStore::new()),
    };
    SessionState::load(store, &config.session.default_namespace)
        .context("failed to load session state")
}
