//! Namespace and session identity.
//!
//! Both values are persisted so the dashboard resumes the same conversation
//! across restarts. Changing the namespace always starts a fresh session.

use crate::{KeyValueStore, StoreError};
use log::info;
use std::sync::Arc;
use uuid::Uuid;

/// Persisted key for the active namespace.
pub const NAMESPACE_KEY: &str = "memos_namespace";
/// Persisted key for the active session id.
pub const SESSION_ID_KEY: &str = "memos_session_id";

/// Generate a new random session identifier.
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Active namespace/session pair backed by a [`KeyValueStore`].
#[derive(Clone)]
pub struct SessionState {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
    session_id: String,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("namespace", &self.namespace)
            .field("session_id", &self.session_id)
            .finish()
    }
}

impl SessionState {
    /// Seed state from the store. A missing namespace falls back to
    /// `default_namespace`; a missing session id is generated and persisted.
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        default_namespace: &str,
    ) -> Result<Self, StoreError> {
        let namespace = store
            .get(NAMESPACE_KEY)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default_namespace.trim().to_string());
        let session_id = match store.get(SESSION_ID_KEY).filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => {
                let id = generate_session_id();
                store.set(SESSION_ID_KEY, &id)?;
                id
            }
        };
        info!(
            "session state loaded (namespace={}, session_id={})",
            namespace, session_id
        );
        Ok(Self {
            store,
            namespace,
            session_id,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Switch namespace and rotate the session id.
    ///
    /// Returns `Ok(false)` without touching anything when the trimmed input
    /// is empty.
    pub fn set_namespace(&mut self, namespace: &str) -> Result<bool, StoreError> {
        let namespace = namespace.trim();
        if namespace.is_empty() {
            return Ok(false);
        }
        self.store.set(NAMESPACE_KEY, namespace)?;
        self.namespace = namespace.to_string();
        self.rotate()?;
        info!(
            "namespace changed (namespace={}, session_id={})",
            self.namespace, self.session_id
        );
        Ok(true)
    }

    /// Start a new session in the current namespace.
    pub fn new_session(&mut self) -> Result<&str, StoreError> {
        self.rotate()?;
        info!(
            "session rotated (namespace={}, session_id={})",
            self.namespace, self.session_id
        );
        Ok(&self.session_id)
    }

    fn rotate(&mut self) -> Result<(), StoreError> {
        let mut next = generate_session_id();
        while next == self.session_id {
            next = generate_session_id();
        }
        self.store.set(SESSION_ID_KEY, &next)?;
        self.session_id = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use pretty_assertions::assert_eq;

    fn store() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn load_defaults_namespace_and_persists_generated_session() {
        let store = store();
        let state = SessionState::load(store.clone(), "Project_X").expect("load");
        assert_eq!(state.namespace(), "Project_X");
        assert_eq!(store.get(SESSION_ID_KEY).as_deref(), Some(state.session_id()));
        assert_eq!(store.get(NAMESPACE_KEY), None);
    }

    #[test]
    fn load_restores_persisted_values() {
        let store = store();
        store.set(NAMESPACE_KEY, "Team_B").expect("set");
        store.set(SESSION_ID_KEY, "fixed-session").expect("set");
        let state = SessionState::load(store, "Project_X").expect("load");
        assert_eq!(state.namespace(), "Team_B");
        assert_eq!(state.session_id(), "fixed-session");
    }

    #[test]
    fn set_namespace_trims_persists_and_rotates() {
        let store = store();
        let mut state = SessionState::load(store.clone(), "Project_X").expect("load");
        let before = state.session_id().to_string();

        assert!(state.set_namespace("  Team_B  ").expect("set"));
        assert_eq!(state.namespace(), "Team_B");
        assert_ne!(state.session_id(), before);
        assert_eq!(store.get(NAMESPACE_KEY).as_deref(), Some("Team_B"));
        assert_eq!(store.get(SESSION_ID_KEY).as_deref(), Some(state.session_id()));
    }

    #[test]
    fn same_namespace_still_rotates_session() {
        let mut state = SessionState::load(store(), "Project_X").expect("load");
        let before = state.session_id().to_string();
        assert!(state.set_namespace("Project_X").expect("set"));
        assert_ne!(state.session_id(), before);
    }

    #[test]
    fn blank_namespace_is_a_no_op() {
        let store = store();
        let mut state = SessionState::load(store.clone(), "Project_X").expect("load");
        let before = state.session_id().to_string();

        for input in ["", "   ", "\t\n"] {
            assert!(!state.set_namespace(input).expect("set"));
        }
        assert_eq!(state.namespace(), "Project_X");
        assert_eq!(state.session_id(), before);
        assert_eq!(store.get(NAMESPACE_KEY), None);
    }

    #[test]
    fn new_session_keeps_namespace() {
        let mut state = SessionState::load(store(), "Project_X").expect("load");
        let before = state.session_id().to_string();
        let next = state.new_session().expect("rotate").to_string();
        assert_ne!(next, before);
        assert_eq!(state.namespace(), "Project_X");
    }
}
