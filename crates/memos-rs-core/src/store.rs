//! String key/value persistence for dashboard identity.

use crate::StoreError;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Minimal persisted string map.
pub trait KeyValueStore: Send + Sync {
    /// Read a key.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a key and persist it.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Store that forgets everything on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as a single JSON object file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store, reading existing entries when the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str::<BTreeMap<String, String>>(&contents).map_err(|_| {
                    StoreError::Corrupt {
                        path: path.display().to_string(),
                    }
                })?
            }
        } else {
            BTreeMap::new()
        };
        info!(
            "opened state store (path={}, keys={})",
            path.display(),
            entries.len()
        );
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the backing file atomically.
    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            let body = serde_json::to_string_pretty(entries)?;
            writeln!(file, "{body}")?;
        }
        std::fs::rename(temp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)?;
        debug!("persisted state key (key={}, path={})", key, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trips_across_reopen() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("session.json");

        let store = FileStore::open(&path).expect("open");
        assert_eq!(store.get("memos_namespace"), None);
        store.set("memos_namespace", "Project_X").expect("set");
        store.set("memos_session_id", "abc").expect("set");

        let reopened = FileStore::open(&path).expect("reopen");
        assert_eq!(reopened.get("memos_namespace").as_deref(), Some("Project_X"));
        assert_eq!(reopened.get("memos_session_id").as_deref(), Some("abc"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_rejects_non_string_values() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"memos_namespace": 4}"#).expect("write");

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn empty_file_opens_as_empty_store() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "").expect("write");
        let store = FileStore::open(&path).expect("open");
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryStore::new();
        store.set("k", "1").expect("set");
        store.set("k", "2").expect("set");
        assert_eq!(store.get("k").as_deref(), Some("2"));
    }
}
