// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A persistent key-value map scoped per application identifier (§4.6,
//! §6 `storage.get/set/remove`). One JSON document per app id, committed
//! with the teacher's write-temp-then-rename discipline (see
//! `oj-storage/src/snapshot.rs::Snapshot::save`) so a crash mid-write
//! never corrupts the previous committed state.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::StorageError;

pub struct KvStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl KvStore {
    /// Open (or create) the store for a given application id under
    /// `root`. Missing or corrupt files start from an empty map rather
    /// than failing — storage is best-effort persistence, not a durability
    /// guarantee the runtime depends on to start up.
    pub fn open(root: &Path, app_id: &str) -> Result<Self, StorageError> {
        fs::create_dir_all(root)?;
        let path = root.join(format!("{app_id}.json"));
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let decoded: HashMap<String, String> = serde_json::from_str(&raw)
                .map_err(|e| StorageError::Corrupt(e.to_string()))?;
            decoded
                .into_iter()
                .map(|(k, v)| {
                    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, v)
                        .unwrap_or_default();
                    (k, bytes)
                })
                .collect()
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        {
            let mut entries = self.entries.lock();
            entries.insert(key.to_string(), value);
        }
        self.persist()
    }

    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let removed = {
            let mut entries = self.entries.lock();
            entries.remove(key).is_some()
        };
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&self) -> Result<(), StorageError> {
        let snapshot: HashMap<String, String> = self
            .entries
            .lock()
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, v),
                )
            })
            .collect();
        let tmp_path = self.path.with_extension("tmp");
        let raw = serde_json::to_string(&snapshot).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        fs::write(&tmp_path, raw)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = KvStore::open(dir.path(), "app1").expect("open");
        store.set("k", b"v".to_vec()).expect("set");
        assert_eq!(store.get("k"), Some(b"v".to_vec()));
    }

    #[test]
    fn missing_key_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = KvStore::open(dir.path(), "app1").expect("open");
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn remove_reports_whether_key_existed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = KvStore::open(dir.path(), "app1").expect("open");
        store.set("k", b"v".to_vec()).expect("set");
        assert!(store.remove("k").expect("remove"));
        assert!(!store.remove("k").expect("remove"));
    }

    #[test]
    fn reopening_store_restores_persisted_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let store = KvStore::open(dir.path(), "app1").expect("open");
            store.set("k", b"persisted".to_vec()).expect("set");
        }
        let reopened = KvStore::open(dir.path(), "app1").expect("reopen");
        assert_eq!(reopened.get("k"), Some(b"persisted".to_vec()));
    }

    #[test]
    fn different_app_ids_are_isolated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = KvStore::open(dir.path(), "app-a").expect("open a");
        let b = KvStore::open(dir.path(), "app-b").expect("open b");
        a.set("k", b"a-value".to_vec()).expect("set");
        assert_eq!(b.get("k"), None);
    }
}
