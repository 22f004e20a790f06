//! File-backed memory store.
//!
//! Persists all records in a single JSON file: load-all on open, save-all on
//! every write. Suits the intended scale (one small record per scope); a
//! heavier backend can implement [`MemoryStore`] against a database without
//! touching the run loop.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{AgentError, Result};

use super::MemoryStore;

/// A stored record with bookkeeping timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Memory store persisted as a single JSON file.
pub struct FileMemory {
    storage_path: PathBuf,
    entries: Mutex<HashMap<String, StoredRecord>>,
}

impl std::fmt::Debug for FileMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMemory")
            .field("storage_path", &self.storage_path)
            .finish()
    }
}

impl FileMemory {
    /// Open (or create) a memory store at the given path. Parent directories
    /// are created if missing.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = Self::load(&path)?;
        Ok(Self {
            storage_path: path,
            entries: Mutex::new(entries),
        })
    }

    fn load(path: &Path) -> Result<HashMap<String, StoredRecord>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            AgentError::Memory(format!(
                "corrupt memory file {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn save(&self, entries: &HashMap<String, StoredRecord>) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.storage_path, content)?;
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for FileMemory {
    async fn get(&self, scope: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(scope).map(|r| r.data.clone()))
    }

    async fn put(&self, scope: &str, record: Value) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let now = Utc::now();
        entries
            .entry(scope.to_string())
            .and_modify(|existing| {
                existing.data = record.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| StoredRecord {
                data: record,
                created_at: now,
                updated_at: now,
            });
        self.save(&entries)
    }

    async fn delete(&self, scope: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        let removed = entries.remove(scope).is_some();
        if removed {
            self.save(&entries)?;
        }
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<(String, Value)>> {
        let entries = self.entries.lock().await;
        let mut records: Vec<(&String, &StoredRecord)> = entries.iter().collect();
        records.sort_by_key(|(_, r)| r.created_at);
        Ok(records
            .into_iter()
            .map(|(scope, r)| (scope.clone(), r.data.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> FileMemory {
        FileMemory::with_path(dir.path().join("memory.json")).unwrap()
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.get("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store
            .put("u1", json!({"name": "Alice", "language": "fr"}))
            .await
            .unwrap();

        let record = store.get("u1").await.unwrap().unwrap();
        assert_eq!(record["name"], "Alice");
        assert_eq!(record["language"], "fr");
    }

    #[tokio::test]
    async fn test_put_upserts() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store.put("u1", json!({"name": "Alice"})).await.unwrap();
        store.put("u1", json!({"name": "Alicia"})).await.unwrap();

        let record = store.get("u1").await.unwrap().unwrap();
        assert_eq!(record["name"], "Alicia");
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memory.json");

        {
            let store = FileMemory::with_path(&path).unwrap();
            store.put("u1", json!({"name": "Alice"})).await.unwrap();
        }

        let reopened = FileMemory::with_path(&path).unwrap();
        let record = reopened.get("u1").await.unwrap().unwrap();
        assert_eq!(record["name"], "Alice");
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store.put("u1", json!({})).await.unwrap();
        assert!(store.delete("u1").await.unwrap());
        assert!(!store.delete("u1").await.unwrap());
        assert!(store.get("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_ordered_by_creation() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store.put("b", json!({"n": 1})).await.unwrap();
        store.put("a", json!({"n": 2})).await.unwrap();
        // Updating the first entry must not reorder it.
        store.put("b", json!({"n": 3})).await.unwrap();

        let scopes: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|(scope, _)| scope)
            .collect();
        assert_eq!(scopes, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = FileMemory::with_path(&path).unwrap_err();
        assert!(err.to_string().contains("corrupt memory file"));
    }
}
