//! Memory module for FemtoAgent
//!
//! Persistent structured records keyed by a memory scope (e.g. one record
//! per end user), orthogonal to any single conversation. The run loop loads
//! the record for a scope into the system prompt and, after a successful
//! run, may write back an updated record produced by the model.
//!
//! The store works on raw JSON values; whether a record matches the caller's
//! schema is decided by the agent's memory contract, not here.

mod file;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use file::FileMemory;

/// Pluggable backend for scoped memory records.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Fetch the record for a scope, or `None` if nothing is stored.
    async fn get(&self, scope: &str) -> Result<Option<Value>>;

    /// Upsert the record for a scope.
    async fn put(&self, scope: &str, record: Value) -> Result<()>;

    /// Delete the record for a scope. Returns `true` if one existed.
    async fn delete(&self, scope: &str) -> Result<bool>;

    /// List all stored records as `(scope, record)` pairs, oldest first.
    async fn list(&self) -> Result<Vec<(String, Value)>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// Minimal in-memory store used to exercise the trait object surface.
    struct MapStore(Mutex<HashMap<String, Value>>);

    #[async_trait]
    impl MemoryStore for MapStore {
        async fn get(&self, scope: &str) -> Result<Option<Value>> {
            Ok(self.0.lock().await.get(scope).cloned())
        }

        async fn put(&self, scope: &str, record: Value) -> Result<()> {
            self.0.lock().await.insert(scope.to_string(), record);
            Ok(())
        }

        async fn delete(&self, scope: &str) -> Result<bool> {
            Ok(self.0.lock().await.remove(scope).is_some())
        }

        async fn list(&self) -> Result<Vec<(String, Value)>> {
            Ok(self
                .0
                .lock()
                .await
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_trait_object_roundtrip() {
        let store: Box<dyn MemoryStore> = Box::new(MapStore(Mutex::new(HashMap::new())));

        assert!(store.get("u1").await.unwrap().is_none());
        store.put("u1", json!({"name": "Alice"})).await.unwrap();
        assert_eq!(
            store.get("u1").await.unwrap(),
            Some(json!({"name": "Alice"}))
        );
        assert!(store.delete("u1").await.unwrap());
        assert!(!store.delete("u1").await.unwrap());
    }
}
