//! In-process store, used by tests and by `SCHEDULER_STORE=memory`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::traits::{default_for_key, JsonStore};

#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<Mutex<HashMap<String, Value>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes since creation
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Seed a document without counting it as a write
    pub fn seed(&self, key: &str, value: Value) -> Result<()> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        documents.insert(key.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl JsonStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Value> {
        let documents = self
            .documents
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(documents
            .get(key)
            .cloned()
            .unwrap_or_else(|| default_for_key(key)))
    }

    async fn write(&self, key: &str, value: &Value, description: Option<&str>) -> Result<()> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        documents.insert(key.to_string(), value.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!("memory store: wrote '{}' ({})", key, description.unwrap_or("-"));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_defaults_and_write_count() {
        let store = MemoryStore::new();
        assert_eq!(store.read("clients").await.unwrap(), json!([]));
        assert_eq!(store.read("schedule").await.unwrap(), json!({}));

        store.write("clients", &json!([{"id": "c1"}]), None).await.unwrap();
        assert_eq!(store.read("clients").await.unwrap(), json!([{"id": "c1"}]));
        assert_eq!(store.write_count(), 1);

        store.seed("schedule", json!({"a": 1})).unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.read("schedule").await.unwrap(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_poisoned_lock_fails_seed_and_io() {
        let store = MemoryStore::new();
        let holder = store.clone();
        let poisoned = std::thread::spawn(move || {
            let _documents = holder.documents.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(poisoned.is_err());

        let err = store.seed("schedule", json!({})).unwrap_err();
        assert!(err.to_string().contains("poisoned"));
        assert!(store.read("schedule").await.is_err());
        assert!(store.write("schedule", &json!({}), None).await.is_err());
        assert_eq!(store.write_count(), 0);
    }
}
