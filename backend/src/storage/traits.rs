//! # Storage Traits
//!
//! The scheduling domain persists whole documents (the schedule, the client
//! list, the recurring rules) under a handful of keys. Every backend only
//! has to implement this key → JSON contract.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Key-value store of JSON documents
#[async_trait]
pub trait JsonStore: Send + Sync {
    /// Read the document stored under `key`.
    ///
    /// An absent key is not an error: it yields [`default_for_key`].
    async fn read(&self, key: &str) -> Result<Value>;

    /// Replace the document stored under `key`.
    ///
    /// `description` is an audit label; only commit-based backends keep it.
    async fn write(&self, key: &str, value: &Value, description: Option<&str>) -> Result<()>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

/// Keys holding list-shaped resources
const LIST_KEYS: &[&str] = &["clients", "recurring-jobs"];

/// Value returned for a key that has never been written: an empty array for
/// list resources, an empty object otherwise.
pub fn default_for_key(key: &str) -> Value {
    if LIST_KEYS.contains(&key) {
        Value::Array(Vec::new())
    } else {
        Value::Object(serde_json::Map::new())
    }
}
