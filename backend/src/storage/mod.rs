//! # Storage Module
//!
//! Persistence for the scheduler. The domain only sees the [`JsonStore`]
//! contract; which backend sits behind it is decided once at startup from
//! configuration.
//!
//! ## Backends
//!
//! - **file**: one JSON document per key in a data directory
//! - **git**: the file backend plus a commit per write
//! - **memory**: process-local, used by tests
//!
//! ## Keys
//!
//! | Key              | Document                         |
//! |------------------|----------------------------------|
//! | `schedule`       | date → team → slot               |
//! | `clients`        | list of saved client addresses   |
//! | `recurring-jobs` | list of recurrence rules         |

pub mod file;
pub mod git;
pub mod memory;
pub mod traits;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, StoreKind};

pub use file::FileStore;
pub use git::{GitManager, GitStore};
pub use memory::MemoryStore;
pub use traits::{default_for_key, JsonStore};

pub const SCHEDULE_KEY: &str = "schedule";
pub const CLIENTS_KEY: &str = "clients";
pub const RECURRING_JOBS_KEY: &str = "recurring-jobs";

/// Build the configured backend
pub fn open_store(config: &Config) -> Result<Arc<dyn JsonStore>> {
    let store: Arc<dyn JsonStore> = match config.store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::File => Arc::new(FileStore::new(&config.data_dir)?),
        StoreKind::Git => {
            let git = GitManager::with_author(config.git_author.clone(), config.git_email.clone());
            Arc::new(GitStore::new(&config.data_dir, git)?)
        }
    };
    info!("Using {} store ({})", store.name(), config.data_dir.display());
    Ok(store)
}

/// Read and decode the document under `key`
pub async fn read_document<T: DeserializeOwned>(store: &dyn JsonStore, key: &str) -> Result<T> {
    let value = store.read(key).await?;
    serde_json::from_value(value).with_context(|| format!("decoding '{}' document", key))
}

/// Encode and persist `document` under `key`
pub async fn write_document<T: Serialize>(
    store: &dyn JsonStore,
    key: &str,
    document: &T,
    description: &str,
) -> Result<()> {
    let value = serde_json::to_value(document)
        .with_context(|| format!("encoding '{}' document", key))?;
    store.write(key, &value, Some(description)).await
}
