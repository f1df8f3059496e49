//! # File Store
//!
//! One pretty-printed JSON file per key inside a data directory:
//!
//! ```text
//! data/
//! ├── schedule.json
//! ├── clients.json
//! └── recurring-jobs.json
//! ```
//!
//! Values are encoded exactly once. Writes go to a temp file that is then
//! renamed over the target.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::traits::{default_for_key, JsonStore};

#[derive(Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `directory`
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        if !directory.exists() {
            fs::create_dir_all(&directory)
                .with_context(|| format!("creating data directory {}", directory.display()))?;
            info!("Created data directory {}", directory.display());
        }
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name backing `key`
    pub fn file_name(key: &str) -> Result<String> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(anyhow!("invalid store key '{}'", key));
        }
        Ok(format!("{}.json", key))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        Ok(self.directory.join(Self::file_name(key)?))
    }
}

#[async_trait]
impl JsonStore for FileStore {
    async fn read(&self, key: &str) -> Result<Value> {
        let path = self.path_for(key)?;
        if !path.exists() {
            debug!("No file for key '{}', using default", key);
            return Ok(default_for_key(key));
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(default_for_key(key));
        }
        let value = serde_json::from_str(&content)
            .with_context(|| format!("malformed JSON in {}", path.display()))?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: &Value, description: Option<&str>) -> Result<()> {
        let path = self.path_for(key)?;
        let content = serde_json::to_string_pretty(value)?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("writing {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("replacing {}", path.display()))?;

        debug!(
            "Saved '{}' to {:?} ({})",
            key,
            path,
            description.unwrap_or("no description")
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
