//! Process configuration, read from the environment.
//!
//! A `.env` file in the working directory is loaded first when present.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Which persistence backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    File,
    Git,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StoreKind::File),
            "git" => Ok(StoreKind::Git),
            "memory" => Ok(StoreKind::Memory),
            other => Err(anyhow!(
                "unknown store '{}', expected one of: file, git, memory",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store: StoreKind,
    pub data_dir: PathBuf,
    pub cors_origin: String,
    /// Days in the rolling window served when no range is requested
    pub window_days: u32,
    pub git_author: String,
    pub git_email: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            store: StoreKind::File,
            data_dir: PathBuf::from("./data"),
            cors_origin: "http://localhost:8080".to_string(),
            window_days: 7,
            git_author: "Cleaning Scheduler".to_string(),
            git_email: "scheduler@localhost".to_string(),
        }
    }
}

/// Load `.env` if present
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Build from `SCHEDULER_*` variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_opt)
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let bind_addr = match lookup("SCHEDULER_BIND_ADDR") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("SCHEDULER_BIND_ADDR '{}' is not an address", raw))?,
            None => defaults.bind_addr,
        };

        let store = match lookup("SCHEDULER_STORE") {
            Some(raw) => raw.parse()?,
            None => defaults.store,
        };

        let window_days = match lookup("SCHEDULER_WINDOW_DAYS") {
            Some(raw) => {
                let days: u32 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("SCHEDULER_WINDOW_DAYS '{}' is not a number", raw))?;
                if days == 0 {
                    return Err(anyhow!("SCHEDULER_WINDOW_DAYS must be at least 1"));
                }
                days
            }
            None => defaults.window_days,
        };

        Ok(Self {
            bind_addr,
            store,
            data_dir: lookup("SCHEDULER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            cors_origin: lookup("SCHEDULER_CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            window_days,
            git_author: lookup("SCHEDULER_GIT_AUTHOR").unwrap_or(defaults.git_author),
            git_email: lookup("SCHEDULER_GIT_EMAIL").unwrap_or(defaults.git_email),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.store, StoreKind::File);
        assert_eq!(config.window_days, 7);
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SCHEDULER_STORE", "Git"),
            ("SCHEDULER_DATA_DIR", "/tmp/schedule"),
            ("SCHEDULER_WINDOW_DAYS", "14"),
            ("SCHEDULER_BIND_ADDR", "0.0.0.0:8000"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreKind::Git);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/schedule"));
        assert_eq!(config.window_days, 14);
        assert_eq!(config.bind_addr.port(), 8000);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config_from(&[("SCHEDULER_STORE", "redis")]).is_err());
        assert!(config_from(&[("SCHEDULER_WINDOW_DAYS", "0")]).is_err());
        assert!(config_from(&[("SCHEDULER_WINDOW_DAYS", "week")]).is_err());
        assert!(config_from(&[("SCHEDULER_BIND_ADDR", "localhost")]).is_err());
    }
}
