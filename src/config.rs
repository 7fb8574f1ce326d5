// src/config.rs
// Runtime configuration. Tunables live in a TOML file (path overridable via
// NEWSWIRE_CONFIG_PATH, defaulting to config/aggregator.toml); secrets come
// from the environment only and never from the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "NEWSWIRE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/aggregator.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub queue: QueueConfig,
    pub newsapi: NewsApiConfig,
    pub nytimes: NyTimesConfig,
    pub guardian: GuardianConfig,
    /// When set, a Prometheus scrape endpoint is exposed for the run.
    pub metrics_addr: Option<SocketAddr>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub workers: usize,
    pub max_attempts: u32,
    pub retry_backoff_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_attempts: 3,
            retry_backoff_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsApiConfig {
    pub endpoint: String,
    pub language: String,
    /// Provider source ids to scope requests to. Chunked into one fetcher
    /// lineage per 20 ids; empty means one unscoped lineage.
    pub source_ids: Vec<String>,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://newsapi.org/v2/top-headlines".to_string(),
            language: "en".to_string(),
            source_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NyTimesConfig {
    pub endpoint: String,
    pub days_to_fetch: i64,
}

impl Default for NyTimesConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.nytimes.com/svc/search/v2/articlesearch.json".to_string(),
            days_to_fetch: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    pub endpoint: String,
    pub days_to_fetch: i64,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://content.guardianapis.com/search".to_string(),
            days_to_fetch: 1,
        }
    }
}

impl AppConfig {
    /// Load from $NEWSWIRE_CONFIG_PATH, then config/aggregator.toml, then
    /// built-in defaults when neither exists.
    pub fn load() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            return Self::from_path(&pb);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::from_path(&default);
        }
        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing config from {}", path.display()))
    }
}

/// Upstream API keys, environment-only.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub newsapi: Option<String>,
    pub nytimes: Option<String>,
    pub guardian: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self {
            newsapi: non_empty_env("NEWSAPI_KEY"),
            nytimes: non_empty_env("NYT_API_KEY"),
            guardian: non_empty_env("GUARDIAN_API_KEY"),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
