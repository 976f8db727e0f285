//! TOML configuration.
//!
//! Every section is optional; omitted keys fall back to the defaults below,
//! which point at the public Hacker News API and a local embedding model.
//!
//! ```toml
//! [source]
//! base_url = "https://hacker-news.firebaseio.com/v0"
//! top_n = 500
//! concurrency = 10
//!
//! [cache]
//! duration_secs = 3600
//!
//! [embedding]
//! provider = "local"
//! model = "all-minilm-l6-v2"
//!
//! [server]
//! bind = "127.0.0.1:5000"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where stories come from and how hard to hit the remote store.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Root of the item store; `topstories.json` and `item/{id}.json` live under it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Prefix for the synthesized discussion link of stories without a URL.
    #[serde(default = "default_discussion_url")]
    pub discussion_url: String,
    /// How many of the top ids are fetched.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Maximum in-flight item requests.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-request timeout.
    #[serde(default = "default_source_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            discussion_url: default_discussion_url(),
            top_n: default_top_n(),
            concurrency: default_concurrency(),
            timeout_secs: default_source_timeout_secs(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "https://hacker-news.firebaseio.com/v0".to_string()
}
fn default_discussion_url() -> String {
    "https://news.ycombinator.com/item?id=".to_string()
}
fn default_top_n() -> usize {
    500
}
fn default_concurrency() -> usize {
    10
}
fn default_source_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Staleness window in seconds.
    #[serde(default = "default_cache_duration_secs")]
    pub duration_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_cache_duration_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

fn default_cache_duration_secs() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Ollama base URL.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            url: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn is_remote(&self) -> bool {
        matches!(self.provider.as_str(), "openai" | "ollama")
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to the built-in defaults.
///
/// Only used for the default config location; an explicitly requested file
/// that is missing goes through [`load_config`] and fails.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!(
            "No config file at {}, using built-in defaults",
            path.display()
        );
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.source.base_url.trim().is_empty() {
        anyhow::bail!("source.base_url must not be empty");
    }
    if config.source.top_n == 0 {
        anyhow::bail!("source.top_n must be >= 1");
    }
    if config.source.concurrency == 0 {
        anyhow::bail!("source.concurrency must be >= 1");
    }
    if config.source.timeout_secs == 0 {
        anyhow::bail!("source.timeout_secs must be >= 1");
    }

    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be >= 1");
    }

    match config.embedding.provider.as_str() {
        "local" | "ollama" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be local, ollama, or openai.",
            other
        ),
    }

    if config.embedding.is_remote() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    Ok(())
}
