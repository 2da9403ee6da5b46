//! Configuration loading from TOML files

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for crawline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub queue: QueueConfig,
    pub store: StoreConfig,
    pub batcher: BatcherSection,
    pub worker: WorkerSection,
    pub http: HttpSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    #[serde(deserialize_with = "deserialize_expanded")]
    pub base_url: String,
    pub collection: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.commoncrawl.org".to_string(),
            collection: "CC-MAIN-2024-30".to_string(),
        }
    }
}

impl CrawlConfig {
    /// Base URL for compressed index shards of the configured collection.
    pub fn index_base_url(&self) -> String {
        format!(
            "{}/cc-index/collections/{}/indexes",
            self.base_url.trim_end_matches('/'),
            self.collection
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    #[serde(deserialize_with = "deserialize_expanded")]
    pub dir: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            dir: "./data/queue".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    #[serde(deserialize_with = "deserialize_expanded")]
    pub markers_dir: String,
    #[serde(deserialize_with = "deserialize_expanded")]
    pub documents_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            markers_dir: "./data/markers".to_string(),
            documents_dir: "./data/documents".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct BatcherSection {
    pub batch_size: usize,
}

impl Default for BatcherSection {
    fn default() -> Self {
        Self { batch_size: 50 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    pub max_length: usize,
    pub stride: usize,
    pub vocab_size: u32,
    pub poll_interval_ms: u64,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            max_length: 512,
            stride: 256,
            vocab_size: 30_522,
            poll_interval_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub read_timeout: u64,
    pub max_retries: u32,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            read_timeout: 30,
            max_retries: 5,
        }
    }
}

/// Deserialize a string that may be an environment variable reference
/// like ${VAR}; an unset variable leaves the literal in place.
fn deserialize_expanded<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(expand_env_var(&s))
}

/// Expand a whole-string ${VAR} reference to its environment value
fn expand_env_var(s: &str) -> String {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        if let Ok(value) = std::env::var(var_name) {
            return value;
        }
        log::warn!("environment variable {var_name} is not set, keeping literal");
    }
    s.to_string()
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./crawline.toml (current directory)
    /// 2. ~/.config/crawline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("crawline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "crawline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.crawl.base_url, "https://data.commoncrawl.org");
        assert_eq!(config.crawl.collection, "CC-MAIN-2024-30");
        assert_eq!(config.batcher.batch_size, 50);
        assert_eq!(config.worker.max_length, 512);
        assert_eq!(config.worker.stride, 256);
        assert_eq!(config.http.max_retries, 5);
    }

    #[test]
    fn index_base_url_layout() {
        let config = CrawlConfig::default();
        assert_eq!(
            config.index_base_url(),
            "https://data.commoncrawl.org/cc-index/collections/CC-MAIN-2024-30/indexes"
        );
    }

    #[test]
    fn expand_env_var_set() {
        std::env::set_var("CRAWLINE_TEST_VAR", "/srv/data");
        assert_eq!(expand_env_var("${CRAWLINE_TEST_VAR}"), "/srv/data");
        std::env::remove_var("CRAWLINE_TEST_VAR");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("./data/queue"), "./data/queue");
    }

    #[test]
    fn expand_env_var_missing_keeps_literal() {
        assert_eq!(
            expand_env_var("${CRAWLINE_NONEXISTENT_VAR_12345}"),
            "${CRAWLINE_NONEXISTENT_VAR_12345}"
        );
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[crawl]
collection = "CC-MAIN-2025-05"

[queue]
dir = "/var/lib/crawline/queue"

[batcher]
batch_size = 10

[worker]
max_length = 128
stride = 64
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.crawl.collection, "CC-MAIN-2025-05");
        assert_eq!(config.crawl.base_url, "https://data.commoncrawl.org");
        assert_eq!(config.queue.dir, "/var/lib/crawline/queue");
        assert_eq!(config.batcher.batch_size, 10);
        assert_eq!(config.worker.max_length, 128);
        assert_eq!(config.worker.stride, 64);
        assert_eq!(config.worker.vocab_size, 30_522);
    }
}
