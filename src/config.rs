use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_CAT_API_URL: &str = "https://api.thecatapi.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub cat_api: CatApiConfig,

    pub history: HistoryConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// File the settings were read from; `None` when running on defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/catsearch.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatApiConfig {
    pub base_url: String,

    /// Sent as `x-api-key` on every request. An empty key is allowed;
    /// the API rejects the calls later.
    #[serde(skip_serializing)]
    pub api_key: String,

    pub request_timeout_seconds: u64,

    /// Number of images requested per search.
    pub search_limit: u32,
}

impl Default for CatApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CAT_API_URL.to_string(),
            api_key: String::new(),
            request_timeout_seconds: 30,
            search_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Logical collection the search records are written to and read from.
    pub collection: String,

    /// Maximum number of records shown on the history page.
    pub limit: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            collection: "searches".to_string(),
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            cat_api: CatApiConfig::default(),
            history: HistoryConfig::default(),
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
            source: None,
        }
    }
}

impl Config {
    /// Loads the config file (if any) and applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let paths = Self::config_paths();

        for path in paths {
            if path.exists() {
                let mut config = Self::load_from_path(&path)?;
                config.source = Some(path);
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment variables win over the config file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("CAT_API_KEY") {
            self.cat_api.api_key = key;
        }
        if let Some(url) = lookup("CAT_API_URL") {
            self.cat_api.base_url = url;
        }
        if let Some(db) = lookup("DATABASE_URL") {
            self.general.database_path = db;
        }
        if let Some(collection) = lookup("HISTORY_COLLECTION") {
            self.history.collection = collection;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.general.log_level = level;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("catsearch").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".catsearch").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.cat_api.base_url)
            .with_context(|| format!("Invalid cat API URL: {}", self.cat_api.base_url))?;

        if self.cat_api.search_limit == 0 {
            anyhow::bail!("cat_api.search_limit must be > 0");
        }

        if self.history.limit == 0 {
            anyhow::bail!("history.limit must be > 0");
        }

        if self.history.collection.trim().is_empty() {
            anyhow::bail!("history.collection cannot be empty");
        }

        if self.cat_api.api_key.is_empty() {
            warn!("CAT_API_KEY is not set; cat API requests will likely be rejected");
        }

        Ok(())
    }
}
