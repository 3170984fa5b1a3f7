//! Runtime configuration for pocket-tools.
//!
//! Configuration is loaded from a JSON file or constructed programmatically.
//! The cache generation name, its manifest and where assets come from all live here.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::cache::manifest::{Manifest, DEFAULT_VERSION};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "pocket-tools", about = "All-in-one Pocket offline tool host")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Offline cache configuration.
    pub cache: CacheConfig,

    /// Where assets are fetched from on install and on cache miss.
    pub upstream: UpstreamConfig,

    /// File holding persisted user preferences (theme).
    pub preferences_path: PathBuf,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8080").
    pub listen: String,

    /// Upstream request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Which registry backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    Disk,
}

/// Offline cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Generation name. Must change whenever the manifest changes.
    pub version: String,

    /// Asset paths cached at install time.
    pub manifest: Manifest,

    /// Registry backend.
    pub storage: StorageKind,

    /// Root directory for the disk backend.
    pub storage_path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            manifest: Manifest::default(),
            storage: StorageKind::Disk,
            storage_path: PathBuf::from("/tmp/pocket-tools/cache"),
        }
    }
}

/// Asset source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream origin (e.g. "https://pocket.example.org"). Takes precedence over `asset_dir`.
    pub origin: Option<String>,

    /// Local directory holding the site's static files.
    pub asset_dir: PathBuf,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: None,
            asset_dir: PathBuf::from("public"),
        }
    }
}

/// Configuration problems found by [`Config::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cache.version must not be empty")]
    EmptyVersion,

    #[error("cache.manifest must list at least one asset")]
    EmptyManifest,

    #[error("cache.manifest entries must be absolute paths: {0:?}")]
    RelativePaths(Vec<String>),
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str::<Config>(&data)?
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.version.trim().is_empty() {
            return Err(ConfigError::EmptyVersion);
        }
        if self.cache.manifest.is_empty() {
            return Err(ConfigError::EmptyManifest);
        }
        let relative = self.cache.manifest.invalid_paths();
        if !relative.is_empty() {
            return Err(ConfigError::RelativePaths(
                relative.into_iter().map(String::from).collect(),
            ));
        }
        Ok(())
    }

    /// Where preferences are persisted, defaulting next to the cache root.
    pub fn preferences_file(&self) -> PathBuf {
        if self.preferences_path.as_os_str().is_empty() {
            self.cache
                .storage_path
                .parent()
                .map(|p| p.join("preferences.json"))
                .unwrap_or_else(|| PathBuf::from("preferences.json"))
        } else {
            self.preferences_path.clone()
        }
    }
}
