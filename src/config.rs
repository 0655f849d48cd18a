use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Time-related constants
// =============================================================================

/// Default cache entry lifetime in milliseconds (1 hour)
pub const DEFAULT_CACHE_TTL_MS: i64 = 60 * 60 * 1000;

/// Minimum spacing between two provider requests in milliseconds
pub const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 100;

// =============================================================================
// Provider constants
// =============================================================================

/// Remaining request budget below which requests wait for the budget reset
pub const DEFAULT_RATE_LIMIT_LOW_WATERMARK: u32 = 10;

/// Request budget assumed until the provider reports one
pub const DEFAULT_RATE_LIMIT: u32 = 300;

/// Base URL of the Modrinth v2 API
pub const DEFAULT_API_BASE_URL: &str = "https://api.modrinth.com/v2";

/// Base URL for human-facing mod pages
pub const SITE_MOD_URL: &str = "https://modrinth.com/mod";

pub const USER_AGENT: &str = concat!("mod-checker/", env!("CARGO_PKG_VERSION"));

/// Checker configuration, read from an optional JSON file
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckerConfig {
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub api: ApiConfig,
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Cache entry lifetime in milliseconds
    pub ttl: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL_MS,
        }
    }
}

/// Request throttling configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Minimum spacing between requests in milliseconds
    pub min_request_interval: u64,
    pub low_watermark: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_request_interval: DEFAULT_MIN_REQUEST_INTERVAL_MS,
            low_watermark: DEFAULT_RATE_LIMIT_LOW_WATERMARK,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl CheckerConfig {
    /// Load configuration from a JSON file, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns the path to the data directory for mod-checker.
/// Uses $XDG_DATA_HOME/mod-checker if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/mod-checker,
/// or ./mod-checker if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the cache database file.
pub fn db_path() -> PathBuf {
    data_dir().join("cache.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("mod-checker.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("mod-checker")
}
