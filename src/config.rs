use crate::constants::{
    DEFAULT_CACHE_TTL_SECONDS, DEFAULT_DUPLICATE_WINDOW, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_BASE_DELAY_MS,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_database_path() -> String {
    crate::constants::DATABASE_PATH.to_string_lossy().to_string()
}

fn default_pool_size() -> u32 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            pool_size: default_pool_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: i64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl_seconds() -> i64 {
    DEFAULT_CACHE_TTL_SECONDS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateConfig {
    /// Years scanned on each side of the upload year. Callers may override
    /// per call; this is only the default.
    #[serde(default = "default_window_years")]
    pub window_years: u32,
}

fn default_window_years() -> u32 {
    DEFAULT_DUPLICATE_WINDOW
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            window_years: default_window_years(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub duplicates: DuplicateConfig,
}

pub fn load_config(config_path: &Path) -> Config {
    if !config_path.exists() {
        return Config::default();
    }

    match fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

pub fn save_default_config(config_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).map_err(|e| std::io::Error::other(e.to_string()))?;
    fs::write(config_path, yaml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.duplicates.window_years, 1);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("retry:\n  max_attempts: 5\n").unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 50);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config(Path::new("/nonexistent/config.yaml"));
        assert_eq!(config.storage.pool_size, 10);
    }
}
