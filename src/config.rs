//! Client configuration
//!
//! [`ClientConfig`] replaces any process-wide defaults: everything the client
//! needs (API root and which cache tiers to enable) is passed in explicitly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cache::{FileCache, DEFAULT_KEY_PREFIX, DEFAULT_REDIS_PORT};
use crate::http::DEFAULT_BASE_URL;

/// Directory used by the file cache when none is configured
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Connection settings for the Redis cache tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryServiceConfig {
    /// Redis host name or address
    pub host: String,
    /// Redis port
    pub port: u16,
    /// Prefix for every key the client writes
    pub key_prefix: String,
}

impl MemoryServiceConfig {
    /// Settings for `host` with the default port and prefix
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }
}

impl Default for MemoryServiceConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_REDIS_PORT,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

/// Options for constructing a [`RatingClient`](crate::RatingClient)
///
/// Both cache tiers are independent; either, both or neither may be enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the rating API
    pub base_url: String,
    /// Enables the Redis cache tier when set
    pub memory_service: Option<MemoryServiceConfig>,
    /// Enables the file cache tier
    pub file_cache: bool,
    /// Directory for the file cache
    pub cache_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            memory_service: None,
            file_cache: false,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

impl ClientConfig {
    /// Overrides the API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Enables the Redis tier at `host` on the default port
    pub fn with_memory_service_host(mut self, host: impl Into<String>) -> Self {
        self.memory_service = Some(MemoryServiceConfig::new(host));
        self
    }

    /// Enables the Redis tier with full settings
    pub fn with_memory_service(mut self, memory_service: MemoryServiceConfig) -> Self {
        self.memory_service = Some(memory_service);
        self
    }

    /// Enables or disables the file tier
    pub fn with_file_cache(mut self, enabled: bool) -> Self {
        self.file_cache = enabled;
        self
    }

    /// Sets the file cache directory
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Points the file cache at the platform cache directory
    ///
    /// Uses `~/.cache/chgk-rating/` on Linux. Leaves the directory unchanged
    /// if it cannot be determined (e.g., no home directory).
    pub fn with_platform_cache_dir(mut self) -> Self {
        if let Some(cache) = FileCache::new() {
            self.cache_dir = cache.cache_dir().to_path_buf();
        }
        self
    }

    /// Whether any cache tier is enabled
    pub fn caching_enabled(&self) -> bool {
        self.file_cache || self.memory_service.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_cache() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://rating.chgk.info/api");
        assert!(!config.caching_enabled());
        assert_eq!(config.cache_dir, PathBuf::from("cache"));
    }

    #[test]
    fn test_memory_service_host_uses_defaults() {
        let config = ClientConfig::default().with_memory_service_host("redis.local");
        let memory = config.memory_service.clone().expect("Redis should be enabled");
        assert_eq!(memory.host, "redis.local");
        assert_eq!(memory.port, 6379);
        assert_eq!(memory.key_prefix, "chgk_rating:");
        assert!(config.caching_enabled());
    }

    #[test]
    fn test_builder_combines_both_tiers() {
        let config = ClientConfig::default()
            .with_base_url("http://localhost:9000/api")
            .with_file_cache(true)
            .with_cache_dir("/tmp/chgk")
            .with_memory_service(MemoryServiceConfig {
                port: 6380,
                ..MemoryServiceConfig::new("127.0.0.1")
            });

        assert_eq!(config.base_url, "http://localhost:9000/api");
        assert!(config.file_cache);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/chgk"));
        assert_eq!(config.memory_service.map(|m| m.port), Some(6380));
    }

    #[test]
    fn test_platform_cache_dir_contains_project_name() {
        let config = ClientConfig::default().with_platform_cache_dir();
        // Stays at the default when there is no home directory (e.g. in CI)
        if config.cache_dir != PathBuf::from(DEFAULT_CACHE_DIR) {
            assert!(config.cache_dir.to_string_lossy().contains("chgk-rating"));
        }
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"file_cache": true, "memory_service": {"host": "redis"}}"#)
                .expect("Config should deserialize");

        assert!(config.file_cache);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        let memory = config.memory_service.expect("Redis should be enabled");
        assert_eq!(memory.host, "redis");
        assert_eq!(memory.port, DEFAULT_REDIS_PORT);
    }
}
