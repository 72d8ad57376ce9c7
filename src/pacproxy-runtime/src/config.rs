//! Runtime configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{PacError, Result};

/// Configuration for the PAC runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacConfig {
    /// Upper bound for a single resolution or interface enumeration, in milliseconds.
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,

    /// Maximum number of backend lookups running at the same time.
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,

    /// Reorder resolution results so IPv4 addresses come first.
    #[serde(default = "default_true")]
    pub prefer_ipv4: bool,

    /// Value returned by `getClientVersion()`.
    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// DNS response cache in front of the resolver backend.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// DNS response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether the cache is enabled.
    #[serde(default)]
    pub enabled: bool,

    /// Freshness of a cached answer, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum number of cached hosts.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_resolve_timeout_ms() -> u64 {
    2_000
}

fn default_max_concurrent_lookups() -> usize {
    16
}

fn default_client_version() -> String {
    "1.0".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_cache_capacity() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

impl Default for PacConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_ms: default_resolve_timeout_ms(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
            prefer_ipv4: true,
            client_version: default_client_version(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: default_cache_ttl_secs(),
            capacity: default_cache_capacity(),
        }
    }
}

impl PacConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for configuration.
    pub fn builder() -> PacConfigBuilder {
        PacConfigBuilder::new()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| PacError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PacError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Reject settings the resolver cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.resolve_timeout_ms == 0 {
            return Err(PacError::Config(
                "resolve_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_lookups == 0 {
            return Err(PacError::Config(
                "max_concurrent_lookups must be greater than zero".to_string(),
            ));
        }
        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(PacError::Config(
                "cache.ttl_secs must be greater than zero when the cache is enabled".to_string(),
            ));
        }
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(PacError::Config(
                "cache.capacity must be greater than zero when the cache is enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolution timeout as a `Duration`.
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }
}

impl CacheConfig {
    /// Cache freshness as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Builder for PacConfig.
#[derive(Debug, Default)]
pub struct PacConfigBuilder {
    config: PacConfig,
}

impl PacConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: PacConfig::new(),
        }
    }

    /// Set the resolution timeout.
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.config.resolve_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the lookup concurrency limit.
    pub fn max_concurrent_lookups(mut self, limit: usize) -> Self {
        self.config.max_concurrent_lookups = limit;
        self
    }

    /// Set IPv4-first ordering.
    pub fn prefer_ipv4(mut self, prefer: bool) -> Self {
        self.config.prefer_ipv4 = prefer;
        self
    }

    /// Set the `getClientVersion()` value.
    pub fn client_version(mut self, version: impl Into<String>) -> Self {
        self.config.client_version = version.into();
        self
    }

    /// Enable the DNS cache with the given freshness, in whole seconds.
    ///
    /// Sub-second values truncate to zero, which `validate` rejects.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache.enabled = true;
        self.config.cache.ttl_secs = ttl.as_secs();
        self
    }

    /// Set the DNS cache capacity.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache.capacity = capacity;
        self
    }

    /// Build the config.
    pub fn build(self) -> PacConfig {
        self.config
    }
}
