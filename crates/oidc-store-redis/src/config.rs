//! Redis backend configuration.

use serde::{Deserialize, Serialize};

/// Redis store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Connection wait timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Prefix applied to every key, so the store can share a Redis
    /// instance with unrelated data.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Upper bound on grant member-list length. When set, each upsert trims
    /// the list to its newest N entries; entries trimmed away are no longer
    /// reachable by revocation. Default: unbounded (the upstream adapter's
    /// behavior).
    #[serde(default)]
    pub max_grant_members: Option<usize>,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_pool_size() -> usize {
    10
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_key_prefix() -> String {
    "oidc:".to_string()
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_pool_size(),
            timeout_ms: default_timeout_ms(),
            key_prefix: default_key_prefix(),
            max_grant_members: None,
        }
    }
}

impl RedisStoreConfig {
    /// Validates field constraints.
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("redis.url must not be empty".into());
        }
        if self.pool_size == 0 {
            return Err("redis.pool_size must be > 0".into());
        }
        if self.max_grant_members == Some(0) {
            return Err("redis.max_grant_members must be > 0 when set".into());
        }
        Ok(())
    }
}
