//! Token store backend configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{parse_var, read_var, VarLookup};
use crate::errors::ConfigError;

/// Where issued refresh tokens and blacklist entries live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreBackend {
    /// Process-local maps; single instance only
    Memory,
    /// Shared Redis store; required for more than one instance
    Redis,
}

impl fmt::Display for TokenStoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStoreBackend::Memory => write!(f, "memory"),
            TokenStoreBackend::Redis => write!(f, "redis"),
        }
    }
}

impl FromStr for TokenStoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(TokenStoreBackend::Memory),
            "redis" => Ok(TokenStoreBackend::Redis),
            _ => Err(format!("Unknown token store backend: {}", s)),
        }
    }
}

/// Token store configuration
#[derive(Debug, Clone, Serialize)]
pub struct CacheConfig {
    /// Selected backend
    pub backend: TokenStoreBackend,

    /// Redis connection URL (only used by the Redis backend)
    pub url: String,

    /// Prefix for every key written to Redis
    pub key_prefix: String,

    /// Connection attempts before giving up at startup
    pub max_retries: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: TokenStoreBackend::Memory,
            url: String::from("redis://localhost:6379"),
            key_prefix: String::from("timewise:auth"),
            max_retries: 3,
        }
    }
}

impl CacheConfig {
    /// Create a Redis-backed configuration
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: TokenStoreBackend::Redis,
            url: url.into(),
            ..Default::default()
        }
    }

    /// Load from `TOKEN_STORE`, `REDIS_URL`, `REDIS_KEY_PREFIX` and `REDIS_MAX_RETRIES`
    pub fn from_vars(lookup: VarLookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            backend: parse_var(lookup, "TOKEN_STORE", defaults.backend)?,
            url: read_var(lookup, "REDIS_URL").unwrap_or(defaults.url),
            key_prefix: read_var(lookup, "REDIS_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            max_retries: parse_var(lookup, "REDIS_MAX_RETRIES", defaults.max_retries)?,
        })
    }
}
