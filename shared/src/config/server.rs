//! HTTP server configuration

use serde::Serialize;

use super::{parse_var, read_var, VarLookup};
use crate::errors::ConfigError;

/// HTTP server configuration
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Worker threads (0 = number of CPU cores)
    pub workers: usize,

    /// Origins allowed by CORS outside development
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 8080,
            workers: 0,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn from_vars(lookup: VarLookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let allowed_origins = read_var(lookup, "ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: read_var(lookup, "SERVER_HOST").unwrap_or(defaults.host),
            port: parse_var(lookup, "SERVER_PORT", defaults.port)?,
            workers: parse_var(lookup, "SERVER_WORKERS", defaults.workers)?,
            allowed_origins,
        })
    }
}
