//! Configuration module with sub-modules per concern
//!
//! - `auth` - token signing, lifetimes, cleanup cadence, identity seed
//! - `cache` - token store backend selection and Redis settings
//! - `environment` - environment detection and logging
//! - `server` - HTTP server and CORS settings
//!
//! Every loader reads through a lookup function so tests can feed variables
//! without touching the process environment. `from_env` is the production
//! entry point.

pub mod auth;
pub mod cache;
pub mod environment;
pub mod server;

use std::fmt::Display;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::ConfigError;

pub use auth::{AuthConfig, CleanupConfig, JwtConfig};
pub use cache::{CacheConfig, TokenStoreBackend};
pub use environment::{Environment, LoggingConfig};
pub use server::ServerConfig;

/// Variable lookup used by every `from_vars` loader
pub type VarLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from process environment variables
    ///
    /// Fails when a required secret is missing rather than falling back to a
    /// built-in value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_vars(lookup: VarLookup<'_>) -> Result<Self, ConfigError> {
        let environment = Environment::from_vars(lookup)?;

        Ok(Self {
            environment,
            server: ServerConfig::from_vars(lookup)?,
            auth: AuthConfig::from_vars(lookup)?,
            cache: CacheConfig::from_vars(lookup)?,
            logging: LoggingConfig::from_vars(lookup, environment),
        })
    }
}

/// Reads a variable, treating blank values as unset
pub(crate) fn read_var(lookup: VarLookup<'_>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Reads and parses a variable, falling back to `default` when unset
pub(crate) fn parse_var<T>(lookup: VarLookup<'_>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match read_var(lookup, key) {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_requires_secret() {
        let lookup = lookup_from(&[("SERVER_PORT", "9000")]);
        let err = AppConfig::from_vars(&lookup).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref key } if key == "JWT_SECRET"));
    }

    #[test]
    fn test_app_config_loads_with_secret() {
        let lookup = lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("SERVER_PORT", "9000"),
            ("ENVIRONMENT", "production"),
        ]);
        let config = AppConfig::from_vars(&lookup).unwrap();

        assert_eq!(config.server.port, 9000);
        assert!(config.environment.is_production());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.cache.backend, TokenStoreBackend::Memory);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let lookup = lookup_from(&[("JWT_SECRET", "   ")]);
        assert!(matches!(
            AppConfig::from_vars(&lookup),
            Err(ConfigError::Missing { .. })
        ));
    }
}
