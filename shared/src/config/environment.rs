//! Environment configuration module

use serde::{Deserialize, Serialize};

use super::{read_var, VarLookup};
use crate::errors::ConfigError;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging/test environment
    Staging,
    /// Production environment
    Production,
}

impl Environment {
    /// Check if running in production
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    /// Read `ENVIRONMENT` (or `APP_ENV`), defaulting to development
    pub fn from_vars(lookup: VarLookup<'_>) -> Result<Self, ConfigError> {
        match read_var(lookup, "ENVIRONMENT").or_else(|| read_var(lookup, "APP_ENV")) {
            Some(raw) => raw.parse().map_err(|message| ConfigError::Invalid {
                key: "ENVIRONMENT".to_string(),
                message,
            }),
            None => Ok(Environment::Development),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" | "test" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize)]
pub struct LoggingConfig {
    /// Default filter passed to the logger when `RUST_LOG` is unset
    pub level: String,
}

impl LoggingConfig {
    /// Default level for an environment
    pub fn for_environment(env: Environment) -> Self {
        let level = match env {
            Environment::Development => "debug",
            Environment::Staging | Environment::Production => "info",
        };
        Self {
            level: level.to_string(),
        }
    }

    pub fn from_vars(lookup: VarLookup<'_>, env: Environment) -> Self {
        match read_var(lookup, "LOG_LEVEL") {
            Some(level) => Self { level },
            None => Self::for_environment(env),
        }
    }
}
