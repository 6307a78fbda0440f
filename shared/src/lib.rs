//! Shared configuration and common types for the TimeWise server
//!
//! This crate provides functionality used across all server crates:
//! - Configuration loaded from the environment
//! - Error response structure and configuration errors
//! - Lifetime string parsing (`"24h"`, `"15m"`, ...)
//! - Health check response types

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CacheConfig, CleanupConfig, Environment, JwtConfig, LoggingConfig,
    ServerConfig, TokenStoreBackend,
};
pub use errors::{error_codes, ConfigError, ErrorResponse};
pub use types::{HealthResponse, HealthStatus};
pub use utils::lifetime::parse_lifetime;
