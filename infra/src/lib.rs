//! # Infrastructure Layer
//!
//! Concrete implementations of the storage interfaces defined in `tw_core`:
//!
//! - **Cache**: Redis client with connection retry, and the Redis-backed
//!   token store shared by every API instance
//! - **Identity**: bcrypt-backed identity directory loaded from a TOML seed

// Re-export core types for convenience
pub use tw_core::errors::*;

/// Cache module - Redis client and token store
pub mod cache;

/// Identity module - user directory implementations
pub mod identity;

pub use cache::{RedisClient, RedisTokenStore};
pub use identity::InMemoryIdentityDirectory;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Stored value could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Identity seed file could not be parsed
    #[error("Seed file error: {0}")]
    Seed(#[from] toml::de::Error),

    /// Password hashing or verification error
    #[error("Password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            InfrastructureError::Serialization(_) | InfrastructureError::Hash(_) => {
                StoreError::Corrupt {
                    message: err.to_string(),
                }
                .into()
            }
            _ => StoreError::Backend {
                message: err.to_string(),
            }
            .into(),
        }
    }
}
