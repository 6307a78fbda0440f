//! Cache module for Redis-backed token storage
//!
//! Connection retry logic lives in [`RedisClient`]; [`RedisTokenStore`]
//! maps the token store operations onto Redis keys with TTLs.

pub mod redis_client;
pub mod redis_token_store;

#[cfg(test)]
mod tests;

pub use redis_client::RedisClient;
pub use redis_token_store::RedisTokenStore;

// Re-export commonly used types
pub use tw_shared::config::cache::CacheConfig;
