//! Token service module
//!
//! - HS256 access token issuance and verification
//! - Single-use refresh tokens stored as SHA-256 digests
//! - Access token revocation through a `jti` blacklist
//! - Background cleanup of expired records

mod cleanup;
mod config;
mod service;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupResult, TokenCleanupConfig, TokenCleanupService};
pub use config::TokenServiceConfig;
pub use service::TokenService;
