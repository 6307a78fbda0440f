//! Token store trait: refresh token records and the access token blacklist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::token::RefreshTokenRecord;
use crate::errors::DomainError;

/// Storage capability behind the token service
///
/// The service only talks to this trait, so a shared store (Redis) can
/// replace the in-process one for multi-instance deployments.
///
/// # Invariants
/// - A refresh token record's presence is the only proof of validity
/// - `take_refresh_token` removes and returns atomically; two concurrent
///   callers can never both receive the same record
/// - Blacklist lookups ignore entries whose expiry has passed, whether or not
///   a sweep has removed them yet
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Save a new refresh token record
    ///
    /// # Returns
    /// * `Ok(())` - Record stored
    /// * `Err(DomainError::Store)` - Backend failure or duplicate hash
    async fn save_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), DomainError>;

    /// Find a refresh token record by its hash without consuming it
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DomainError>;

    /// Remove and return a refresh token record
    ///
    /// # Returns
    /// * `Ok(Some(record))` - The record existed and is now deleted
    /// * `Ok(None)` - No record with this hash
    async fn take_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DomainError>;

    /// Delete a refresh token record
    ///
    /// # Returns
    /// * `Ok(true)` - Record deleted
    /// * `Ok(false)` - Record not found
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<bool, DomainError>;

    /// Delete every refresh token issued to a subject, returning how many went
    async fn revoke_all_user_tokens(&self, subject_id: &str) -> Result<usize, DomainError>;

    /// Delete refresh token records expired at `now`
    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;

    /// Blacklist an access token identifier until `expires_at`
    ///
    /// Blacklisting an already blacklisted identifier succeeds.
    async fn blacklist_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), DomainError>;

    /// Whether `jti` is blacklisted and the entry is still live at `now`
    async fn is_token_blacklisted(&self, jti: &str, now: DateTime<Utc>) -> Result<bool, DomainError>;

    /// Delete blacklist entries expired at `now`
    async fn cleanup_blacklist(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;
}
