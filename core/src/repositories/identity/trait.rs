//! Identity directory trait consulted by the token and grant services

use async_trait::async_trait;

use crate::domain::entities::identity::Identity;
use crate::errors::DomainError;

/// Read-only view of the user directory
///
/// The token service needs it to rebuild an identity when a refresh token is
/// exchanged, and the grant service uses it to check credentials.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Find an identity by its subject id
    ///
    /// # Returns
    /// * `Ok(Some(identity))` - Subject exists
    /// * `Ok(None)` - Unknown subject
    /// * `Err(DomainError)` - Directory backend failure
    async fn find_by_subject(&self, subject_id: &str) -> Result<Option<Identity>, DomainError>;

    /// Check a username/password pair
    ///
    /// # Returns
    /// * `Ok(Some(identity))` - Credentials are valid
    /// * `Ok(None)` - Unknown user or wrong password
    /// * `Err(DomainError)` - Directory backend failure
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Identity>, DomainError>;
}
