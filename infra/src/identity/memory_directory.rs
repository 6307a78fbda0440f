//! In-memory identity directory with bcrypt password hashes
//!
//! Users are loaded once at startup from a TOML seed:
//!
//! ```toml
//! [[users]]
//! subject_id = "u-1001"
//! email = "buyer@timewise.io"
//! password_hash = "$2b$12$..."
//! roles = ["buyer"]
//! permissions = ["po:read"]
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use tw_core::domain::entities::identity::Identity;
use tw_core::errors::DomainError;
use tw_core::repositories::IdentityDirectory;

use crate::InfrastructureError;

/// One `[[users]]` entry of the seed file
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub subject_id: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    users: Vec<SeedUser>,
}

#[derive(Debug, Clone)]
struct StoredUser {
    identity: Identity,
    password_hash: String,
}

/// Read-only directory keyed by subject id and lower-cased email
#[derive(Debug, Default)]
pub struct InMemoryIdentityDirectory {
    users: HashMap<String, StoredUser>,
    email_index: HashMap<String, String>,
    /// Checked for unknown usernames so they cost as much as a wrong password
    timing_hash: Option<String>,
}

impl InMemoryIdentityDirectory {
    /// Empty directory; every credential check fails
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML seed document
    pub fn from_seed_str(seed: &str) -> Result<Self, InfrastructureError> {
        let file: SeedFile = toml::from_str(seed)?;
        let mut directory = Self::new();
        for user in file.users {
            directory.add_seed_user(user)?;
        }
        Ok(directory)
    }

    /// Load the TOML seed file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        let seed = std::fs::read_to_string(path)?;
        let directory = Self::from_seed_str(&seed)?;
        info!("Loaded {} identities from {}", directory.len(), path.display());
        Ok(directory)
    }

    /// Add a user whose password is already bcrypt-hashed
    pub fn add_seed_user(&mut self, user: SeedUser) -> Result<(), InfrastructureError> {
        let mut identity = Identity::new(user.subject_id, user.email).with_roles(user.roles);
        if let Some(permissions) = user.permissions {
            identity = identity.with_permissions(permissions);
        }
        self.insert(identity, user.password_hash)
    }

    /// Add a user, hashing `password` with the given bcrypt cost
    pub fn add_user(&mut self, identity: Identity, password: &str, cost: u32) -> Result<(), InfrastructureError> {
        let password_hash = bcrypt::hash(password, cost)?;
        self.insert(identity, password_hash)
    }

    fn insert(&mut self, identity: Identity, password_hash: String) -> Result<(), InfrastructureError> {
        identity
            .validate()
            .map_err(|e| InfrastructureError::Config(e.to_string()))?;

        let email = identity.email.trim().to_lowercase();
        if self.users.contains_key(&identity.subject_id) || self.email_index.contains_key(&email) {
            return Err(InfrastructureError::Config(format!(
                "Duplicate identity {}",
                identity.subject_id
            )));
        }

        if self.timing_hash.is_none() {
            self.timing_hash = Some(password_hash.clone());
        }
        self.email_index.insert(email, identity.subject_id.clone());
        self.users.insert(
            identity.subject_id.clone(),
            StoredUser {
                identity,
                password_hash,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn lookup(&self, username: &str) -> Option<&StoredUser> {
        let username = username.trim();
        self.users.get(username).or_else(|| {
            self.email_index
                .get(&username.to_lowercase())
                .and_then(|subject_id| self.users.get(subject_id))
        })
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn find_by_subject(&self, subject_id: &str) -> Result<Option<Identity>, DomainError> {
        Ok(self.users.get(subject_id).map(|user| user.identity.clone()))
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Identity>, DomainError> {
        let Some(user) = self.lookup(username).cloned() else {
            if let Some(hash) = self.timing_hash.clone() {
                // The outcome is irrelevant; only the cost matters.
                let _ = verify_password(password, hash).await;
            }
            debug!("Authentication failed: unknown user");
            return Ok(None);
        };

        if verify_password(password, user.password_hash.clone()).await? {
            Ok(Some(user.identity))
        } else {
            debug!(subject_id = %user.identity.subject_id, "Authentication failed: wrong password");
            Ok(None)
        }
    }
}

/// bcrypt is CPU bound; keep it off the async workers.
async fn verify_password(password: &str, hash: String) -> Result<bool, DomainError> {
    let password = password.to_string();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| DomainError::Internal {
            message: format!("Password verification task failed: {}", e),
        })?
        .map_err(InfrastructureError::from)?;
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    fn directory() -> InMemoryIdentityDirectory {
        let mut directory = InMemoryIdentityDirectory::new();
        directory
            .add_user(
                Identity::new("u-1", "Buyer@TimeWise.io").with_roles(["buyer"]),
                "s3cret",
                TEST_COST,
            )
            .unwrap();
        directory
    }

    #[tokio::test]
    async fn test_authenticate_by_subject_and_email() {
        let directory = directory();

        let by_subject = directory.authenticate("u-1", "s3cret").await.unwrap().unwrap();
        assert_eq!(by_subject.subject_id, "u-1");

        let by_email = directory
            .authenticate("buyer@timewise.io", "s3cret")
            .await
            .unwrap()
            .unwrap();
        assert!(by_email.has_role("buyer"));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_credentials() {
        let directory = directory();
        assert!(directory.authenticate("u-1", "wrong").await.unwrap().is_none());
        assert!(directory.authenticate("nobody", "s3cret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_subject() {
        let directory = directory();
        assert!(directory.find_by_subject("u-1").await.unwrap().is_some());
        assert!(directory.find_by_subject("u-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seed_file() {
        let hash = bcrypt::hash("pw", TEST_COST).unwrap();
        let seed = format!(
            r#"
            [[users]]
            subject_id = "admin-1"
            email = "admin@timewise.io"
            password_hash = "{hash}"
            roles = ["admin"]
            permissions = ["tokens:sweep"]

            [[users]]
            subject_id = "viewer-1"
            email = "viewer@timewise.io"
            password_hash = "{hash}"
            "#
        );

        let directory = InMemoryIdentityDirectory::from_seed_str(&seed).unwrap();
        assert_eq!(directory.len(), 2);

        let admin = directory.authenticate("admin@timewise.io", "pw").await.unwrap().unwrap();
        assert!(admin.has_role("admin"));
        assert!(admin.has_permission("tokens:sweep"));

        let viewer = directory.find_by_subject("viewer-1").await.unwrap().unwrap();
        assert!(viewer.roles.is_empty());
        assert_eq!(viewer.permissions, None);
    }

    #[test]
    fn test_seed_rejects_duplicates_and_bad_toml() {
        let seed = r#"
            [[users]]
            subject_id = "a"
            email = "a@timewise.io"
            password_hash = "x"

            [[users]]
            subject_id = "b"
            email = "A@timewise.io"
            password_hash = "x"
        "#;
        assert!(matches!(
            InMemoryIdentityDirectory::from_seed_str(seed),
            Err(InfrastructureError::Config(_))
        ));
        assert!(matches!(
            InMemoryIdentityDirectory::from_seed_str("[[users]"),
            Err(InfrastructureError::Seed(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_store_error() {
        let mut directory = InMemoryIdentityDirectory::new();
        directory
            .add_seed_user(SeedUser {
                subject_id: "u-9".to_string(),
                email: "u9@timewise.io".to_string(),
                password_hash: "not-a-bcrypt-hash".to_string(),
                roles: vec![],
                permissions: None,
            })
            .unwrap();

        let err = directory.authenticate("u-9", "pw").await.unwrap_err();
        assert!(err.is_fatal());

        // Unknown users still get a plain rejection.
        assert!(directory.authenticate("nobody", "pw").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_checks_a_real_hash() {
        let empty = InMemoryIdentityDirectory::new();
        assert!(empty.timing_hash.is_none());
        assert!(empty.authenticate("nobody", "pw").await.unwrap().is_none());

        let directory = directory();
        let stored = &directory.users["u-1"].password_hash;
        assert_eq!(directory.timing_hash.as_ref(), Some(stored));
        assert!(bcrypt::verify("s3cret", directory.timing_hash.as_deref().unwrap()).unwrap());

        // Even the right password of another user does not match an unknown name.
        assert!(directory.authenticate("ghost@timewise.io", "s3cret").await.unwrap().is_none());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            InMemoryIdentityDirectory::load("/nonexistent/timewise-seed.toml"),
            Err(InfrastructureError::Io(_))
        ));
    }
}
