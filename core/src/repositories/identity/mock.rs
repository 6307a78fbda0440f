//! Mock implementation of IdentityDirectory for testing

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entities::identity::Identity;
use crate::errors::{DomainError, StoreError};

use super::trait_::IdentityDirectory;

/// Mock directory holding identities with plain-text passwords
#[derive(Default)]
pub struct MockIdentityDirectory {
    users: Arc<RwLock<HashMap<String, (Identity, String)>>>,
    fail: Arc<RwLock<bool>>,
}

impl MockIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identity with its password
    pub async fn insert(&self, identity: Identity, password: &str) {
        self.users
            .write()
            .await
            .insert(identity.subject_id.clone(), (identity, password.to_string()));
    }

    /// Remove a subject, simulating account deletion
    pub async fn remove(&self, subject_id: &str) {
        self.users.write().await.remove(subject_id);
    }

    /// Make every subsequent call fail with a backend error
    pub async fn set_failing(&self, failing: bool) {
        *self.fail.write().await = failing;
    }

    async fn check_failure(&self) -> Result<(), DomainError> {
        if *self.fail.read().await {
            return Err(StoreError::Backend {
                message: "directory unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for MockIdentityDirectory {
    async fn find_by_subject(&self, subject_id: &str) -> Result<Option<Identity>, DomainError> {
        self.check_failure().await?;
        let users = self.users.read().await;
        Ok(users.get(subject_id).map(|(identity, _)| identity.clone()))
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Identity>, DomainError> {
        self.check_failure().await?;
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|(identity, secret)| {
                (identity.subject_id == username || identity.email.eq_ignore_ascii_case(username))
                    && secret == password
            })
            .map(|(identity, _)| identity.clone()))
    }
}
