
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::identity::Identity;
use crate::domain::entities::token::RefreshTokenRecord;
use crate::errors::{DomainError, StoreError};
use crate::repositories::{InMemoryTokenStore, MockIdentityDirectory, TokenStore};
use crate::services::token::{TokenService, TokenServiceConfig};

pub(super) const TEST_SECRET: &str = "test-secret-with-enough-entropy";

pub(super) fn test_identity() -> Identity {
    Identity::new("user-1", "user1@timewise.io")
        .with_roles(["buyer"])
        .with_permissions(["po:read", "po:write"])
}

pub(super) fn service_with(store: Arc<dyn TokenStore>, config: TokenServiceConfig) -> TokenService {
    TokenService::new(store, config).unwrap()
}

pub(super) fn memory_service() -> (Arc<InMemoryTokenStore>, TokenService) {
    let store = Arc::new(InMemoryTokenStore::new());
    let service = service_with(store.clone(), TokenServiceConfig::new(TEST_SECRET));
    (store, service)
}

pub(super) async fn directory_with(identity: Identity) -> MockIdentityDirectory {
    let directory = MockIdentityDirectory::new();
    directory.insert(identity, "password").await;
    directory
}

/// In-memory store whose blacklist lookups or sweeps can be made to fail
#[derive(Default)]
pub(super) struct FlakyTokenStore {
    pub inner: InMemoryTokenStore,
    pub fail_blacklist: AtomicBool,
    pub fail_sweeps: AtomicBool,
}

fn backend_error() -> DomainError {
    StoreError::Backend {
        message: "connection refused".to_string(),
    }
    .into()
}

#[async_trait]
impl TokenStore for FlakyTokenStore {
    async fn save_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), DomainError> {
        self.inner.save_refresh_token(record).await
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DomainError> {
        self.inner.find_refresh_token(token_hash).await
    }

    async fn take_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DomainError> {
        self.inner.take_refresh_token(token_hash).await
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> Result<bool, DomainError> {
        self.inner.delete_refresh_token(token_hash).await
    }

    async fn revoke_all_user_tokens(&self, subject_id: &str) -> Result<usize, DomainError> {
        self.inner.revoke_all_user_tokens(subject_id).await
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        if self.fail_sweeps.load(Ordering::SeqCst) {
            return Err(backend_error());
        }
        self.inner.delete_expired_tokens(now).await
    }

    async fn blacklist_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), DomainError> {
        self.inner.blacklist_token(jti, expires_at).await
    }

    async fn is_token_blacklisted(&self, jti: &str, now: DateTime<Utc>) -> Result<bool, DomainError> {
        if self.fail_blacklist.load(Ordering::SeqCst) {
            return Err(backend_error());
        }
        self.inner.is_token_blacklisted(jti, now).await
    }

    async fn cleanup_blacklist(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        if self.fail_sweeps.load(Ordering::SeqCst) {
            return Err(backend_error());
        }
        self.inner.cleanup_blacklist(now).await
    }
}
