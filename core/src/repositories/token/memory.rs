//! Process-local token store
//!
//! Suitable for a single server process. Every mutation completes under one
//! write-lock acquisition, so consumption stays atomic across actix workers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entities::token::RefreshTokenRecord;
use crate::errors::{DomainError, StoreError};

use super::r#trait::TokenStore;

/// In-memory token store backed by two maps
#[derive(Default)]
pub struct InMemoryTokenStore {
    refresh_tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
    blacklist: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored refresh token records, expired ones included
    pub async fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.read().await.len()
    }

    /// Number of blacklist entries, expired ones included
    pub async fn blacklist_len(&self) -> usize {
        self.blacklist.read().await.len()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn save_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), DomainError> {
        let mut tokens = self.refresh_tokens.write().await;

        if tokens.contains_key(&record.token_hash) {
            return Err(StoreError::Corrupt {
                message: "duplicate refresh token hash".to_string(),
            }
            .into());
        }

        tokens.insert(record.token_hash.clone(), record);
        Ok(())
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let tokens = self.refresh_tokens.read().await;
        Ok(tokens.get(token_hash).cloned())
    }

    async fn take_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let mut tokens = self.refresh_tokens.write().await;
        Ok(tokens.remove(token_hash))
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> Result<bool, DomainError> {
        let mut tokens = self.refresh_tokens.write().await;
        Ok(tokens.remove(token_hash).is_some())
    }

    async fn revoke_all_user_tokens(&self, subject_id: &str) -> Result<usize, DomainError> {
        let mut tokens = self.refresh_tokens.write().await;
        let initial_count = tokens.len();

        tokens.retain(|_, record| record.subject_id != subject_id);

        Ok(initial_count - tokens.len())
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut tokens = self.refresh_tokens.write().await;
        let initial_count = tokens.len();

        tokens.retain(|_, record| !record.is_expired_at(now));

        Ok(initial_count - tokens.len())
    }

    async fn blacklist_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut blacklist = self.blacklist.write().await;

        // Keep the later expiry if the same identifier is revoked twice.
        let entry = blacklist.entry(jti.to_string()).or_insert(expires_at);
        if *entry < expires_at {
            *entry = expires_at;
        }
        Ok(())
    }

    async fn is_token_blacklisted(&self, jti: &str, now: DateTime<Utc>) -> Result<bool, DomainError> {
        let blacklist = self.blacklist.read().await;
        Ok(blacklist
            .get(jti)
            .is_some_and(|expires_at| *expires_at > now))
    }

    async fn cleanup_blacklist(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut blacklist = self.blacklist.write().await;
        let initial_count = blacklist.len();

        blacklist.retain(|_, expires_at| *expires_at > now);

        Ok(initial_count - blacklist.len())
    }
}
