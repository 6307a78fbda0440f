//! Redis-backed token store
//!
//! Key layout under the configured prefix:
//!
//! | key                 | value                          | expiry                |
//! |---------------------|--------------------------------|-----------------------|
//! | `refresh:{hash}`    | JSON `RefreshTokenRecord`      | refresh token expiry  |
//! | `user:{subject_id}` | set of refresh token hashes    | latest refresh expiry |
//! | `blacklist:{jti}`   | access token `exp` (seconds)   | access token expiry   |
//!
//! Redis TTLs remove expired entries, so the sweep operations have nothing
//! to do and report zero.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use tracing::{debug, info};

use tw_core::domain::entities::token::RefreshTokenRecord;
use tw_core::errors::{DomainError, StoreError};
use tw_core::repositories::TokenStore;

use crate::cache::RedisClient;
use crate::InfrastructureError;

const REFRESH_NAMESPACE: &str = "refresh";
const USER_NAMESPACE: &str = "user";
const BLACKLIST_NAMESPACE: &str = "blacklist";

/// Token store shared across API instances through Redis
#[derive(Clone)]
pub struct RedisTokenStore {
    client: RedisClient,
}

impl RedisTokenStore {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }

    fn refresh_key(&self, token_hash: &str) -> String {
        self.client.key(REFRESH_NAMESPACE, token_hash)
    }

    fn user_key(&self, subject_id: &str) -> String {
        self.client.key(USER_NAMESPACE, subject_id)
    }

    fn blacklist_key(&self, jti: &str) -> String {
        self.client.key(BLACKLIST_NAMESPACE, jti)
    }

    async fn get_record(&self, key: String) -> Result<Option<String>, InfrastructureError> {
        self.client
            .execute_with_retry(|mut conn| {
                let key = key.clone();
                Box::pin(async move { conn.get::<_, Option<String>>(key).await })
            })
            .await
    }

    async fn unindex(&self, subject_id: &str, token_hash: &str) -> Result<(), InfrastructureError> {
        let user_key = self.user_key(subject_id);
        let member = token_hash.to_string();
        self.client
            .execute_with_retry(|mut conn| {
                let user_key = user_key.clone();
                let member = member.clone();
                Box::pin(async move { conn.srem::<_, _, ()>(user_key, member).await })
            })
            .await
    }
}

/// Whole seconds until `expires_at`, rounded up; zero once passed
pub(crate) fn remaining_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (expires_at - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis as u64).div_ceil(1000)
    }
}

fn parse_record(raw: &str) -> Result<RefreshTokenRecord, DomainError> {
    serde_json::from_str(raw).map_err(|e| InfrastructureError::from(e).into())
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn save_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), DomainError> {
        let ttl = remaining_seconds(record.expires_at, Utc::now());
        if ttl == 0 {
            debug!(subject_id = %record.subject_id, "Skipping already expired refresh token");
            return Ok(());
        }

        let key = self.refresh_key(&record.token_hash);
        let user_key = self.user_key(&record.subject_id);
        let payload = serde_json::to_string(&record).map_err(InfrastructureError::from)?;

        let created: Option<String> = self
            .client
            .execute_with_retry(|mut conn| {
                let key = key.clone();
                let payload = payload.clone();
                Box::pin(async move {
                    redis::cmd("SET")
                        .arg(key)
                        .arg(payload)
                        .arg("NX")
                        .arg("EX")
                        .arg(ttl)
                        .query_async::<_, Option<String>>(&mut conn)
                        .await
                })
            })
            .await?;

        if created.is_none() {
            return Err(StoreError::Corrupt {
                message: "refresh token hash already stored".to_string(),
            }
            .into());
        }

        let member = record.token_hash.clone();
        self.client
            .execute_with_retry(|mut conn| {
                let user_key = user_key.clone();
                let member = member.clone();
                Box::pin(async move {
                    redis::pipe()
                        .atomic()
                        .cmd("SADD")
                        .arg(&user_key)
                        .arg(member)
                        .ignore()
                        .cmd("EXPIRE")
                        .arg(&user_key)
                        .arg(ttl)
                        .ignore()
                        .query_async::<_, ()>(&mut conn)
                        .await
                })
            })
            .await?;

        Ok(())
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DomainError> {
        match self.get_record(self.refresh_key(token_hash)).await? {
            Some(raw) => parse_record(&raw).map(Some),
            None => Ok(None),
        }
    }

    async fn take_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let key = self.refresh_key(token_hash);
        let raw: Option<String> = self
            .client
            .execute_with_retry(|mut conn| {
                let key = key.clone();
                Box::pin(async move {
                    redis::cmd("GETDEL")
                        .arg(key)
                        .query_async::<_, Option<String>>(&mut conn)
                        .await
                })
            })
            .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let record = parse_record(&raw)?;
        self.unindex(&record.subject_id, token_hash).await?;
        Ok(Some(record))
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> Result<bool, DomainError> {
        Ok(self.take_refresh_token(token_hash).await?.is_some())
    }

    async fn revoke_all_user_tokens(&self, subject_id: &str) -> Result<usize, DomainError> {
        let user_key = self.user_key(subject_id);
        let hashes: Vec<String> = self
            .client
            .execute_with_retry(|mut conn| {
                let user_key = user_key.clone();
                Box::pin(async move { conn.smembers::<_, Vec<String>>(user_key).await })
            })
            .await?;

        let keys: Vec<String> = hashes.iter().map(|hash| self.refresh_key(hash)).collect();
        let revoked: usize = if keys.is_empty() {
            0
        } else {
            self.client
                .execute_with_retry(|mut conn| {
                    let keys = keys.clone();
                    Box::pin(async move { conn.del::<_, usize>(keys).await })
                })
                .await?
        };

        self.client
            .execute_with_retry(|mut conn| {
                let user_key = user_key.clone();
                Box::pin(async move { conn.del::<_, ()>(user_key).await })
            })
            .await?;

        info!(subject_id = %subject_id, "Revoked {} refresh tokens in Redis", revoked);
        Ok(revoked)
    }

    async fn delete_expired_tokens(&self, _now: DateTime<Utc>) -> Result<usize, DomainError> {
        Ok(0)
    }

    async fn blacklist_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), DomainError> {
        let ttl = remaining_seconds(expires_at, Utc::now());
        if ttl == 0 {
            return Ok(());
        }

        let key = self.blacklist_key(jti);
        let exp = expires_at.timestamp();
        self.client
            .execute_with_retry(|mut conn| {
                let key = key.clone();
                Box::pin(async move { conn.set_ex::<_, _, ()>(key, exp, ttl).await })
            })
            .await?;

        Ok(())
    }

    async fn is_token_blacklisted(&self, jti: &str, now: DateTime<Utc>) -> Result<bool, DomainError> {
        let key = self.blacklist_key(jti);
        let exp: Option<i64> = self
            .client
            .execute_with_retry(|mut conn| {
                let key = key.clone();
                Box::pin(async move { conn.get::<_, Option<i64>>(key).await })
            })
            .await?;

        Ok(exp.map_or(false, |exp| exp > now.timestamp()))
    }

    async fn cleanup_blacklist(&self, _now: DateTime<Utc>) -> Result<usize, DomainError> {
        Ok(0)
    }
}
