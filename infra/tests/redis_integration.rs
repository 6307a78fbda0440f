//! Integration tests for the Redis token store
//!
//! These tests require a running Redis instance (6.2 or newer for GETDEL).
//! Run with: cargo test -p tw_infra --test redis_integration -- --ignored

use std::sync::Arc;

use chrono::{Duration, Utc};
use tw_core::domain::entities::token::RefreshTokenRecord;
use tw_core::repositories::TokenStore;
use tw_infra::cache::{CacheConfig, RedisClient, RedisTokenStore};

async fn store() -> RedisTokenStore {
    let mut config = CacheConfig::redis(
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
    );
    // Isolate each test run.
    config.key_prefix = format!(
        "timewise:test:{}",
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );

    let client = RedisClient::new(&config).await.expect("Failed to connect to Redis");
    RedisTokenStore::new(client)
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_redis_health_check() {
    let store = store().await;
    assert!(store.client().health_check().await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_refresh_token_take_once() {
    let store = store().await;
    store
        .save_refresh_token(RefreshTokenRecord::new("u1", "hash-1", Duration::minutes(5)).unwrap())
        .await
        .unwrap();

    assert!(store.find_refresh_token("hash-1").await.unwrap().is_some());
    assert!(store.take_refresh_token("hash-1").await.unwrap().is_some());
    assert!(store.take_refresh_token("hash-1").await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_duplicate_save_is_rejected() {
    let store = store().await;
    let record = RefreshTokenRecord::new("u1", "dup", Duration::minutes(5)).unwrap();
    store.save_refresh_token(record.clone()).await.unwrap();
    assert!(store.save_refresh_token(record).await.is_err());
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_concurrent_take_single_winner() {
    let store = Arc::new(store().await);
    store
        .save_refresh_token(RefreshTokenRecord::new("u1", "contested", Duration::minutes(5)).unwrap())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.take_refresh_token("contested").await.unwrap().is_some()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_revoke_all_user_tokens() {
    let store = store().await;
    for hash in ["a", "b"] {
        store
            .save_refresh_token(RefreshTokenRecord::new("u1", hash, Duration::minutes(5)).unwrap())
            .await
            .unwrap();
    }
    store
        .save_refresh_token(RefreshTokenRecord::new("u2", "c", Duration::minutes(5)).unwrap())
        .await
        .unwrap();

    assert_eq!(store.revoke_all_user_tokens("u1").await.unwrap(), 2);
    assert!(store.find_refresh_token("a").await.unwrap().is_none());
    assert!(store.find_refresh_token("c").await.unwrap().is_some());
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_blacklist_lazy_expiry() {
    let store = store().await;
    let now = Utc::now();
    let expires_at = now + Duration::minutes(5);

    store.blacklist_token("jti-1", expires_at).await.unwrap();
    store.blacklist_token("jti-1", expires_at).await.unwrap();

    assert!(store.is_token_blacklisted("jti-1", now).await.unwrap());
    assert!(!store
        .is_token_blacklisted("jti-1", expires_at + Duration::seconds(1))
        .await
        .unwrap());
    assert!(!store.is_token_blacklisted("unknown", now).await.unwrap());
    assert_eq!(store.cleanup_blacklist(now).await.unwrap(), 0);
}
