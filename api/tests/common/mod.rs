//! Shared setup for the API integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_web::{http::header, test, web};
use serde_json::json;

use tw_api::AppState;
use tw_core::domain::entities::identity::Identity;
use tw_core::repositories::InMemoryTokenStore;
use tw_core::services::auth::AuthService;
use tw_core::services::token::{TokenCleanupConfig, TokenCleanupService, TokenService, TokenServiceConfig};
use tw_infra::InMemoryIdentityDirectory;
use tw_shared::TokenStoreBackend;

pub const TEST_SECRET: &str = "api-test-secret";
pub const BUYER_EMAIL: &str = "buyer@timewise.io";
pub const BUYER_PASSWORD: &str = "buyer-password";
pub const ADMIN_EMAIL: &str = "admin@timewise.io";
pub const ADMIN_PASSWORD: &str = "admin-password";

const TEST_COST: u32 = 4;

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub store: Arc<InMemoryTokenStore>,
    pub token_service: Arc<TokenService>,
}

pub fn test_context() -> TestContext {
    let mut directory = InMemoryIdentityDirectory::new();
    directory
        .add_user(
            Identity::new("buyer-1", BUYER_EMAIL)
                .with_roles(["buyer"])
                .with_permissions(["po:read"]),
            BUYER_PASSWORD,
            TEST_COST,
        )
        .unwrap();
    directory
        .add_user(
            Identity::new("admin-1", ADMIN_EMAIL).with_roles(["admin"]),
            ADMIN_PASSWORD,
            TEST_COST,
        )
        .unwrap();

    let store = Arc::new(InMemoryTokenStore::new());
    let config = TokenServiceConfig::new(TEST_SECRET).with_access_lifetime(Duration::from_secs(900));
    let token_service = Arc::new(TokenService::new(store.clone(), config).unwrap());
    let auth_service = Arc::new(AuthService::new(token_service.clone(), Arc::new(directory)));
    let cleanup = Arc::new(TokenCleanupService::new(
        store.clone(),
        TokenCleanupConfig::default(),
    ));

    TestContext {
        state: web::Data::new(AppState::new(auth_service, cleanup, TokenStoreBackend::Memory)),
        store,
        token_service,
    }
}

/// JSON password grant request
pub fn password_request(username: &str, password: &str) -> test::TestRequest {
    test::TestRequest::post().uri("/oauth/token").set_json(json!({
        "grant_type": "password",
        "username": username,
        "password": password,
    }))
}

/// JSON refresh grant request
pub fn refresh_request(refresh_token: &str) -> test::TestRequest {
    test::TestRequest::post().uri("/oauth/token").set_json(json!({
        "grant_type": "refresh_token",
        "refresh_token": refresh_token,
    }))
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}
