//! Configuration for the token service

use std::time::Duration;

use jsonwebtoken::Algorithm;
use tw_shared::config::auth::{DEFAULT_AUDIENCE, DEFAULT_ISSUER, DEFAULT_REFRESH_TOKEN_DAYS};
use tw_shared::JwtConfig;

/// Configuration for the token service
///
/// There is no `Default`: a signing secret must always be supplied.
#[derive(Clone)]
pub struct TokenServiceConfig {
    /// HMAC signing secret
    pub jwt_secret: String,
    /// JWT signing algorithm
    pub algorithm: Algorithm,
    /// Access token lifetime
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime in days
    pub refresh_token_lifetime_days: i64,
    /// `iss` claim written and required
    pub issuer: String,
    /// `aud` claim written and required
    pub audience: String,
}

impl TokenServiceConfig {
    /// Config with default lifetimes (24 h access, 7 day refresh)
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            algorithm: Algorithm::HS256,
            access_token_lifetime: Duration::from_secs(24 * 60 * 60),
            refresh_token_lifetime_days: DEFAULT_REFRESH_TOKEN_DAYS,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }

    pub fn with_access_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_token_lifetime = lifetime;
        self
    }

    pub fn with_refresh_lifetime_days(mut self, days: i64) -> Self {
        self.refresh_token_lifetime_days = days;
        self
    }
}

impl From<&JwtConfig> for TokenServiceConfig {
    fn from(config: &JwtConfig) -> Self {
        Self {
            jwt_secret: config.secret.clone(),
            algorithm: Algorithm::HS256,
            access_token_lifetime: config.access_token_lifetime,
            refresh_token_lifetime_days: config.refresh_token_lifetime_days,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }
}

impl std::fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("jwt_secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("refresh_token_lifetime_days", &self.refresh_token_lifetime_days)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}
