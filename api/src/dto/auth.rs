use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use tw_core::domain::entities::token::TokenPair;
use tw_core::errors::ValidationError;
use tw_core::services::auth::TokenGrant;
use tw_core::services::token::CleanupResult;

/// Body of `POST /oauth/token`, accepted as JSON or form data
///
/// Snake case field names follow RFC 6749; camelCase aliases are accepted
/// for JSON clients.
#[derive(Clone, Default, Deserialize, Validate)]
pub struct TokenRequest {
    #[serde(default, alias = "grantType")]
    #[validate(length(max = 64))]
    pub grant_type: Option<String>,

    #[serde(default)]
    #[validate(length(max = 320))]
    pub username: Option<String>,

    #[serde(default)]
    #[validate(length(max = 1024))]
    pub password: Option<String>,

    #[serde(default, alias = "refreshToken")]
    #[validate(length(max = 512))]
    pub refresh_token: Option<String>,
}

impl TokenRequest {
    pub fn into_grant(self) -> Result<TokenGrant, ValidationError> {
        TokenGrant::from_parts(
            self.grant_type.as_deref(),
            self.username,
            self.password,
            self.refresh_token,
        )
    }
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub token_type: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
            token_type: "Bearer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default, alias = "refresh_token")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Identity attached to the current request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub subject_id: String,
    pub email: String,
    pub roles: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeSet<String>>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    pub expired_tokens_deleted: usize,
    pub blacklist_entries_deleted: usize,
    pub errors: Vec<String>,
}

impl From<CleanupResult> for SweepResponse {
    fn from(result: CleanupResult) -> Self {
        Self {
            expired_tokens_deleted: result.expired_tokens_deleted,
            blacklist_entries_deleted: result.blacklist_entries_deleted,
            errors: result.errors,
        }
    }
}
