//! Token entities for JWT-based authentication.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::Identity;
use crate::errors::DomainError;

/// Fixed `token_type` marker carried by every access token
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Length of the opaque refresh token handed to clients
pub const REFRESH_TOKEN_LENGTH: usize = 64;

/// Claims structure for the access token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity subject id)
    pub sub: String,

    /// Subject email
    pub email: String,

    /// Role labels
    #[serde(default)]
    pub roles: BTreeSet<String>,

    /// Permission labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeSet<String>>,

    /// Issued at timestamp
    pub iat: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// JWT ID, used for blacklist lookups
    pub jti: String,

    /// Always `"access"`
    pub token_type: String,
}

impl Claims {
    /// Creates new claims for an access token
    ///
    /// # Arguments
    ///
    /// * `identity` - The identity snapshot to embed
    /// * `issued_at` - Issuance instant
    /// * `lifetime` - Access token lifetime
    /// * `issuer` / `audience` - Registered claims checked on verification
    ///
    /// `exp` is `iat` plus the lifetime rounded up to whole seconds, so a
    /// sub-second lifetime still yields a usable token.
    ///
    /// # Errors
    ///
    /// `DomainError::Internal` when the expiry is not representable
    pub fn new_access_token(
        identity: &Identity,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
        issuer: &str,
        audience: &str,
    ) -> Result<Self, DomainError> {
        expiry_after(issued_at, lifetime, "Access token")?;
        let iat = issued_at.timestamp();

        Ok(Self {
            sub: identity.subject_id.clone(),
            email: identity.email.clone(),
            roles: identity.roles.clone(),
            permissions: identity.permissions.clone(),
            iat,
            nbf: iat,
            exp: iat + whole_seconds_ceil(lifetime),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        })
    }

    /// A token is usable during `[nbf, exp)`; a zero lifetime is already expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_access_token(&self) -> bool {
        self.token_type == ACCESS_TOKEN_TYPE
    }

    /// Expiry as a timestamp, if representable
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Rebuilds the identity snapshot carried by the token
    pub fn identity(&self) -> Identity {
        Identity {
            subject_id: self.sub.clone(),
            email: self.email.clone(),
            roles: self.roles.clone(),
            permissions: self.permissions.clone(),
        }
    }
}

/// Metadata stored for an issued refresh token
///
/// Only the SHA-256 digest of the token is kept; the raw value exists on the
/// client alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Hex-encoded SHA-256 of the refresh token
    pub token_hash: String,

    /// Subject the token was issued to
    pub subject_id: String,

    /// Timestamp when the token was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// Creates a record expiring `lifetime` from now
    ///
    /// # Errors
    ///
    /// `DomainError::Internal` when the expiry is not representable
    pub fn new(
        subject_id: impl Into<String>,
        token_hash: impl Into<String>,
        lifetime: Duration,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();

        Ok(Self {
            token_hash: token_hash.into(),
            subject_id: subject_id.into(),
            created_at: now,
            expires_at: expiry_after(now, lifetime, "Refresh token")?,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time remaining until expiration, zero once expired
    pub fn time_until_expiration(&self) -> Duration {
        let now = Utc::now();
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}

/// Lifetime in seconds, rounded up
pub fn whole_seconds_ceil(lifetime: Duration) -> i64 {
    let secs = lifetime.num_seconds();
    if lifetime > Duration::seconds(secs) {
        secs + 1
    } else {
        secs
    }
}

fn expiry_after(start: DateTime<Utc>, lifetime: Duration, what: &str) -> Result<DateTime<Utc>, DomainError> {
    start
        .checked_add_signed(lifetime)
        .ok_or_else(|| DomainError::Internal {
            message: format!("{} expiry out of range", what),
        })
}

/// Token pair returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token
    pub access_token: String,

    /// Opaque refresh token
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}
