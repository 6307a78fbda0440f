//! Main token service implementation

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::domain::entities::identity::Identity;
use crate::domain::entities::token::{
    whole_seconds_ceil, Claims, RefreshTokenRecord, TokenPair, REFRESH_TOKEN_LENGTH,
};
use crate::errors::{DomainError, TokenError, ValidationError};
use crate::repositories::{IdentityDirectory, TokenStore};

use super::config::TokenServiceConfig;

/// Upper bound for either token lifetime, roughly a century
const MAX_TOKEN_LIFETIME_DAYS: i64 = 36_500;

/// Only the identifier is read before the signature is checked
#[derive(Debug, Deserialize)]
struct TokenId {
    jti: String,
}

/// Service for issuing, verifying, refreshing and revoking tokens
pub struct TokenService {
    store: Arc<dyn TokenStore>,
    config: TokenServiceConfig,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Full validation used by `verify`
    validation: Validation,
    /// Signature, issuer and audience only; used by `revoke`
    revocation_validation: Validation,
    /// No checks at all; used to read `jti` for the blacklist lookup
    peek_validation: Validation,
}

impl TokenService {
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `store` - Token store for refresh records and the blacklist
    /// * `config` - Token service configuration
    ///
    /// # Returns
    ///
    /// A new `TokenService`, or an error when the secret is empty, the
    /// algorithm is not HMAC based or a lifetime is negative or longer than
    /// a century
    pub fn new(store: Arc<dyn TokenStore>, config: TokenServiceConfig) -> Result<Self, DomainError> {
        if config.jwt_secret.is_empty() {
            return Err(ValidationError::RequiredField {
                field: "jwt_secret".to_string(),
            }
            .into());
        }

        if !matches!(config.algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(DomainError::Internal {
                message: format!("Unsupported signing algorithm {:?}", config.algorithm),
            });
        }

        let access_lifetime = Duration::from_std(config.access_token_lifetime)
            .ok()
            .filter(|lifetime| *lifetime <= max_token_lifetime())
            .ok_or_else(|| out_of_range("access_token_lifetime"))?;
        let refresh_lifetime = Some(config.refresh_token_lifetime_days)
            .filter(|days| (0..=MAX_TOKEN_LIFETIME_DAYS).contains(days))
            .and_then(Duration::try_days)
            .ok_or_else(|| out_of_range("refresh_token_lifetime_days"))?;

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

        let mut revocation_validation = Validation::new(config.algorithm);
        revocation_validation.leeway = 0;
        revocation_validation.validate_exp = false;
        revocation_validation.set_issuer(&[config.issuer.as_str()]);
        revocation_validation.set_audience(&[config.audience.as_str()]);
        revocation_validation.set_required_spec_claims(&["exp"]);

        let mut peek_validation = Validation::new(config.algorithm);
        peek_validation.insecure_disable_signature_validation();
        peek_validation.validate_exp = false;
        peek_validation.validate_aud = false;
        peek_validation.required_spec_claims.clear();

        Ok(Self {
            store,
            config,
            access_lifetime,
            refresh_lifetime,
            encoding_key,
            decoding_key,
            validation,
            revocation_validation,
            peek_validation,
        })
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.store)
    }

    /// Access token lifetime in seconds, rounded up like `exp`
    pub fn access_token_lifetime_secs(&self) -> i64 {
        whole_seconds_ceil(self.access_lifetime)
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Issues a new access/refresh token pair for an identity
    ///
    /// Expired refresh records and blacklist entries are swept first; a
    /// failing sweep is logged and does not block issuance.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - The generated token pair
    /// * `Err(DomainError::Validation)` - Blank subject id
    /// * `Err(DomainError::Token)` - Signing failed
    /// * `Err(DomainError::Store)` - The refresh record could not be saved
    pub async fn issue(&self, identity: &Identity) -> Result<TokenPair, DomainError> {
        identity.validate()?;

        let now = Utc::now();
        self.sweep_expired(now).await;

        let claims = Claims::new_access_token(
            identity,
            now,
            self.access_lifetime,
            &self.config.issuer,
            &self.config.audience,
        )?;
        let access_token = self.encode_jwt(&claims)?;

        let refresh_token = generate_refresh_token();
        let record = RefreshTokenRecord::new(
            identity.subject_id.clone(),
            hash_token(&refresh_token),
            self.refresh_lifetime,
        )?;
        self.store.save_refresh_token(record).await?;

        debug!(subject_id = %identity.subject_id, jti = %claims.jti, "Issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_token_lifetime_secs(),
            refresh_expires_in: self.refresh_lifetime.num_seconds(),
        })
    }

    /// Encodes claims into a JWT
    pub(crate) fn encode_jwt(&self, claims: &Claims) -> Result<String, DomainError> {
        let header = Header::new(self.config.algorithm);
        encode(&header, claims, &self.encoding_key).map_err(|e| {
            error!("Failed to sign access token: {}", e);
            DomainError::Token(TokenError::TokenGenerationFailed)
        })
    }

    /// Verifies an access token and returns the identity it carries
    ///
    /// Every failure (malformed, bad signature, wrong issuer or audience,
    /// expired, not yet valid, revoked, store unavailable) yields `None`.
    pub async fn verify(&self, token: &str) -> Option<Identity> {
        self.verify_claims(token).await.map(|claims| claims.identity())
    }

    /// Same rules as [`TokenService::verify`] but returns the full claims
    pub async fn verify_claims(&self, token: &str) -> Option<Claims> {
        let jti = match decode::<TokenId>(token, &self.decoding_key, &self.peek_validation) {
            Ok(data) => data.claims.jti,
            Err(e) => {
                debug!("Rejected malformed access token: {}", e);
                return None;
            }
        };

        match self.store.is_token_blacklisted(&jti, Utc::now()).await {
            Ok(false) => {}
            Ok(true) => {
                debug!(jti = %jti, "Rejected revoked access token");
                return None;
            }
            Err(e) => {
                error!(jti = %jti, "Blacklist lookup failed, rejecting token: {}", e);
                return None;
            }
        }

        let claims = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!(jti = %jti, "Rejected access token: {}", e);
                return None;
            }
        };

        if claims.is_expired_at(Utc::now()) {
            debug!(jti = %jti, "Rejected expired access token");
            return None;
        }
        if !claims.is_access_token() {
            debug!(jti = %jti, "Rejected token with type {}", claims.token_type);
            return None;
        }

        Some(claims)
    }

    /// Exchanges a refresh token for a new token pair
    ///
    /// The presented token is consumed before anything else is checked, so
    /// it can never be used twice regardless of the outcome.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(TokenPair))` - New pair issued
    /// * `Ok(None)` - Unknown, already used or expired token, or the subject
    ///   no longer exists
    /// * `Err(DomainError)` - Store or directory failure
    pub async fn refresh(
        &self,
        refresh_token: &str,
        directory: &dyn IdentityDirectory,
    ) -> Result<Option<TokenPair>, DomainError> {
        let token_hash = hash_token(refresh_token);

        let Some(record) = self.store.take_refresh_token(&token_hash).await? else {
            debug!("Refresh token unknown or already consumed");
            return Ok(None);
        };

        if record.is_expired_at(Utc::now()) {
            debug!(subject_id = %record.subject_id, "Refresh token expired");
            return Ok(None);
        }

        let Some(identity) = directory.find_by_subject(&record.subject_id).await? else {
            warn!(subject_id = %record.subject_id, "Refresh token belongs to an unknown subject");
            return Ok(None);
        };

        self.issue(&identity).await.map(Some)
    }

    /// Blacklists an access token until its original expiry
    ///
    /// Tokens that fail signature, issuer or audience checks, and tokens that
    /// are already expired, are ignored. Revoking twice succeeds.
    pub async fn revoke(&self, token: &str) -> Result<(), DomainError> {
        let claims = match decode::<Claims>(token, &self.decoding_key, &self.revocation_validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Ignoring revocation of unverifiable token: {}", e);
                return Ok(());
            }
        };

        if claims.is_expired_at(Utc::now()) {
            debug!(jti = %claims.jti, "Ignoring revocation of expired token");
            return Ok(());
        }

        let Some(expires_at) = claims.expires_at() else {
            debug!(jti = %claims.jti, "Ignoring token with unrepresentable expiry");
            return Ok(());
        };

        self.store.blacklist_token(&claims.jti, expires_at).await?;
        info!(jti = %claims.jti, subject_id = %claims.sub, "Access token revoked");
        Ok(())
    }

    /// Deletes a presented refresh token
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Token deleted
    /// * `Ok(false)` - Token was unknown or already used
    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> Result<bool, DomainError> {
        let removed = self.store.delete_refresh_token(&hash_token(refresh_token)).await?;
        if removed {
            debug!("Refresh token revoked");
        }
        Ok(removed)
    }

    /// Deletes every refresh token of a subject
    pub async fn revoke_all_for_subject(&self, subject_id: &str) -> Result<usize, DomainError> {
        let count = self.store.revoke_all_user_tokens(subject_id).await?;
        info!(subject_id = %subject_id, "Revoked {} refresh tokens", count);
        Ok(count)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) {
        if let Err(e) = self.store.delete_expired_tokens(now).await {
            warn!("Opportunistic refresh token sweep failed: {}", e);
        }
        if let Err(e) = self.store.cleanup_blacklist(now).await {
            warn!("Opportunistic blacklist sweep failed: {}", e);
        }
    }
}

/// Random alphanumeric refresh token, independent of the JWT scheme
pub(crate) fn generate_refresh_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Hex-encoded SHA-256 of a refresh token, the only form the store sees
pub(crate) fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn max_token_lifetime() -> Duration {
    Duration::days(MAX_TOKEN_LIFETIME_DAYS)
}

fn out_of_range(field: &str) -> DomainError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
    }
    .into()
}
