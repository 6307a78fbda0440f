//! Authentication configuration: token signing, lifetimes and cleanup

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use super::{parse_var, read_var, VarLookup};
use crate::errors::ConfigError;
use crate::utils::lifetime::parse_lifetime;

/// Default access token lifetime string
pub const DEFAULT_ACCESS_TOKEN_LIFETIME: &str = "24h";

/// Default refresh token lifetime in days
pub const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 7;

/// Default JWT issuer claim
pub const DEFAULT_ISSUER: &str = "timewise";

/// Default JWT audience claim
pub const DEFAULT_AUDIENCE: &str = "timewise-api";

/// JWT signing configuration
#[derive(Clone, Serialize)]
pub struct JwtConfig {
    /// HMAC secret used to sign access tokens
    #[serde(skip_serializing)]
    pub secret: String,

    /// Access token lifetime
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime in days
    pub refresh_token_lifetime_days: i64,

    /// JWT issuer claim
    pub issuer: String,

    /// JWT audience claim
    pub audience: String,
}

// The secret never reaches logs.
impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("refresh_token_lifetime_days", &self.refresh_token_lifetime_days)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl JwtConfig {
    /// Create a JWT configuration with the given secret and default lifetimes
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_lifetime: Duration::from_secs(24 * 60 * 60),
            refresh_token_lifetime_days: DEFAULT_REFRESH_TOKEN_DAYS,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }

    /// Set the access token lifetime
    pub fn with_access_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_token_lifetime = lifetime;
        self
    }

    /// Set the refresh token lifetime in days
    pub fn with_refresh_lifetime_days(mut self, days: i64) -> Self {
        self.refresh_token_lifetime_days = days;
        self
    }

    /// Load from `JWT_SECRET`, `JWT_EXPIRES_IN`, `REFRESH_TOKEN_EXPIRES_DAYS`,
    /// `JWT_ISSUER` and `JWT_AUDIENCE`
    pub fn from_vars(lookup: VarLookup<'_>) -> Result<Self, ConfigError> {
        let secret = read_var(lookup, "JWT_SECRET").ok_or_else(|| ConfigError::Missing {
            key: "JWT_SECRET".to_string(),
        })?;

        let lifetime_raw = read_var(lookup, "JWT_EXPIRES_IN")
            .unwrap_or_else(|| DEFAULT_ACCESS_TOKEN_LIFETIME.to_string());
        let access_token_lifetime =
            parse_lifetime(&lifetime_raw).map_err(|message| ConfigError::Invalid {
                key: "JWT_EXPIRES_IN".to_string(),
                message,
            })?;

        let refresh_token_lifetime_days =
            parse_var(lookup, "REFRESH_TOKEN_EXPIRES_DAYS", DEFAULT_REFRESH_TOKEN_DAYS)?;
        if refresh_token_lifetime_days < 0 {
            return Err(ConfigError::Invalid {
                key: "REFRESH_TOKEN_EXPIRES_DAYS".to_string(),
                message: "must not be negative".to_string(),
            });
        }

        Ok(Self {
            secret,
            access_token_lifetime,
            refresh_token_lifetime_days,
            issuer: read_var(lookup, "JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            audience: read_var(lookup, "JWT_AUDIENCE")
                .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
        })
    }
}

/// Periodic token store sweep configuration
#[derive(Debug, Clone, Serialize)]
pub struct CleanupConfig {
    /// How often to sweep expired refresh tokens and blacklist entries
    pub interval_seconds: u64,

    /// Whether the background sweep runs at all
    pub enabled: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            enabled: true,
        }
    }
}

impl CleanupConfig {
    pub fn from_vars(lookup: VarLookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let interval_seconds = parse_var(
            lookup,
            "TOKEN_CLEANUP_INTERVAL_SECONDS",
            defaults.interval_seconds,
        )?;
        if interval_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_CLEANUP_INTERVAL_SECONDS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            interval_seconds,
            enabled: parse_var(lookup, "TOKEN_CLEANUP_ENABLED", defaults.enabled)?,
        })
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Serialize)]
pub struct AuthConfig {
    pub jwt: JwtConfig,

    pub cleanup: CleanupConfig,

    /// TOML file seeding the identity directory
    pub identity_seed_path: Option<PathBuf>,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: VarLookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            jwt: JwtConfig::from_vars(lookup)?,
            cleanup: CleanupConfig::from_vars(lookup)?,
            identity_seed_path: read_var(lookup, "IDENTITY_SEED_PATH").map(PathBuf::from),
        })
    }
}
