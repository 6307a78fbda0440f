//! Supported OAuth2 grants

use crate::errors::ValidationError;

/// A validated token request
#[derive(Clone, PartialEq, Eq)]
pub enum TokenGrant {
    /// Resource owner password credentials
    Password { username: String, password: String },
    /// Exchange of a previously issued refresh token
    RefreshToken { refresh_token: String },
}

impl TokenGrant {
    pub const PASSWORD: &'static str = "password";
    pub const REFRESH_TOKEN: &'static str = "refresh_token";

    /// Builds a grant from the loose fields of a token request
    ///
    /// # Errors
    ///
    /// * `RequiredField` - `grant_type` or a field the grant needs is missing
    /// * `UnsupportedGrantType` - Any grant other than `password` and `refresh_token`
    pub fn from_parts(
        grant_type: Option<&str>,
        username: Option<String>,
        password: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<Self, ValidationError> {
        let grant_type = grant_type
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .ok_or_else(|| required("grant_type"))?;

        match grant_type {
            Self::PASSWORD => Ok(Self::Password {
                username: non_empty(username).ok_or_else(|| required("username"))?,
                password: password.filter(|p| !p.is_empty()).ok_or_else(|| required("password"))?,
            }),
            Self::REFRESH_TOKEN => Ok(Self::RefreshToken {
                refresh_token: non_empty(refresh_token).ok_or_else(|| required("refresh_token"))?,
            }),
            other => Err(ValidationError::UnsupportedGrantType {
                grant_type: other.to_string(),
            }),
        }
    }

    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::Password { .. } => Self::PASSWORD,
            Self::RefreshToken { .. } => Self::REFRESH_TOKEN,
        }
    }
}

// Credentials and tokens stay out of logs.
impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::RefreshToken { .. } => f
                .debug_struct("RefreshToken")
                .field("refresh_token", &"<redacted>")
                .finish(),
        }
    }
}

fn required(field: &str) -> ValidationError {
    ValidationError::RequiredField {
        field: field.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
