//! Domain-specific error types and error handling.

mod types;

pub use types::{AuthError, StoreError, TokenError, ValidationError};

use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    /// Store failures are fatal and must not be retried
    pub fn is_fatal(&self) -> bool {
        matches!(self, DomainError::Store(_) | DomainError::Internal { .. })
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: DomainError = TokenError::InvalidRefreshToken.into();
        assert!(matches!(err, DomainError::Token(TokenError::InvalidRefreshToken)));
        assert!(!err.is_fatal());

        let err: DomainError = StoreError::Backend {
            message: "connection reset".to_string(),
        }
        .into();
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Token store failure: connection reset");
    }

    #[test]
    fn test_validation_message() {
        let err: DomainError = ValidationError::RequiredField {
            field: "subject_id".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Field required: subject_id");
    }
}
