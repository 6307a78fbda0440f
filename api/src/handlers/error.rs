//! Mapping of domain errors onto HTTP responses
//!
//! Token endpoint failures use the RFC 6749 error codes. Grant rejections
//! share one message so clients cannot tell which check failed. The bearer
//! middleware goes through the same mapping via [`ApiError`].

use std::fmt;

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};

use tw_core::errors::{AuthError, DomainError, TokenError, ValidationError};
use tw_shared::error_codes;

use crate::dto::{ErrorResponse, ErrorResponseExt};

const INVALID_GRANT_MESSAGE: &str = "The provided grant is invalid, expired or revoked";
const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Build a JSON error response
pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> HttpResponse {
    ErrorResponse::new(code, message).to_response(status)
}

/// Handle domain errors and convert them to appropriate HTTP responses
///
/// 401 responses carry `WWW-Authenticate: Bearer`.
pub fn handle_domain_error(error: &DomainError) -> HttpResponse {
    if error.is_fatal() {
        log::error!("Domain error: {}", error);
    } else {
        log::debug!("Request rejected: {}", error);
    }

    response_for(error)
}

fn response_for(error: &DomainError) -> HttpResponse {
    match error {
        DomainError::Validation(ValidationError::UnsupportedGrantType { .. }) => error_response(
            StatusCode::BAD_REQUEST,
            error_codes::UNSUPPORTED_GRANT_TYPE,
            error.to_string(),
        ),
        DomainError::Validation(_) => {
            error_response(StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST, error.to_string())
        }
        DomainError::Auth(AuthError::InvalidCredentials)
        | DomainError::Token(TokenError::InvalidRefreshToken) => {
            error_response(StatusCode::BAD_REQUEST, error_codes::INVALID_GRANT, INVALID_GRANT_MESSAGE)
        }
        DomainError::Auth(AuthError::AuthenticationRequired) => unauthorized(
            error_codes::AUTHENTICATION_REQUIRED,
            error,
        ),
        DomainError::Auth(AuthError::InvalidToken) => unauthorized(error_codes::INVALID_TOKEN, error),
        DomainError::Auth(AuthError::InsufficientPermissions) => {
            error_response(StatusCode::FORBIDDEN, error_codes::FORBIDDEN, error.to_string())
        }
        DomainError::Token(TokenError::TokenGenerationFailed)
        | DomainError::Store(_)
        | DomainError::Internal { .. } => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            INTERNAL_ERROR_MESSAGE,
        ),
    }
}

fn unauthorized(code: &str, error: &DomainError) -> HttpResponse {
    let mut response = error_response(StatusCode::UNAUTHORIZED, code, error.to_string());
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
    response
}

/// A [`DomainError`] usable as an actix error
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self(error)
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self(error.into())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        response_for(&self.0).status()
    }

    fn error_response(&self) -> HttpResponse {
        handle_domain_error(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tw_core::errors::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(DomainError, StatusCode)> = vec![
            (
                ValidationError::UnsupportedGrantType {
                    grant_type: "implicit".to_string(),
                }
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ValidationError::InvalidFormat {
                    field: "access_token_lifetime".to_string(),
                }
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::InvalidCredentials.into(), StatusCode::BAD_REQUEST),
            (TokenError::InvalidRefreshToken.into(), StatusCode::BAD_REQUEST),
            (AuthError::AuthenticationRequired.into(), StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken.into(), StatusCode::UNAUTHORIZED),
            (AuthError::InsufficientPermissions.into(), StatusCode::FORBIDDEN),
            (
                StoreError::Backend {
                    message: "down".to_string(),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(handle_domain_error(&error).status(), status, "{}", error);
        }
    }

    #[test]
    fn test_only_unauthorized_carries_challenge() {
        let response = ApiError::from(AuthError::InvalidToken).error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

        let response = ApiError::from(AuthError::InsufficientPermissions).error_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
