use actix_web::http::{header, StatusCode};
use actix_web::{web, Either, HttpResponse};
use validator::Validate;

use tw_shared::error_codes;

use crate::app::AppState;
use crate::dto::{TokenRequest, TokenResponse};
use crate::handlers::error::{error_response, handle_domain_error};

/// Handler for POST /oauth/token
///
/// Accepts `application/json` or `application/x-www-form-urlencoded`.
///
/// # Request
///
/// ```json
/// { "grant_type": "password", "username": "buyer@timewise.io", "password": "..." }
/// { "grant_type": "refresh_token", "refresh_token": "..." }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "accessToken": "eyJ...",
///     "refreshToken": "...",
///     "expiresIn": 86400,
///     "tokenType": "Bearer"
/// }
/// ```
///
/// ## Errors
/// - 400 `invalid_request`: Missing or oversized fields
/// - 400 `unsupported_grant_type`: Grant other than `password` or `refresh_token`
/// - 400 `invalid_grant`: Bad credentials or unusable refresh token
/// - 500 `internal_error`: Token store failure
pub async fn token(
    state: web::Data<AppState>,
    body: Either<web::Json<TokenRequest>, web::Form<TokenRequest>>,
) -> HttpResponse {
    let request = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };

    if let Err(errors) = request.validate() {
        return error_response(StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST, errors.to_string());
    }

    let grant = match request.into_grant() {
        Ok(grant) => grant,
        Err(error) => return handle_domain_error(&error.into()),
    };

    match state.auth_service.exchange(grant).await {
        Ok(pair) => HttpResponse::Ok()
            .insert_header(header::CacheControl(vec![header::CacheDirective::NoStore]))
            .json(TokenResponse::from(pair)),
        Err(error) => handle_domain_error(&error),
    }
}
