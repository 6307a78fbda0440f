use actix_web::{web, HttpResponse};

use crate::app::AppState;
use crate::dto::{LogoutRequest, LogoutResponse};
use crate::handlers::error::handle_domain_error;
use crate::middleware::auth::AuthContext;

/// Handler for POST /api/v1/auth/logout
///
/// Revokes the bearer access token. When the optional body carries a
/// refresh token, that token is deleted too.
///
/// # Headers
///
/// ```text
/// Authorization: Bearer {access_token}
/// ```
///
/// # Request (optional)
///
/// ```json
/// { "refreshToken": "..." }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "message": "Logged out successfully"
/// }
/// ```
///
/// ## Errors
/// - 401 Unauthorized: Missing or invalid access token
/// - 500 Internal Server Error: Token store failure
pub async fn logout(
    state: web::Data<AppState>,
    auth: AuthContext,
    body: Option<web::Json<LogoutRequest>>,
) -> HttpResponse {
    let refresh_token = body.and_then(|body| body.into_inner().refresh_token);

    match state
        .auth_service
        .logout(&auth.raw_token, refresh_token.as_deref())
        .await
    {
        Ok(()) => {
            log::info!("Subject {} logged out (jti {})", auth.identity.subject_id, auth.jti);
            HttpResponse::Ok().json(LogoutResponse {
                message: "Logged out successfully".to_string(),
            })
        }
        Err(error) => handle_domain_error(&error),
    }
}
