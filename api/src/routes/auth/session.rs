use actix_web::HttpResponse;

use crate::dto::SessionResponse;
use crate::middleware::auth::AuthContext;

/// Handler for GET /api/v1/auth/session
///
/// Returns the identity attached by the bearer middleware.
pub async fn session(auth: AuthContext) -> HttpResponse {
    let identity = auth.identity;

    HttpResponse::Ok().json(SessionResponse {
        subject_id: identity.subject_id,
        email: identity.email,
        roles: identity.roles,
        permissions: identity.permissions,
        expires_at: auth.expires_at,
    })
}
