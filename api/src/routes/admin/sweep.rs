use actix_web::{web, HttpResponse};

use crate::app::AppState;
use crate::dto::SweepResponse;
use crate::middleware::auth::AuthContext;

/// Handler for POST /api/v1/admin/tokens/sweep
///
/// Runs one cleanup cycle immediately and reports what was removed.
pub async fn sweep(state: web::Data<AppState>, auth: AuthContext) -> HttpResponse {
    log::info!("Token sweep requested by {}", auth.identity.subject_id);

    let result = state.cleanup.run_cleanup().await;
    HttpResponse::Ok().json(SweepResponse::from(result))
}
