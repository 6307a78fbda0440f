//! Application state and factory
//!
//! This module holds the shared application state and builds the
//! actix-web application with its middleware and routes.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    error::InternalError,
    http::StatusCode,
    middleware::Logger,
    web, App, Error, HttpResponse,
};

use tw_core::services::auth::AuthService;
use tw_core::services::token::TokenCleanupService;
use tw_shared::{error_codes, HealthResponse, TokenStoreBackend};

use crate::handlers::error::error_response;
use crate::middleware::auth::{AccessTokenVerifier, JwtAuth};
use crate::routes::{admin, auth, oauth};

/// Maximum accepted request body for token and logout requests
const BODY_LIMIT_BYTES: usize = 16 * 1024;

/// State shared by every worker
pub struct AppState {
    /// Grant exchange and logout
    pub auth_service: Arc<AuthService>,
    /// Sweep of expired refresh tokens and blacklist entries
    pub cleanup: Arc<TokenCleanupService>,
    /// Backend reported by the health check
    pub token_store: TokenStoreBackend,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        cleanup: Arc<TokenCleanupService>,
        token_store: TokenStoreBackend,
    ) -> Self {
        Self {
            auth_service,
            cleanup,
            token_store,
        }
    }

    /// The verifier consulted by [`JwtAuth`]
    pub fn verifier(&self) -> Arc<dyn AccessTokenVerifier> {
        Arc::clone(self.auth_service.token_service()) as Arc<dyn AccessTokenVerifier>
    }
}

/// Create and configure the application with all dependencies
pub fn create_app(
    app_state: web::Data<AppState>,
    cors: Cors,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let verifier = web::Data::new(app_state.verifier());

    App::new()
        .app_data(app_state)
        .app_data(verifier)
        .app_data(json_config())
        .app_data(form_config())
        .wrap(cors)
        .wrap(Logger::default())
        // Health check endpoint
        .route("/health", web::get().to(health_check))
        // OAuth2 token endpoint
        .service(web::scope("/oauth").route("/token", web::post().to(oauth::token)))
        // API v1 routes
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/auth")
                        .wrap(JwtAuth::authenticated())
                        .route("/logout", web::post().to(auth::logout))
                        .route("/session", web::get().to(auth::session)),
                )
                .service(
                    web::scope("/admin")
                        .wrap(JwtAuth::require_roles([admin::ADMIN_ROLE]))
                        .route("/tokens/sweep", web::post().to(admin::sweep)),
                ),
        )
        // Default 404 handler
        .default_service(web::route().to(not_found))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(BODY_LIMIT_BYTES)
        .error_handler(|err, _req| {
            let response = error_response(StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST, err.to_string());
            InternalError::from_response(err, response).into()
        })
}

fn form_config() -> web::FormConfig {
    web::FormConfig::default()
        .limit(BODY_LIMIT_BYTES)
        .error_handler(|err, _req| {
            let response = error_response(StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST, err.to_string());
            InternalError::from_response(err, response).into()
        })
}

/// Health check endpoint handler
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::healthy(
        "timewise-api",
        env!("CARGO_PKG_VERSION"),
        state.token_store.to_string(),
    ))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    error_response(
        StatusCode::NOT_FOUND,
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    )
}
