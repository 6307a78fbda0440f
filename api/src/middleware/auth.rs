//! Bearer token middleware for protecting API endpoints.
//!
//! The middleware extracts the access token from the `Authorization`
//! header, verifies it through the [`AccessTokenVerifier`] registered as app
//! data, checks the caller's roles and injects an [`AuthContext`] into the
//! request.

use std::collections::BTreeSet;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::{
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::LocalBoxFuture;

use tw_core::domain::entities::{identity::Identity, token::Claims};
use tw_core::errors::{AuthError, DomainError};
use tw_core::services::token::TokenService;

use crate::handlers::error::ApiError;

/// Verifies access tokens on behalf of the middleware
///
/// Registered as `web::Data<Arc<dyn AccessTokenVerifier>>`.
#[async_trait]
pub trait AccessTokenVerifier: Send + Sync {
    /// Claims of a valid, unrevoked access token; `None` otherwise
    async fn verify_access_token(&self, token: &str) -> Option<Claims>;
}

#[async_trait]
impl AccessTokenVerifier for TokenService {
    async fn verify_access_token(&self, token: &str) -> Option<Claims> {
        self.verify_claims(token).await
    }
}

/// Authentication context injected into requests
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Identity carried by the access token
    pub identity: Identity,
    /// JWT ID of the access token
    pub jti: String,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
    /// The bearer token itself, needed to revoke it on logout
    pub raw_token: String,
}

impl AuthContext {
    pub fn from_claims(claims: Claims, raw_token: String) -> Option<Self> {
        let expires_at = claims.expires_at()?;
        Some(Self {
            identity: claims.identity(),
            jti: claims.jti,
            expires_at,
            raw_token,
        })
    }
}

/// Bearer authentication middleware factory
///
/// An empty role set admits any authenticated identity.
#[derive(Debug, Clone, Default)]
pub struct JwtAuth {
    allowed_roles: Rc<BTreeSet<String>>,
}

impl JwtAuth {
    /// Any valid access token
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// A valid access token whose identity holds at least one of `roles`
    pub fn require_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_roles: Rc::new(roles.into_iter().map(Into::into).collect()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            allowed_roles: Rc::clone(&self.allowed_roles),
        }))
    }
}

/// Bearer authentication middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    allowed_roles: Rc<BTreeSet<String>>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let allowed_roles = Rc::clone(&self.allowed_roles);

        Box::pin(async move {
            let context = match authenticate(&req, &allowed_roles).await {
                Ok(context) => context,
                Err(error) => return Ok(req.error_response(ApiError::from(error)).map_into_right_body()),
            };

            req.extensions_mut().insert(context);

            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}

/// Verifies the bearer token and checks the caller's roles
async fn authenticate(
    req: &ServiceRequest,
    allowed_roles: &BTreeSet<String>,
) -> Result<AuthContext, DomainError> {
    let token = extract_bearer_token(req).ok_or(AuthError::AuthenticationRequired)?;

    let verifier = req
        .app_data::<web::Data<Arc<dyn AccessTokenVerifier>>>()
        .cloned()
        .ok_or_else(|| DomainError::Internal {
            message: "No access token verifier registered".to_string(),
        })?;

    let context = verifier
        .verify_access_token(&token)
        .await
        .and_then(|claims| AuthContext::from_claims(claims, token))
        .ok_or(AuthError::InvalidToken)?;

    if !context.identity.has_any_role(allowed_roles) {
        log::debug!(
            "Subject {} lacks any of the roles {:?}",
            context.identity.subject_id,
            allowed_roles
        );
        return Err(AuthError::InsufficientPermissions.into());
    }

    Ok(context)
}

/// Extracts the token from `Authorization: Bearer <token>`
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return None;
    }

    Some(token.to_string())
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result: Result<Self, Error> = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::from(AuthError::AuthenticationRequired).into());

        ready(result)
    }
}
