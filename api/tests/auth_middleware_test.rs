//! Integration tests for the bearer authentication middleware

mod common;

use actix_cors::Cors;
use actix_web::{http::header, http::StatusCode, test, web, App, HttpResponse};
use serde_json::Value;

use tw_api::create_app;
use tw_api::dto::TokenResponse;
use tw_api::middleware::{AuthContext, JwtAuth};

use common::*;

#[actix_web::test]
async fn test_session_returns_identity() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone(), Cors::default())).await;

    let tokens: TokenResponse =
        test::call_and_read_body_json(&app, password_request(BUYER_EMAIL, BUYER_PASSWORD).to_request()).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/session")
        .insert_header(bearer(&tokens.access_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["subjectId"], "buyer-1");
    assert_eq!(body["email"], BUYER_EMAIL);
    assert_eq!(body["roles"], serde_json::json!(["buyer"]));
    assert_eq!(body["permissions"], serde_json::json!(["po:read"]));
    assert!(body["expiresAt"].is_string());
}

#[actix_web::test]
async fn test_missing_header_is_unauthorized() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone(), Cors::default())).await;

    let req = test::TestRequest::get().uri("/api/v1/auth/session").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "authentication_required");
}

#[actix_web::test]
async fn test_malformed_header_is_unauthorized() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone(), Cors::default())).await;

    for value in ["Basic dXNlcjpwdw==", "Bearer", "token-without-scheme"] {
        let req = test::TestRequest::get()
            .uri("/api/v1/auth/session")
            .insert_header((header::AUTHORIZATION, value))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "header {:?}", value);
    }
}

#[actix_web::test]
async fn test_invalid_token_is_unauthorized() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone(), Cors::default())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/session")
        .insert_header(bearer("not.a.jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_token");
}

#[actix_web::test]
async fn test_refresh_token_is_not_a_bearer_token() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone(), Cors::default())).await;

    let tokens: TokenResponse =
        test::call_and_read_body_json(&app, password_request(BUYER_EMAIL, BUYER_PASSWORD).to_request()).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/session")
        .insert_header(bearer(&tokens.refresh_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_admin_scope_requires_admin_role() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone(), Cors::default())).await;

    let buyer: TokenResponse =
        test::call_and_read_body_json(&app, password_request(BUYER_EMAIL, BUYER_PASSWORD).to_request()).await;
    let req = test::TestRequest::post()
        .uri("/api/v1/admin/tokens/sweep")
        .insert_header(bearer(&buyer.access_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(resp.headers().get(header::WWW_AUTHENTICATE).is_none());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "forbidden");

    let admin: TokenResponse =
        test::call_and_read_body_json(&app, password_request(ADMIN_EMAIL, ADMIN_PASSWORD).to_request()).await;
    let req = test::TestRequest::post()
        .uri("/api/v1/admin/tokens/sweep")
        .insert_header(bearer(&admin.access_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["expiredTokensDeleted"], 0);
    assert_eq!(body["blacklistEntriesDeleted"], 0);
    assert_eq!(body["errors"], serde_json::json!([]));
}

#[actix_web::test]
async fn test_missing_verifier_fails_closed() {
    let ctx = test_context();
    let token = ctx
        .token_service
        .issue(&tw_core::domain::entities::identity::Identity::new("u1", "u1@timewise.io"))
        .await
        .unwrap()
        .access_token;

    // No verifier registered as app data.
    let app = test::init_service(
        App::new().service(
            web::scope("/protected")
                .wrap(JwtAuth::authenticated())
                .route("", web::get().to(|auth: AuthContext| async move {
                    HttpResponse::Ok().body(auth.identity.subject_id)
                })),
        ),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn test_custom_scope_with_verifier() {
    let ctx = test_context();
    let token = ctx
        .token_service
        .issue(&tw_core::domain::entities::identity::Identity::new("u1", "u1@timewise.io").with_roles(["auditor"]))
        .await
        .unwrap()
        .access_token;

    let app = test::init_service(
        App::new().app_data(web::Data::new(ctx.state.verifier())).service(
            web::scope("/audit")
                .wrap(JwtAuth::require_roles(["auditor", "admin"]))
                .route("", web::get().to(|auth: AuthContext| async move {
                    HttpResponse::Ok().body(auth.identity.subject_id)
                })),
        ),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/audit")
        .insert_header(bearer(&token))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "u1");
}
