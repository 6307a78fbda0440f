//! # TimeWise API
//!
//! actix-web surface of the token core: the OAuth2 token endpoint, logout,
//! session introspection and the role-gated admin sweep.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use app::{create_app, AppState};
