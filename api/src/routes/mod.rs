//! Route handlers grouped by scope

pub mod admin;
pub mod auth;
pub mod oauth;
