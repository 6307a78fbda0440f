//! OAuth2 grant handling
//!
//! Turns `password` and `refresh_token` grants into token pairs and handles
//! logout.

mod grant;
mod service;


pub use grant::TokenGrant;
pub use service::AuthService;
