//! OAuth2 token endpoint

pub mod token;

pub use token::token;
