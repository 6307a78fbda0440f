//! Authenticated session routes
//!
//! - Logout
//! - Session introspection

pub mod logout;
pub mod session;

pub use logout::logout;
pub use session::session;
