//! # TimeWise Core
//!
//! Token and session lifecycle for the TimeWise backend: domain entities,
//! the token store and identity directory interfaces, the token service
//! (issue, verify, refresh, revoke), the periodic cleanup task and the
//! OAuth grant service.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
