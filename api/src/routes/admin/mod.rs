//! Administrative routes, restricted to the `admin` role

pub mod sweep;

pub use sweep::sweep;

/// Role required for every route in this scope
pub const ADMIN_ROLE: &str = "admin";
