//! Domain layer containing the identity and token entities.

pub mod entities;

pub use entities::*;
