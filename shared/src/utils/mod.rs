//! Common utility functions

pub mod lifetime;
