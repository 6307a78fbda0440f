//! Identity directory implementations

pub mod memory_directory;

pub use memory_directory::{InMemoryIdentityDirectory, SeedUser};
