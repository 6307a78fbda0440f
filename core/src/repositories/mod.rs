pub mod identity;
pub mod token;

pub use identity::IdentityDirectory;
pub use token::{InMemoryTokenStore, TokenStore};

#[cfg(test)]
pub use identity::MockIdentityDirectory;
