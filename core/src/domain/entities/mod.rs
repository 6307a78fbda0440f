//! Domain entities representing core business objects.

pub mod identity;
pub mod token;

pub use identity::Identity;
pub use token::{
    Claims, RefreshTokenRecord, TokenPair, ACCESS_TOKEN_TYPE, REFRESH_TOKEN_LENGTH,
};
