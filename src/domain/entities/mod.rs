//! Entity definitions.

pub mod claims;
pub mod refresh_token;

pub use claims::{Audience, Claims, TokenHeader};
pub use refresh_token::{
    hash_token, IssuedRefreshToken, OpaqueRefreshToken, RefreshTokenMetadata, RefreshTokenRecord,
};
