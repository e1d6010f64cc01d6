//! # AuthKit Core
//!
//! Token issuance and verification core for stateless authentication.
//! This crate contains the signed-token codec, the signing keystore with
//! zero-downtime rotation, the refresh-token rotation engine with reuse
//! detection, and the store traits a persistence layer must satisfy.
//!
//! Web framework glue, database adapters, and policy evaluation live in
//! consumer crates; they interact with this core exclusively through the
//! types and traits re-exported below.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::{
    FileKeystoreStore, InMemoryKeystoreStore, InMemoryRefreshTokenStore, KeystoreStore,
    RefreshTokenStore,
};
pub use services::*;
