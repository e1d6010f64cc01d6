//! Store traits consumed by the core, plus reference implementations.

pub mod keystore;
pub mod refresh;

pub use keystore::{FileKeystoreStore, InMemoryKeystoreStore, KeystoreStore};
pub use refresh::{InMemoryRefreshTokenStore, RefreshTokenStore};
