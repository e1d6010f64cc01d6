//! Keystore persistence.

mod file;
mod memory;
#[path = "trait.rs"]
mod r#trait;

pub use file::FileKeystoreStore;
pub use memory::InMemoryKeystoreStore;
pub use r#trait::KeystoreStore;
