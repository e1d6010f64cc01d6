//! Refresh token persistence.

mod memory;
#[path = "trait.rs"]
mod r#trait;

pub use memory::InMemoryRefreshTokenStore;
pub use r#trait::RefreshTokenStore;
