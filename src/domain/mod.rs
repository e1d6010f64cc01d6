//! Domain entities for tokens and refresh-token families.

pub mod entities;

pub use entities::*;
