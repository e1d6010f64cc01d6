//! Refresh token rotation: issuance, rotation with reuse detection, family
//! revocation, and background cleanup.

mod cleanup;
mod service;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupResult, RefreshCleanupConfig, RefreshCleanupService};
pub use service::{RefreshRotationService, RotatedRefreshToken};
