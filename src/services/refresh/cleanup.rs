//! Background sweep of expired refresh token records.
//!
//! Rotated and revoked records are kept around for reuse detection, so the
//! sweep is the only place records are physically deleted — and only once
//! they are past expiry plus a grace period.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use crate::errors::CoreResult;
use crate::repositories::RefreshTokenStore;

/// Configuration for the refresh token cleanup service.
#[derive(Debug, Clone)]
pub struct RefreshCleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Grace period after expiry before deletion (in days)
    pub grace_period_days: i64,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for RefreshCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600, // Run every hour
            grace_period_days: 7,   // Keep expired records for 7 days
            enabled: true,
        }
    }
}

/// Result of a cleanup cycle.
#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Number of expired records deleted
    pub expired_deleted: usize,
    /// Any errors encountered during cleanup
    pub errors: Vec<String>,
}

impl CleanupResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Service for cleaning up expired refresh token records.
pub struct RefreshCleanupService<S: RefreshTokenStore + 'static> {
    store: Arc<S>,
    config: RefreshCleanupConfig,
}

impl<S: RefreshTokenStore> RefreshCleanupService<S> {
    pub fn new(store: Arc<S>, config: RefreshCleanupConfig) -> Self {
        Self { store, config }
    }

    /// Run a single cleanup cycle.
    pub async fn run_cleanup(&self) -> CoreResult<CleanupResult> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        let cutoff = Utc::now() - Duration::days(self.config.grace_period_days);
        let mut result = CleanupResult::default();

        match self.store.cleanup_expired(cutoff).await {
            Ok(count) => {
                result.expired_deleted = count;
                info!("Deleted {} expired refresh token records", count);
            }
            Err(e) => {
                error!("Failed to cleanup expired refresh tokens: {}", e);
                result.errors.push(format!("Cleanup error: {}", e));
            }
        }

        Ok(result)
    }

    /// Start the cleanup service as a background task.
    pub fn start_background_task(self: Arc<Self>) {
        if !self.config.enabled {
            warn!("Refresh token cleanup service is disabled");
            return;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds);

        tokio::spawn(async move {
            info!(
                "Refresh token cleanup service started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                match self.run_cleanup().await {
                    Ok(result) => {
                        if !result.is_success() {
                            warn!("Cleanup completed with errors: {:?}", result.errors);
                        }
                    }
                    Err(e) => {
                        error!("Refresh token cleanup cycle failed: {}", e);
                    }
                }
            }
        });
    }
}
