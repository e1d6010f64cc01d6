use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::refresh_token::{
    OpaqueRefreshToken, RefreshTokenMetadata, RefreshTokenRecord,
};
use crate::repositories::{InMemoryRefreshTokenStore, RefreshTokenStore};
use crate::services::refresh::{RefreshCleanupConfig, RefreshCleanupService};

async fn seed_record(store: &InMemoryRefreshTokenStore, expires_at_offset: Duration) {
    let opaque = OpaqueRefreshToken::mint(Uuid::new_v4());
    let mut record = RefreshTokenRecord::new(
        Uuid::new_v4(),
        &opaque,
        Duration::days(7),
        None,
        RefreshTokenMetadata::default(),
    );
    record.expires_at = Utc::now() + expires_at_offset;
    store.save(record).await.unwrap();
}

#[tokio::test]
async fn test_disabled_cleanup_is_a_noop() {
    let store = Arc::new(InMemoryRefreshTokenStore::new());
    seed_record(&store, Duration::days(-30)).await;

    let config = RefreshCleanupConfig {
        enabled: false,
        ..Default::default()
    };
    let service = RefreshCleanupService::new(store.clone(), config);

    let result = service.run_cleanup().await.unwrap();
    assert!(result.is_success());
    assert_eq!(result.expired_deleted, 0);
}

#[tokio::test]
async fn test_cleanup_respects_the_grace_period() {
    let store = Arc::new(InMemoryRefreshTokenStore::new());
    // Past expiry plus grace.
    seed_record(&store, Duration::days(-30)).await;
    // Expired, but still inside the grace window.
    seed_record(&store, Duration::hours(-1)).await;
    // Live.
    seed_record(&store, Duration::days(7)).await;

    let config = RefreshCleanupConfig {
        grace_period_days: 7,
        ..Default::default()
    };
    let service = RefreshCleanupService::new(store.clone(), config);

    let result = service.run_cleanup().await.unwrap();
    assert!(result.is_success());
    assert_eq!(result.expired_deleted, 1);
}

#[tokio::test]
async fn test_zero_grace_deletes_anything_already_expired() {
    let store = Arc::new(InMemoryRefreshTokenStore::new());
    seed_record(&store, Duration::hours(-1)).await;
    seed_record(&store, Duration::days(7)).await;

    let config = RefreshCleanupConfig {
        grace_period_days: 0,
        ..Default::default()
    };
    let service = RefreshCleanupService::new(store, config);

    let result = service.run_cleanup().await.unwrap();
    assert_eq!(result.expired_deleted, 1);
}
