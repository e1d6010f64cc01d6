//! In-memory refresh token store.
//!
//! Reference implementation of [`RefreshTokenStore`]: a single `RwLock`
//! write section is what makes `create_child` atomic. Useful as a test
//! double and as the semantics blueprint for database-backed stores.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::refresh_token::RefreshTokenRecord;
use crate::errors::{CoreError, CoreResult, RefreshError};

use super::r#trait::RefreshTokenStore;

#[derive(Default)]
struct StoreInner {
    /// Keyed by token hash; hashes are unique store-wide.
    records: HashMap<String, RefreshTokenRecord>,
    revoked_families: HashSet<Uuid>,
}

impl StoreInner {
    fn hash_for_jti(&self, jti: Uuid) -> Option<String> {
        self.records
            .values()
            .find(|r| r.jti == jti)
            .map(|r| r.token_hash.clone())
    }
}

/// In-memory [`RefreshTokenStore`].
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn save(&self, record: RefreshTokenRecord) -> CoreResult<RefreshTokenRecord> {
        let mut inner = self.inner.write().await;
        if inner.records.contains_key(&record.token_hash) {
            return Err(RefreshError::DuplicateTokenHash.into());
        }
        inner
            .records
            .insert(record.token_hash.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_hash(&self, token_hash: &str) -> CoreResult<Option<RefreshTokenRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(token_hash).cloned())
    }

    async fn find_by_user(&self, user_id: Uuid) -> CoreResult<Vec<RefreshTokenRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_rotated(&self, jti: Uuid) -> CoreResult<bool> {
        let mut inner = self.inner.write().await;
        let Some(hash) = inner.hash_for_jti(jti) else {
            return Ok(false);
        };
        if let Some(record) = inner.records.get_mut(&hash) {
            if record.rotated_at.is_none() {
                record.rotated_at = Some(Utc::now());
            }
            return Ok(true);
        }
        Ok(false)
    }

    async fn create_child(
        &self,
        parent_jti: Uuid,
        child: RefreshTokenRecord,
    ) -> CoreResult<RefreshTokenRecord> {
        // Single write section: the rotated-check and both writes commit
        // together, so exactly one concurrent caller can consume the parent.
        let mut inner = self.inner.write().await;

        let Some(parent_hash) = inner.hash_for_jti(parent_jti) else {
            return Err(CoreError::NotFound {
                resource: format!("refresh token {}", parent_jti),
            });
        };
        let parent = inner.records.get(&parent_hash).cloned().ok_or_else(|| {
            CoreError::NotFound {
                resource: format!("refresh token {}", parent_jti),
            }
        })?;

        if parent.rotated_at.is_some() {
            return Err(RefreshError::RotationConflict.into());
        }
        if inner.records.contains_key(&child.token_hash) {
            return Err(RefreshError::DuplicateTokenHash.into());
        }
        // Children never cross family or user boundaries.
        if child.family_id != parent.family_id || child.user_id != parent.user_id {
            return Err(CoreError::Validation {
                message: "child record does not belong to the parent's family".to_string(),
            });
        }

        if let Some(record) = inner.records.get_mut(&parent_hash) {
            record.rotated_at = Some(Utc::now());
        }
        inner
            .records
            .insert(child.token_hash.clone(), child.clone());
        Ok(child)
    }

    async fn revoke_family(&self, family_id: Uuid) -> CoreResult<usize> {
        let mut inner = self.inner.write().await;
        inner.revoked_families.insert(family_id);
        Ok(inner
            .records
            .values()
            .filter(|r| r.family_id == family_id)
            .count())
    }

    async fn is_family_revoked(&self, family_id: Uuid) -> CoreResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.revoked_families.contains(&family_id))
    }

    async fn get_family(&self, family_id: Uuid) -> CoreResult<Vec<RefreshTokenRecord>> {
        let inner = self.inner.read().await;
        let mut family: Vec<RefreshTokenRecord> = inner
            .records
            .values()
            .filter(|r| r.family_id == family_id)
            .cloned()
            .collect();
        family.sort_by_key(|r| r.created_at);
        Ok(family)
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> CoreResult<usize> {
        let mut inner = self.inner.write().await;
        let initial = inner.records.len();
        inner.records.retain(|_, r| r.expires_at > before);
        // A revocation marker only matters while the family still has
        // records; drop markers for families the sweep emptied out.
        let live_families: HashSet<Uuid> =
            inner.records.values().map(|r| r.family_id).collect();
        inner.revoked_families.retain(|f| live_families.contains(f));
        Ok(initial - inner.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::refresh_token::{
        OpaqueRefreshToken, RefreshTokenMetadata, RefreshTokenRecord,
    };
    use chrono::Duration;

    fn record_for(family: Uuid, user: Uuid, parent: Option<Uuid>) -> RefreshTokenRecord {
        let opaque = OpaqueRefreshToken::mint(family);
        RefreshTokenRecord::new(
            user,
            &opaque,
            Duration::days(7),
            parent,
            RefreshTokenMetadata::default(),
        )
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_hash() {
        let store = InMemoryRefreshTokenStore::new();
        let record = record_for(Uuid::new_v4(), Uuid::new_v4(), None);

        store.save(record.clone()).await.unwrap();
        let err = store.save(record).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Refresh(RefreshError::DuplicateTokenHash)
        ));
    }

    #[tokio::test]
    async fn test_create_child_conflicts_on_rotated_parent() {
        let store = InMemoryRefreshTokenStore::new();
        let family = Uuid::new_v4();
        let user = Uuid::new_v4();
        let parent = store.save(record_for(family, user, None)).await.unwrap();

        let first = record_for(family, user, Some(parent.jti));
        store.create_child(parent.jti, first).await.unwrap();

        let second = record_for(family, user, Some(parent.jti));
        let err = store.create_child(parent.jti, second).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Refresh(RefreshError::RotationConflict)
        ));

        // Exactly two records, one rotated.
        let chain = store.get_family(family).await.unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.iter().filter(|r| r.is_rotated()).count(), 1);
    }

    #[tokio::test]
    async fn test_create_child_rejects_foreign_family() {
        let store = InMemoryRefreshTokenStore::new();
        let user = Uuid::new_v4();
        let parent = store
            .save(record_for(Uuid::new_v4(), user, None))
            .await
            .unwrap();

        let foreign = record_for(Uuid::new_v4(), user, Some(parent.jti));
        let err = store.create_child(parent.jti, foreign).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_revoke_family_is_idempotent() {
        let store = InMemoryRefreshTokenStore::new();
        let family = Uuid::new_v4();
        store
            .save(record_for(family, Uuid::new_v4(), None))
            .await
            .unwrap();

        assert_eq!(store.revoke_family(family).await.unwrap(), 1);
        assert_eq!(store.revoke_family(family).await.unwrap(), 1);
        assert!(store.is_family_revoked(family).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_rotated_sets_the_timestamp_exactly_once() {
        let store = InMemoryRefreshTokenStore::new();
        let record = store
            .save(record_for(Uuid::new_v4(), Uuid::new_v4(), None))
            .await
            .unwrap();

        assert!(store.mark_rotated(record.jti).await.unwrap());
        let first = store
            .find_by_hash(&record.token_hash)
            .await
            .unwrap()
            .unwrap()
            .rotated_at
            .unwrap();

        // A second mark is acknowledged but keeps the original timestamp.
        assert!(store.mark_rotated(record.jti).await.unwrap());
        let second = store
            .find_by_hash(&record.token_hash)
            .await
            .unwrap()
            .unwrap()
            .rotated_at
            .unwrap();
        assert_eq!(second, first);

        assert!(!store.mark_rotated(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_only_deletes_records_past_cutoff() {
        let store = InMemoryRefreshTokenStore::new();
        let family = Uuid::new_v4();
        let user = Uuid::new_v4();

        let mut expired = record_for(family, user, None);
        expired.expires_at = Utc::now() - Duration::days(1);
        // Expired records are deleted regardless of rotation state.
        expired.rotated_at = Some(Utc::now() - Duration::days(2));
        store.save(expired).await.unwrap();
        store.save(record_for(family, user, None)).await.unwrap();

        let deleted = store.cleanup_expired(Utc::now()).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.get_family(family).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_drops_revocations_for_emptied_families() {
        let store = InMemoryRefreshTokenStore::new();
        let user = Uuid::new_v4();

        // Family whose only record the sweep deletes.
        let emptied = Uuid::new_v4();
        let mut expired = record_for(emptied, user, None);
        expired.expires_at = Utc::now() - Duration::days(1);
        store.save(expired).await.unwrap();
        store.revoke_family(emptied).await.unwrap();

        // Revoked family with a live record.
        let live = Uuid::new_v4();
        store.save(record_for(live, user, None)).await.unwrap();
        store.revoke_family(live).await.unwrap();

        assert_eq!(store.cleanup_expired(Utc::now()).await.unwrap(), 1);

        assert!(!store.is_family_revoked(emptied).await.unwrap());
        assert!(store.is_family_revoked(live).await.unwrap());
    }
}
