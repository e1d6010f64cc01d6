//! Refresh token store trait: the contract a persistence layer must satisfy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::refresh_token::RefreshTokenRecord;
use crate::errors::CoreResult;

/// Store contract for refresh token families.
///
/// Implementations must keep `token_hash` unique store-wide and make
/// [`create_child`](Self::create_child) atomic — it is the serialization
/// point that keeps a concurrent double-rotation from producing two live
/// current records.
///
/// # Security Considerations
/// - Only token hashes are stored; plaintext never reaches the store
/// - Rotated records are retained for reuse detection; only
///   [`cleanup_expired`](Self::cleanup_expired) physically deletes
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a new record.
    ///
    /// # Returns
    /// * `Ok(RefreshTokenRecord)` - The saved record
    /// * `Err` - `RefreshError::DuplicateTokenHash` if the hash exists
    async fn save(&self, record: RefreshTokenRecord) -> CoreResult<RefreshTokenRecord>;

    /// Find a record by the hash of the presented plaintext token.
    async fn find_by_hash(&self, token_hash: &str) -> CoreResult<Option<RefreshTokenRecord>>;

    /// All records belonging to a user, across families and states.
    async fn find_by_user(&self, user_id: Uuid) -> CoreResult<Vec<RefreshTokenRecord>>;

    /// Mark a record as rotated.
    ///
    /// # Returns
    /// * `Ok(true)` - Record was marked
    /// * `Ok(false)` - No record with that jti
    async fn mark_rotated(&self, jti: Uuid) -> CoreResult<bool>;

    /// Atomically mark the parent rotated and insert its child.
    ///
    /// Exactly one caller can consume a given parent: if the parent is
    /// already rotated the call fails with `RefreshError::RotationConflict`
    /// and nothing is written.
    async fn create_child(
        &self,
        parent_jti: Uuid,
        child: RefreshTokenRecord,
    ) -> CoreResult<RefreshTokenRecord>;

    /// Idempotently revoke every past and future record in a family.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records currently in the family
    async fn revoke_family(&self, family_id: Uuid) -> CoreResult<usize>;

    /// Whether a family has been revoked.
    async fn is_family_revoked(&self, family_id: Uuid) -> CoreResult<bool>;

    /// The full family chain, in creation order.
    async fn get_family(&self, family_id: Uuid) -> CoreResult<Vec<RefreshTokenRecord>>;

    /// Delete all records with `expires_at <= before`, regardless of state.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records deleted
    async fn cleanup_expired(&self, before: DateTime<Utc>) -> CoreResult<usize>;
}
