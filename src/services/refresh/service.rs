//! Refresh token rotation engine.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::entities::refresh_token::{
    hash_token, IssuedRefreshToken, OpaqueRefreshToken, RefreshTokenMetadata, RefreshTokenRecord,
};
use crate::errors::{CoreError, CoreResult, RefreshError};
use crate::repositories::RefreshTokenStore;

/// Outcome of a successful rotation.
#[derive(Debug, Clone)]
pub struct RotatedRefreshToken {
    /// The new plaintext token, handed to the client exactly once.
    pub token: String,
    /// The persisted record for the new token.
    pub record: RefreshTokenRecord,
    /// Owner of the family, resolved from the presented token.
    pub user_id: Uuid,
}

/// Stateful rotation protocol over an injected store.
///
/// Tokens are grouped into families descended from one login; rotation
/// links records forward through `parent_jti`, and presenting a token that
/// already has a child is treated as theft: the whole family is revoked
/// before the call fails.
pub struct RefreshRotationService<S: RefreshTokenStore> {
    store: S,
}

impl<S: RefreshTokenStore> RefreshRotationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store, mainly for administrative queries.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Issues the first token of a new family (login).
    pub async fn issue(
        &self,
        user_id: Uuid,
        ttl: Duration,
        metadata: RefreshTokenMetadata,
    ) -> CoreResult<IssuedRefreshToken> {
        let opaque = OpaqueRefreshToken::mint(Uuid::new_v4());
        let token = opaque.encode();
        let record = RefreshTokenRecord::new(user_id, &opaque, ttl, None, metadata);
        let record = self.store.save(record).await?;
        info!(family_id = %record.family_id, jti = %record.jti, "issued refresh token family");
        Ok(IssuedRefreshToken { token, record })
    }

    /// Rotates a presented token: the presented record is marked rotated and
    /// a new current record is minted in the same family.
    ///
    /// Reuse of an already-rotated token revokes the entire family before
    /// rejecting; that side effect is the theft-containment step and happens
    /// even though the call fails.
    pub async fn rotate(
        &self,
        presented: &str,
        ttl: Duration,
        metadata: RefreshTokenMetadata,
    ) -> CoreResult<RotatedRefreshToken> {
        let presented_hash = hash_token(presented);
        let record = self
            .store
            .find_by_hash(&presented_hash)
            .await?
            .ok_or(RefreshError::InvalidRefreshToken)?;

        if record.is_expired() {
            return Err(RefreshError::RefreshTokenExpired.into());
        }

        if self.store.is_family_revoked(record.family_id).await? {
            return Err(RefreshError::FamilyRevoked.into());
        }

        // Reuse is "this record has a known child in the family", not a flag
        // on the record itself: the legitimate next token must never be
        // mistaken for the reused one.
        let family = self.store.get_family(record.family_id).await?;
        if family.iter().any(|r| r.parent_jti == Some(record.jti)) {
            warn!(
                family_id = %record.family_id,
                jti = %record.jti,
                "refresh token reuse detected; revoking family"
            );
            self.store.revoke_family(record.family_id).await?;
            return Err(RefreshError::ReuseDetected.into());
        }

        let opaque = OpaqueRefreshToken::mint(record.family_id);
        let token = opaque.encode();
        let child =
            RefreshTokenRecord::new(record.user_id, &opaque, ttl, Some(record.jti), metadata);

        match self.store.create_child(record.jti, child).await {
            Ok(saved) => Ok(RotatedRefreshToken {
                token,
                user_id: saved.user_id,
                record: saved,
            }),
            // Lost the race against a concurrent rotation of the same token.
            // The winner has already committed, so this presentation is
            // indistinguishable from replay; fail closed.
            Err(CoreError::Refresh(RefreshError::RotationConflict)) => {
                warn!(
                    family_id = %record.family_id,
                    jti = %record.jti,
                    "concurrent rotation conflict; revoking family"
                );
                self.store.revoke_family(record.family_id).await?;
                Err(RefreshError::ReuseDetected.into())
            }
            Err(e) => Err(e),
        }
    }

    /// Idempotently revokes every record in a family. Returns the number of
    /// records the family holds.
    pub async fn revoke_family(&self, family_id: Uuid) -> CoreResult<usize> {
        let count = self.store.revoke_family(family_id).await?;
        info!(family_id = %family_id, records = count, "refresh token family revoked");
        Ok(count)
    }

    /// Revokes every family belonging to a user (logout everywhere).
    pub async fn revoke_user(&self, user_id: Uuid) -> CoreResult<usize> {
        let records = self.store.find_by_user(user_id).await?;
        let mut families: Vec<Uuid> = records.iter().map(|r| r.family_id).collect();
        families.sort_unstable();
        families.dedup();

        let mut revoked = 0;
        for family_id in families {
            revoked += self.store.revoke_family(family_id).await?;
        }
        Ok(revoked)
    }

    /// Deletes all records expired at or before `before`, regardless of
    /// state. The only operation that physically deletes.
    pub async fn cleanup(&self, before: DateTime<Utc>) -> CoreResult<usize> {
        self.store.cleanup_expired(before).await
    }
}
