//! Keystore manager: explicit initialization, scheduled rotation, and the
//! public discovery surface.
//!
//! The manager is constructed explicitly through a fallible `initialize`
//! step rather than a lazily-initialized global, so startup failures are
//! observable. Rotation persists the new keystore before swapping it into
//! memory: a mid-rotation write failure leaves the old active key in place,
//! never an in-memory key with no persisted record.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::entities::claims::Claims;
use crate::errors::{CoreError, CoreResult};
use crate::repositories::KeystoreStore;
use crate::services::codec;

use super::algorithm::SigningAlgorithm;
use super::keystore::{Keystore, RotationPolicy};
use super::material::{JwkSet, VerificationKey};

/// Administrative snapshot of keystore state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeystoreStats {
    pub active_kid: String,
    pub active_key_age_days: i64,
    pub retired_keys: usize,
    pub rotation_due: bool,
}

#[derive(Debug)]
struct CachedJwks {
    document: JwkSet,
    refreshed_at: DateTime<Utc>,
}

#[derive(Debug)]
struct ManagerState {
    keystore: Keystore,
    jwks_cache: Option<CachedJwks>,
}

/// Owns the keystore for a process: loads or creates it at startup, rotates
/// on schedule, and serves signing and verification material.
#[derive(Debug)]
pub struct KeystoreManager<S: KeystoreStore> {
    store: S,
    algorithm: SigningAlgorithm,
    policy: RotationPolicy,
    // Rotation is serialized per process; cross-process overlap of two new
    // active keys is absorbed by the overlap window.
    state: Mutex<ManagerState>,
}

impl<S: KeystoreStore> KeystoreManager<S> {
    /// Loads the persisted keystore or creates and persists a fresh one,
    /// then runs an immediate rotation check.
    ///
    /// A failed rotation check is logged and retried on schedule; it never
    /// fails startup. A failed load or create does.
    pub async fn initialize(
        store: S,
        algorithm: SigningAlgorithm,
        policy: RotationPolicy,
    ) -> CoreResult<Self> {
        policy.validate()?;

        let keystore = match store.load().await? {
            Some(document) => {
                let keystore = Keystore::from_document(&document)?;
                info!(kid = %keystore.active().kid, "loaded persisted keystore");
                keystore
            }
            None => {
                let keystore = Keystore::create(algorithm)?;
                store.save(&keystore.to_document()).await?;
                info!(kid = %keystore.active().kid, "created fresh keystore");
                keystore
            }
        };

        let manager = Self {
            store,
            algorithm,
            policy,
            state: Mutex::new(ManagerState {
                keystore,
                jwks_cache: None,
            }),
        };

        if let Err(e) = manager.rotate_if_due().await {
            warn!(error = %e, "startup rotation check failed; will retry on schedule");
        }

        Ok(manager)
    }

    /// Rotates when the active key has outlived the policy. Returns whether
    /// a rotation happened.
    pub async fn rotate_if_due(&self) -> CoreResult<bool> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        if !state.keystore.needs_rotation(&self.policy, now) {
            return Ok(false);
        }
        self.rotate_locked(&mut state, now).await?;
        Ok(true)
    }

    /// Rotates immediately regardless of key age. Returns the new active kid.
    pub async fn force_rotate(&self) -> CoreResult<String> {
        let mut state = self.state.lock().await;
        self.rotate_locked(&mut state, Utc::now()).await?;
        Ok(state.keystore.active().kid.clone())
    }

    // Persist-then-swap: the rotated keystore is written through the store
    // before the in-memory copy changes.
    async fn rotate_locked(&self, state: &mut ManagerState, now: DateTime<Utc>) -> CoreResult<()> {
        let old_kid = state.keystore.active().kid.clone();
        let rotated = state.keystore.rotate(self.algorithm, &self.policy, now)?;
        self.store.save(&rotated.to_document()).await?;
        info!(
            old_kid = %old_kid,
            new_kid = %rotated.active().kid,
            retired = rotated.previous().len(),
            "signing key rotated"
        );
        state.keystore = rotated;
        state.jwks_cache = None;
        Ok(())
    }

    /// Signs claims with the active key.
    pub async fn sign_claims(&self, claims: &Claims) -> CoreResult<String> {
        let state = self.state.lock().await;
        codec::sign(claims, state.keystore.active()).map_err(CoreError::from)
    }

    /// Kid of the current active key.
    pub async fn active_kid(&self) -> String {
        self.state.lock().await.keystore.active().kid.clone()
    }

    /// Candidate verification keys, active key first.
    pub async fn verification_keys(&self) -> CoreResult<Vec<VerificationKey>> {
        let state = self.state.lock().await;
        state.keystore.verification_keys().map_err(CoreError::from)
    }

    /// Public JWKS document, cached for `max_age` so verifiers pick up
    /// rotations within minutes without a live keystore connection.
    pub async fn jwks_document(&self, max_age: Duration) -> JwkSet {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        if let Some(cache) = &state.jwks_cache {
            if now - cache.refreshed_at < max_age {
                return cache.document.clone();
            }
        }
        let document = state.keystore.export_public_jwks();
        state.jwks_cache = Some(CachedJwks {
            document: document.clone(),
            refreshed_at: now,
        });
        document
    }

    /// Administrative stats: active kid, key age, retired count, due flag.
    pub async fn stats(&self) -> KeystoreStats {
        let state = self.state.lock().await;
        let now = Utc::now();
        KeystoreStats {
            active_kid: state.keystore.active().kid.clone(),
            active_key_age_days: (now - state.keystore.active().created_at).num_days(),
            retired_keys: state.keystore.previous().len(),
            rotation_due: state.keystore.needs_rotation(&self.policy, now),
        }
    }
}

impl<S: KeystoreStore + 'static> KeystoreManager<S> {
    /// Polls `rotate_if_due` at `interval` in a background task. Errors are
    /// logged and the task keeps running.
    pub fn start_rotation_task(self: Arc<Self>, interval: std::time::Duration) {
        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "keystore rotation task started");
            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                if let Err(e) = self.rotate_if_due().await {
                    error!(error = %e, "scheduled rotation failed");
                }
            }
        });
    }
}
