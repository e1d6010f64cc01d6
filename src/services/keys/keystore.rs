//! Keystore: one active signing key plus retired-but-verifiable keys.
//!
//! Pure state transitions only; persistence goes through
//! [`KeystoreStore`](crate::repositories::KeystoreStore) and scheduling
//! through [`KeystoreManager`](super::manager::KeystoreManager). The retired
//! list keeps public material alive for the overlap window so rotation never
//! invalidates in-flight tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::KeyError;

use super::algorithm::SigningAlgorithm;
use super::material::{Jwk, JwkSet, KeyPairRecord, VerificationKey};

/// Rotation policy: how long a key signs, and how long it verifies after
/// being retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationPolicy {
    /// Days a key stays active before rotation is due.
    pub rotation_days: i64,
    /// Days a retired key remains verifiable.
    pub overlap_days: i64,
}

impl RotationPolicy {
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.rotation_days <= 0 {
            return Err(KeyError::InvalidRotationPolicy {
                message: "rotation_days must be positive".to_string(),
            });
        }
        if self.overlap_days <= 0 {
            return Err(KeyError::InvalidRotationPolicy {
                message: "overlap_days must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            rotation_days: 30,
            overlap_days: 7,
        }
    }
}

/// A retired key: public material only, with its overlap window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetiredKey {
    pub kid: String,
    pub algorithm: SigningAlgorithm,
    pub public_jwk: Jwk,
    pub retired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RetiredKey {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Ordered collection of retired keys, newest first.
///
/// The only mutations are `retire` and `prune`, which is what keeps the
/// keystore invariants (public-only entries, no kid reuse via surgery) out
/// of caller hands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetiredKeys(Vec<RetiredKey>);

impl RetiredKeys {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    fn retire(&mut self, key: RetiredKey) {
        self.0.insert(0, key);
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        self.0.retain(|k| !k.is_expired(now));
    }

    pub fn iter(&self) -> impl Iterator<Item = &RetiredKey> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_kid(&self, kid: &str) -> bool {
        self.0.iter().any(|k| k.kid == kid)
    }

    pub fn find(&self, kid: &str) -> Option<&RetiredKey> {
        self.0.iter().find(|k| k.kid == kid)
    }
}

/// Result of a kid lookup: private material is only ever exposed for the
/// active key.
#[derive(Debug)]
pub enum KeyLookup<'a> {
    Active(&'a KeyPairRecord),
    Retired(&'a RetiredKey),
}

/// Persisted form of a keystore. Private material for the active key only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreDocument {
    pub active: ActiveKeyDocument,
    pub previous: Vec<RetiredKey>,
}

/// Persisted active key: its private JWK and creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveKeyDocument {
    pub jwk: Jwk,
    pub created_at: DateTime<Utc>,
}

/// One active signing key plus a bounded list of retired verification keys.
#[derive(Debug, Clone)]
pub struct Keystore {
    active: KeyPairRecord,
    previous: RetiredKeys,
}

impl Keystore {
    /// Creates a keystore with one fresh active key and no retired keys.
    pub fn create(algorithm: SigningAlgorithm) -> Result<Self, KeyError> {
        Ok(Self {
            active: KeyPairRecord::generate(algorithm)?,
            previous: RetiredKeys::new(),
        })
    }

    /// The current signing key.
    pub fn active(&self) -> &KeyPairRecord {
        &self.active
    }

    /// Retired keys, newest first.
    pub fn previous(&self) -> &RetiredKeys {
        &self.previous
    }

    /// True once the active key has signed for at least `rotation_days`.
    pub fn needs_rotation(&self, policy: &RotationPolicy, now: DateTime<Utc>) -> bool {
        now - self.active.created_at >= Duration::days(policy.rotation_days)
    }

    /// Produces the rotated keystore: a fresh active key, the old active key
    /// retired with an overlap window, and expired retired entries pruned.
    ///
    /// The input keystore is untouched so callers can persist the result
    /// before swapping it in.
    pub fn rotate(
        &self,
        algorithm: SigningAlgorithm,
        policy: &RotationPolicy,
        now: DateTime<Utc>,
    ) -> Result<Keystore, KeyError> {
        policy.validate()?;
        let new_active = KeyPairRecord::generate(algorithm)?;

        let mut previous = self.previous.clone();
        previous.retire(RetiredKey {
            kid: self.active.kid.clone(),
            algorithm: self.active.algorithm,
            public_jwk: self.active.public_jwk().clone(),
            retired_at: now,
            expires_at: now + Duration::days(policy.overlap_days),
        });
        previous.prune(now);

        Ok(Keystore {
            active: new_active,
            previous,
        })
    }

    /// Public JWKS export: active key first, then retired keys, no private
    /// fields anywhere.
    pub fn export_public_jwks(&self) -> JwkSet {
        let mut keys = Vec::with_capacity(1 + self.previous.len());
        keys.push(self.active.public_jwk().clone());
        keys.extend(self.previous.iter().map(|k| k.public_jwk.clone()));
        JwkSet { keys }
    }

    /// Candidate verification keys in JWKS order.
    pub fn verification_keys(&self) -> Result<Vec<VerificationKey>, KeyError> {
        let mut keys = Vec::with_capacity(1 + self.previous.len());
        keys.push(VerificationKey::from(&self.active));
        for retired in self.previous.iter() {
            keys.push(VerificationKey::from_jwk(&retired.public_jwk)?);
        }
        Ok(keys)
    }

    /// Looks up a key by kid. Only the active key carries private material.
    pub fn find_key(&self, kid: &str) -> Option<KeyLookup<'_>> {
        if self.active.kid == kid {
            return Some(KeyLookup::Active(&self.active));
        }
        self.previous.find(kid).map(KeyLookup::Retired)
    }

    /// Serializes for persistence: active private JWK + retired public JWKs.
    pub fn to_document(&self) -> KeystoreDocument {
        KeystoreDocument {
            active: ActiveKeyDocument {
                jwk: self.active.private_jwk().clone(),
                created_at: self.active.created_at,
            },
            previous: self.previous.iter().cloned().collect(),
        }
    }

    /// Rebuilds a keystore from its persisted form.
    pub fn from_document(document: &KeystoreDocument) -> Result<Self, KeyError> {
        let active =
            KeyPairRecord::from_private_jwk(&document.active.jwk, document.active.created_at)?;
        for retired in &document.previous {
            if retired.public_jwk.is_private() {
                return Err(KeyError::InvalidJwk {
                    message: format!("retired key {} carries private material", retired.kid),
                });
            }
            retired.public_jwk.algorithm()?;
        }
        Ok(Self {
            active,
            previous: RetiredKeys(document.previous.clone()),
        })
    }
}
