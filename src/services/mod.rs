//! Service layer: key management, token codec, refresh rotation.

pub mod codec;
pub mod keys;
pub mod refresh;

pub use codec::{VerifiedToken, VerifyOptions};
pub use keys::{
    Jwk, JwkSet, KeyLookup, KeyPairRecord, Keystore, KeystoreDocument, KeystoreManager,
    KeystoreStats, RetiredKey, RetiredKeys, RotationPolicy, SigningAlgorithm, VerificationKey,
};
pub use refresh::{
    CleanupResult, RefreshCleanupConfig, RefreshCleanupService, RefreshRotationService,
    RotatedRefreshToken,
};
