//! Key material, keystore state machine, and the keystore manager.
//!
//! Bottom of the stack: [`KeyPairRecord`] generates and imports key pairs,
//! [`Keystore`] owns the active/retired key lifecycle as pure transitions,
//! and [`KeystoreManager`] ties both to persistence and a rotation schedule.

mod algorithm;
mod keystore;
mod manager;
mod material;

#[cfg(test)]
mod tests;

pub use algorithm::SigningAlgorithm;
pub use keystore::{
    ActiveKeyDocument, KeyLookup, Keystore, KeystoreDocument, RetiredKey, RetiredKeys,
    RotationPolicy,
};
pub use manager::{KeystoreManager, KeystoreStats};
pub use material::{Jwk, JwkSet, KeyPairRecord, VerificationKey};
