//! Supported signing algorithms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::KeyError;

/// Signing algorithms supported by the key material provider.
///
/// A sum type on purpose: every site that cares about the algorithm matches
/// exhaustively, so adding a variant is a compile-time obligation rather
/// than a silent runtime fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// Ed25519 (JOSE "EdDSA", OKP key type)
    #[serde(rename = "EdDSA")]
    Ed25519,
    /// ECDSA over P-256 with SHA-256 (JOSE "ES256", EC key type)
    #[serde(rename = "ES256")]
    Es256,
}

impl SigningAlgorithm {
    /// JOSE registry name, as carried in token headers and JWKs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::Ed25519 => "EdDSA",
            SigningAlgorithm::Es256 => "ES256",
        }
    }

    /// Expected JWK key type for this algorithm.
    pub fn key_type(&self) -> &'static str {
        match self {
            SigningAlgorithm::Ed25519 => "OKP",
            SigningAlgorithm::Es256 => "EC",
        }
    }

    /// Expected JWK curve name for this algorithm.
    pub fn curve(&self) -> &'static str {
        match self {
            SigningAlgorithm::Ed25519 => "Ed25519",
            SigningAlgorithm::Es256 => "P-256",
        }
    }

    /// The matching `jsonwebtoken` algorithm for signing primitives.
    pub fn to_jwt_algorithm(&self) -> jsonwebtoken::Algorithm {
        match self {
            SigningAlgorithm::Ed25519 => jsonwebtoken::Algorithm::EdDSA,
            SigningAlgorithm::Es256 => jsonwebtoken::Algorithm::ES256,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EdDSA" => Ok(SigningAlgorithm::Ed25519),
            "ES256" => Ok(SigningAlgorithm::Es256),
            other => Err(KeyError::UnsupportedAlgorithm {
                alg: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jose_names_round_trip() {
        for alg in [SigningAlgorithm::Ed25519, SigningAlgorithm::Es256] {
            assert_eq!(alg.as_str().parse::<SigningAlgorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn test_unsupported_algorithm_is_a_hard_error() {
        let err = "HS256".parse::<SigningAlgorithm>().unwrap_err();
        assert!(matches!(err, KeyError::UnsupportedAlgorithm { alg } if alg == "HS256"));
        assert!("none".parse::<SigningAlgorithm>().is_err());
    }

    #[test]
    fn test_serde_uses_jose_names() {
        assert_eq!(
            serde_json::to_string(&SigningAlgorithm::Ed25519).unwrap(),
            "\"EdDSA\""
        );
        let alg: SigningAlgorithm = serde_json::from_str("\"ES256\"").unwrap();
        assert_eq!(alg, SigningAlgorithm::Es256);
    }
}
