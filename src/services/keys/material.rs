//! Key material provider: key pair generation and JWK import/export.
//!
//! `jsonwebtoken` consumes keys but does not generate them, so generation
//! goes through `ed25519-dalek` and `p256` and the result is bridged into
//! `EncodingKey`/`DecodingKey` via PKCS#8 PEM.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{EncodePrivateKey, LineEnding};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::KeyError;

use super::algorithm::SigningAlgorithm;

/// JSON Web Key. Public when `d` is absent, private when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type ("OKP" or "EC").
    pub kty: String,

    /// Key ID.
    pub kid: String,

    /// Key use, always "sig" here.
    #[serde(rename = "use")]
    pub use_: String,

    /// Algorithm (JOSE name).
    pub alg: String,

    /// Curve name.
    pub crv: String,

    /// Public coordinate (base64url). For OKP this is the whole public key.
    pub x: String,

    /// Second public coordinate (base64url), EC only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// Private scalar (base64url). Never serialized on public exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

impl Jwk {
    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    /// Copy with private material stripped.
    pub fn to_public(&self) -> Jwk {
        Jwk {
            d: None,
            ..self.clone()
        }
    }

    /// Resolves and validates the algorithm this JWK claims.
    ///
    /// A JWK is only valid when its key type and curve match the claimed
    /// algorithm; a mismatch is an error, never a fallback.
    pub fn algorithm(&self) -> Result<SigningAlgorithm, KeyError> {
        let alg: SigningAlgorithm = self.alg.parse()?;
        if self.kty != alg.key_type() || self.crv != alg.curve() {
            return Err(KeyError::AlgorithmMismatch {
                expected: format!("{}/{}", alg.key_type(), alg.curve()),
                actual: format!("{}/{}", self.kty, self.crv),
            });
        }
        match alg {
            SigningAlgorithm::Ed25519 => {
                if self.y.is_some() {
                    return Err(KeyError::InvalidJwk {
                        message: "OKP keys must not carry a y coordinate".to_string(),
                    });
                }
            }
            SigningAlgorithm::Es256 => {
                if self.y.is_none() {
                    return Err(KeyError::InvalidJwk {
                        message: "EC keys require a y coordinate".to_string(),
                    });
                }
            }
        }
        Ok(alg)
    }

    /// Builds a verification key from the public coordinates.
    pub fn to_decoding_key(&self) -> Result<DecodingKey, KeyError> {
        match self.algorithm()? {
            SigningAlgorithm::Ed25519 => {
                DecodingKey::from_ed_components(&self.x).map_err(|e| KeyError::InvalidJwk {
                    message: format!("invalid Ed25519 public key: {}", e),
                })
            }
            SigningAlgorithm::Es256 => {
                let y = self.y.as_deref().ok_or_else(|| KeyError::InvalidJwk {
                    message: "EC keys require a y coordinate".to_string(),
                })?;
                DecodingKey::from_ec_components(&self.x, y).map_err(|e| KeyError::InvalidJwk {
                    message: format!("invalid P-256 public key: {}", e),
                })
            }
        }
    }
}

/// JWKS document: the public key discovery wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// A generated key pair, ready for signing and JWKS export.
#[derive(Clone)]
pub struct KeyPairRecord {
    /// Opaque key id. Random, never derived from key material.
    pub kid: String,

    /// Algorithm the pair was generated for.
    pub algorithm: SigningAlgorithm,

    /// When the pair was generated.
    pub created_at: DateTime<Utc>,

    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    public_jwk: Jwk,
    private_jwk: Jwk,
}

impl std::fmt::Debug for KeyPairRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairRecord")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl KeyPairRecord {
    /// Generates a fresh key pair for `algorithm`.
    pub fn generate(algorithm: SigningAlgorithm) -> Result<Self, KeyError> {
        let kid = Uuid::new_v4().to_string();
        match algorithm {
            SigningAlgorithm::Ed25519 => {
                let signing_key = ed25519_dalek::SigningKey::generate(&mut OsRng);
                let x = URL_SAFE_NO_PAD.encode(signing_key.verifying_key().to_bytes());
                let d = URL_SAFE_NO_PAD.encode(signing_key.to_bytes());
                Self::from_ed25519_parts(kid, x, d, Utc::now())
            }
            SigningAlgorithm::Es256 => {
                let secret_key = p256::SecretKey::random(&mut OsRng);
                let point = secret_key.public_key().to_encoded_point(false);
                let x = point.x().ok_or_else(|| KeyError::KeyGenerationFailed {
                    message: "missing x coordinate".to_string(),
                })?;
                let y = point.y().ok_or_else(|| KeyError::KeyGenerationFailed {
                    message: "missing y coordinate".to_string(),
                })?;
                Self::from_es256_parts(
                    kid,
                    URL_SAFE_NO_PAD.encode(x.as_slice()),
                    URL_SAFE_NO_PAD.encode(y.as_slice()),
                    URL_SAFE_NO_PAD.encode(secret_key.to_bytes()),
                    Utc::now(),
                )
            }
        }
    }

    /// Reconstructs a key pair from its private JWK.
    ///
    /// The public coordinates are recomputed from the private scalar and
    /// must match the JWK, so a private JWK round-trips losslessly or fails.
    pub fn from_private_jwk(jwk: &Jwk, created_at: DateTime<Utc>) -> Result<Self, KeyError> {
        let algorithm = jwk.algorithm()?;
        let d = jwk.d.as_deref().ok_or_else(|| KeyError::InvalidJwk {
            message: "private JWK requires the d field".to_string(),
        })?;
        let d_bytes = URL_SAFE_NO_PAD
            .decode(d)
            .map_err(|e| KeyError::InvalidJwk {
                message: format!("invalid d encoding: {}", e),
            })?;

        let record = match algorithm {
            SigningAlgorithm::Ed25519 => {
                let seed: [u8; 32] = d_bytes.try_into().map_err(|_| KeyError::InvalidJwk {
                    message: "Ed25519 private key must be 32 bytes".to_string(),
                })?;
                let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
                let x = URL_SAFE_NO_PAD.encode(signing_key.verifying_key().to_bytes());
                Self::from_ed25519_parts(jwk.kid.clone(), x, d.to_string(), created_at)?
            }
            SigningAlgorithm::Es256 => {
                let secret_key =
                    p256::SecretKey::from_slice(&d_bytes).map_err(|e| KeyError::InvalidJwk {
                        message: format!("invalid P-256 private key: {}", e),
                    })?;
                let point = secret_key.public_key().to_encoded_point(false);
                let x = point.x().ok_or_else(|| KeyError::InvalidJwk {
                    message: "missing x coordinate".to_string(),
                })?;
                let y = point.y().ok_or_else(|| KeyError::InvalidJwk {
                    message: "missing y coordinate".to_string(),
                })?;
                Self::from_es256_parts(
                    jwk.kid.clone(),
                    URL_SAFE_NO_PAD.encode(x.as_slice()),
                    URL_SAFE_NO_PAD.encode(y.as_slice()),
                    d.to_string(),
                    created_at,
                )?
            }
        };

        // Recomputed public material must agree with the imported JWK.
        if record.private_jwk.x != jwk.x || record.private_jwk.y != jwk.y {
            return Err(KeyError::InvalidJwk {
                message: "public coordinates do not match the private scalar".to_string(),
            });
        }
        Ok(record)
    }

    fn from_ed25519_parts(
        kid: String,
        x: String,
        d: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, KeyError> {
        let d_bytes =
            URL_SAFE_NO_PAD
                .decode(&d)
                .map_err(|e| KeyError::KeyGenerationFailed {
                    message: format!("invalid d encoding: {}", e),
                })?;
        let seed: [u8; 32] = d_bytes
            .try_into()
            .map_err(|_| KeyError::KeyGenerationFailed {
                message: "Ed25519 private key must be 32 bytes".to_string(),
            })?;
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
        let pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::KeyGenerationFailed {
                message: e.to_string(),
            })?;
        let encoding_key =
            EncodingKey::from_ed_pem(pem.as_bytes()).map_err(|e| KeyError::KeyGenerationFailed {
                message: e.to_string(),
            })?;
        let decoding_key =
            DecodingKey::from_ed_components(&x).map_err(|e| KeyError::KeyGenerationFailed {
                message: e.to_string(),
            })?;

        let private_jwk = Jwk {
            kty: "OKP".to_string(),
            kid: kid.clone(),
            use_: "sig".to_string(),
            alg: SigningAlgorithm::Ed25519.as_str().to_string(),
            crv: "Ed25519".to_string(),
            x,
            y: None,
            d: Some(d),
        };
        Ok(Self {
            kid,
            algorithm: SigningAlgorithm::Ed25519,
            created_at,
            encoding_key,
            decoding_key,
            public_jwk: private_jwk.to_public(),
            private_jwk,
        })
    }

    fn from_es256_parts(
        kid: String,
        x: String,
        y: String,
        d: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, KeyError> {
        let d_bytes =
            URL_SAFE_NO_PAD
                .decode(&d)
                .map_err(|e| KeyError::KeyGenerationFailed {
                    message: format!("invalid d encoding: {}", e),
                })?;
        let secret_key =
            p256::SecretKey::from_slice(&d_bytes).map_err(|e| KeyError::KeyGenerationFailed {
                message: e.to_string(),
            })?;
        let pem = secret_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::KeyGenerationFailed {
                message: e.to_string(),
            })?;
        let encoding_key =
            EncodingKey::from_ec_pem(pem.as_bytes()).map_err(|e| KeyError::KeyGenerationFailed {
                message: e.to_string(),
            })?;
        let decoding_key = DecodingKey::from_ec_components(&x, &y).map_err(|e| {
            KeyError::KeyGenerationFailed {
                message: e.to_string(),
            }
        })?;

        let private_jwk = Jwk {
            kty: "EC".to_string(),
            kid: kid.clone(),
            use_: "sig".to_string(),
            alg: SigningAlgorithm::Es256.as_str().to_string(),
            crv: "P-256".to_string(),
            x,
            y: Some(y),
            d: Some(d),
        };
        Ok(Self {
            kid,
            algorithm: SigningAlgorithm::Es256,
            created_at,
            encoding_key,
            decoding_key,
            public_jwk: private_jwk.to_public(),
            private_jwk,
        })
    }

    /// Private key handle for signing.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Public key handle for verification.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Public JWK (no private fields).
    pub fn public_jwk(&self) -> &Jwk {
        &self.public_jwk
    }

    /// Private JWK, for keystore persistence of the active key only.
    pub fn private_jwk(&self) -> &Jwk {
        &self.private_jwk
    }
}

/// A candidate key for token verification: public material plus identity.
#[derive(Clone)]
pub struct VerificationKey {
    pub kid: String,
    pub algorithm: SigningAlgorithm,
    decoding_key: DecodingKey,
}

impl VerificationKey {
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, KeyError> {
        Ok(Self {
            kid: jwk.kid.clone(),
            algorithm: jwk.algorithm()?,
            decoding_key: jwk.to_decoding_key()?,
        })
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl From<&KeyPairRecord> for VerificationKey {
    fn from(record: &KeyPairRecord) -> Self {
        Self {
            kid: record.kid.clone(),
            algorithm: record.algorithm,
            decoding_key: record.decoding_key.clone(),
        }
    }
}
