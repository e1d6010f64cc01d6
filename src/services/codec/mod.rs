//! Stateless sign/verify for compact signed tokens.
//!
//! Verification is layered so each failure mode keeps its own error kind:
//! structural checks first, then key lookup by kid, then the cryptographic
//! check, then timing, then issuer/audience semantics. Callers use the kind
//! to distinguish "expired, refresh" from "invalid, do not retry"; nothing
//! here retries internally.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;

use crate::domain::entities::claims::{Audience, Claims, TokenHeader};
use crate::errors::TokenError;
use crate::services::keys::{KeyPairRecord, SigningAlgorithm, VerificationKey};

#[cfg(test)]
mod tests;

/// Outcome of a successful verification.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub header: TokenHeader,
    pub claims: Claims,
}

/// Issuer/audience expectations for [`verify_full`].
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub clock_skew_secs: i64,
    pub expected_issuer: Option<String>,
    pub expected_audience: Option<Audience>,
}

/// Signs claims into `base64url(header).base64url(claims).base64url(sig)`.
///
/// The signature covers the exact byte concatenation of the first two
/// segments, under the algorithm named in the header.
pub fn sign(claims: &Claims, key: &KeyPairRecord) -> Result<String, TokenError> {
    if claims.exp <= claims.iat {
        return Err(TokenError::InvalidClaims {
            message: "exp must be greater than iat".to_string(),
        });
    }

    let header = TokenHeader::new(key.algorithm.as_str(), key.kid.clone());
    let header_json = serde_json::to_vec(&header).map_err(|e| TokenError::TokenGenerationFailed {
        message: e.to_string(),
    })?;
    let claims_json = serde_json::to_vec(claims).map_err(|e| TokenError::TokenGenerationFailed {
        message: e.to_string(),
    })?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let signature = jsonwebtoken::crypto::sign(
        signing_input.as_bytes(),
        key.encoding_key(),
        key.algorithm.to_jwt_algorithm(),
    )
    .map_err(|e| TokenError::TokenGenerationFailed {
        message: e.to_string(),
    })?;

    Ok(format!("{}.{}", signing_input, signature))
}

/// Structural + key + cryptographic verification.
pub fn verify(token: &str, candidate_keys: &[VerificationKey]) -> Result<VerifiedToken, TokenError> {
    let (header_b64, claims_b64, signature_b64) = split_segments(token)?;

    let header = decode_header(header_b64)?;
    let claims_value = decode_claims_value(claims_b64)?;
    validate_claim_structure(&claims_value)?;

    let key = candidate_keys
        .iter()
        .find(|k| k.kid == header.kid)
        .ok_or_else(|| TokenError::UnknownKid {
            kid: header.kid.clone(),
        })?;

    let alg: SigningAlgorithm =
        header
            .alg
            .parse()
            .map_err(|_| TokenError::UnsupportedAlgorithm {
                alg: header.alg.clone(),
            })?;
    if alg != key.algorithm {
        return Err(TokenError::AlgorithmMismatch {
            expected: key.algorithm.as_str().to_string(),
            actual: header.alg.clone(),
        });
    }

    let signing_input = format!("{}.{}", header_b64, claims_b64);
    let valid = jsonwebtoken::crypto::verify(
        signature_b64,
        signing_input.as_bytes(),
        key.decoding_key(),
        alg.to_jwt_algorithm(),
    )
    .map_err(|_| TokenError::InvalidSignature)?;
    if !valid {
        return Err(TokenError::InvalidSignature);
    }

    let claims: Claims =
        serde_json::from_value(claims_value).map_err(|e| TokenError::InvalidClaims {
            message: e.to_string(),
        })?;

    Ok(VerifiedToken { header, claims })
}

/// [`verify`] plus expiry / not-before checks with `clock_skew_secs` slack.
pub fn verify_with_timing(
    token: &str,
    candidate_keys: &[VerificationKey],
    clock_skew_secs: i64,
) -> Result<VerifiedToken, TokenError> {
    let verified = verify(token, candidate_keys)?;
    let now = Utc::now().timestamp();

    if verified.claims.exp < now - clock_skew_secs {
        return Err(TokenError::TokenExpired);
    }
    if let Some(nbf) = verified.claims.nbf {
        if nbf > now + clock_skew_secs {
            return Err(TokenError::TokenNotYetValid);
        }
    }
    Ok(verified)
}

/// [`verify_with_timing`] plus issuer and audience expectations.
///
/// Issuer must match exactly; audiences must share at least one value, where
/// either side may be a single value or a list.
pub fn verify_full(
    token: &str,
    candidate_keys: &[VerificationKey],
    options: &VerifyOptions,
) -> Result<VerifiedToken, TokenError> {
    let verified = verify_with_timing(token, candidate_keys, options.clock_skew_secs)?;

    if let Some(expected) = &options.expected_issuer {
        if &verified.claims.iss != expected {
            return Err(TokenError::IssuerMismatch {
                expected: expected.clone(),
                actual: verified.claims.iss.clone(),
            });
        }
    }

    if let Some(expected) = &options.expected_audience {
        let actual = verified
            .claims
            .aud
            .as_ref()
            .ok_or(TokenError::AudienceMismatch)?;
        if !expected.intersects(actual) {
            return Err(TokenError::AudienceMismatch);
        }
    }

    Ok(verified)
}

fn split_segments(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s), None) if !h.is_empty() && !c.is_empty() && !s.is_empty() => {
            Ok((h, c, s))
        }
        _ => Err(TokenError::MalformedToken {
            message: "token must have exactly 3 non-empty dot-separated segments".to_string(),
        }),
    }
}

fn decode_header(header_b64: &str) -> Result<TokenHeader, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|e| TokenError::MalformedToken {
            message: format!("header segment is not valid base64url: {}", e),
        })?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::MalformedToken {
        message: format!("header segment is not valid JSON: {}", e),
    })
}

fn decode_claims_value(claims_b64: &str) -> Result<serde_json::Value, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|e| TokenError::MalformedToken {
            message: format!("claims segment is not valid base64url: {}", e),
        })?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::MalformedToken {
        message: format!("claims segment is not valid JSON: {}", e),
    })
}

// Required claims must be present with the right types before any
// cryptographic work; a structural failure is never reported as a
// signature failure.
fn validate_claim_structure(claims: &serde_json::Value) -> Result<(), TokenError> {
    let object = claims.as_object().ok_or_else(|| TokenError::InvalidClaims {
        message: "claims segment must be a JSON object".to_string(),
    })?;

    for (claim, expect_string) in [("iss", true), ("sub", true), ("iat", false), ("exp", false)] {
        match object.get(claim) {
            None => {
                return Err(TokenError::MissingClaim {
                    claim: claim.to_string(),
                })
            }
            Some(value) if expect_string && !value.is_string() => {
                return Err(TokenError::InvalidClaims {
                    message: format!("claim {} must be a string", claim),
                })
            }
            Some(value) if !expect_string && !value.is_i64() => {
                return Err(TokenError::InvalidClaims {
                    message: format!("claim {} must be an integer timestamp", claim),
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}
