//! Domain-specific error enums.
//!
//! Verification is layered (structural, key lookup, cryptographic, timing,
//! claim-semantic) and each layer gets its own variant so callers can tell
//! "expired, refresh" apart from "invalid, do not retry". Variants are never
//! collapsed into one another.

use thiserror::Error;

/// Key material and keystore errors.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Unsupported signing algorithm: {alg}")]
    UnsupportedAlgorithm { alg: String },

    #[error("Key generation failed: {message}")]
    KeyGenerationFailed { message: String },

    #[error("Invalid JWK: {message}")]
    InvalidJwk { message: String },

    #[error("Key algorithm mismatch (expected {expected}, got {actual})")]
    AlgorithmMismatch { expected: String, actual: String },

    #[error("Invalid rotation policy: {message}")]
    InvalidRotationPolicy { message: String },
}

impl KeyError {
    pub fn error_code(&self) -> &'static str {
        match self {
            KeyError::UnsupportedAlgorithm { .. } => "UNSUPPORTED_ALGORITHM",
            KeyError::KeyGenerationFailed { .. } => "KEY_GENERATION_FAILED",
            KeyError::InvalidJwk { .. } => "INVALID_JWK",
            KeyError::AlgorithmMismatch { .. } => "KEY_ALGORITHM_MISMATCH",
            KeyError::InvalidRotationPolicy { .. } => "INVALID_ROTATION_POLICY",
        }
    }
}

/// Signed-token errors, one variant per verification layer.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Malformed token: {message}")]
    MalformedToken { message: String },

    #[error("Missing required claim: {claim}")]
    MissingClaim { claim: String },

    #[error("Invalid claims: {message}")]
    InvalidClaims { message: String },

    #[error("Unknown key id: {kid}")]
    UnknownKid { kid: String },

    #[error("Unsupported algorithm in token header: {alg}")]
    UnsupportedAlgorithm { alg: String },

    #[error("Token algorithm mismatch (key expects {expected}, header says {actual})")]
    AlgorithmMismatch { expected: String, actual: String },

    #[error("Token signature verification failed")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token not yet valid")]
    TokenNotYetValid,

    #[error("Issuer mismatch (expected {expected}, got {actual})")]
    IssuerMismatch { expected: String, actual: String },

    #[error("Audience mismatch")]
    AudienceMismatch,

    #[error("Token generation failed: {message}")]
    TokenGenerationFailed { message: String },
}

impl TokenError {
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::MalformedToken { .. } => "MALFORMED_TOKEN",
            TokenError::MissingClaim { .. } => "MISSING_CLAIM",
            TokenError::InvalidClaims { .. } => "INVALID_CLAIMS",
            TokenError::UnknownKid { .. } => "UNKNOWN_KID",
            TokenError::UnsupportedAlgorithm { .. } => "UNSUPPORTED_ALGORITHM",
            TokenError::AlgorithmMismatch { .. } => "TOKEN_ALGORITHM_MISMATCH",
            TokenError::InvalidSignature => "INVALID_SIGNATURE",
            TokenError::TokenExpired => "TOKEN_EXPIRED",
            TokenError::TokenNotYetValid => "TOKEN_NOT_YET_VALID",
            TokenError::IssuerMismatch { .. } => "ISSUER_MISMATCH",
            TokenError::AudienceMismatch => "AUDIENCE_MISMATCH",
            TokenError::TokenGenerationFailed { .. } => "TOKEN_GENERATION_FAILED",
        }
    }
}

/// Refresh-token rotation errors.
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("Refresh token family revoked")]
    FamilyRevoked,

    #[error("Refresh token reuse detected")]
    ReuseDetected,

    #[error("Refresh token was already rotated")]
    RotationConflict,

    #[error("Refresh token hash already exists")]
    DuplicateTokenHash,
}

impl RefreshError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RefreshError::InvalidRefreshToken => "REFRESH_TOKEN_INVALID",
            RefreshError::RefreshTokenExpired => "REFRESH_TOKEN_EXPIRED",
            RefreshError::FamilyRevoked => "REFRESH_TOKEN_FAMILY_REVOKED",
            RefreshError::ReuseDetected => "REFRESH_TOKEN_REUSE_DETECTED",
            RefreshError::RotationConflict => "REFRESH_TOKEN_ROTATION_CONFLICT",
            RefreshError::DuplicateTokenHash => "REFRESH_TOKEN_DUPLICATE_HASH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct_per_refresh_outcome() {
        let codes = [
            RefreshError::InvalidRefreshToken.error_code(),
            RefreshError::RefreshTokenExpired.error_code(),
            RefreshError::FamilyRevoked.error_code(),
            RefreshError::ReuseDetected.error_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in codes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_timing_errors_not_folded_into_signature_errors() {
        assert_ne!(
            TokenError::TokenExpired.error_code(),
            TokenError::InvalidSignature.error_code()
        );
        assert_ne!(
            TokenError::UnknownKid { kid: "k".into() }.error_code(),
            TokenError::InvalidSignature.error_code()
        );
    }
}
