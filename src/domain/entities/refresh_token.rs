//! Refresh token entities.
//!
//! A refresh token is opaque to clients: `familyId.jti.secret`. The store
//! only ever sees the SHA-256 hash of the full encoded string; the plaintext
//! exists exactly once, in the response that hands it to the client.
//! Records form a family chained through `parent_jti`, and rotated records
//! are retained until the expiry sweep — that retention is what makes reuse
//! detection possible.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::RefreshError;

/// Byte length of the random secret segment.
const SECRET_LEN: usize = 32;

/// Hashes a refresh token for storage and lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Client-side metadata captured at issuance and rotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenMetadata {
    pub session_id: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// The plaintext refresh token, decomposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueRefreshToken {
    pub family_id: Uuid,
    pub jti: Uuid,
    secret: String,
}

impl OpaqueRefreshToken {
    /// Mints a token with a fresh `jti` and random secret.
    pub fn mint(family_id: Uuid) -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            family_id,
            jti: Uuid::new_v4(),
            secret: URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    /// Encodes as the dot-joined wire form handed to clients.
    pub fn encode(&self) -> String {
        format!("{}.{}.{}", self.family_id, self.jti, self.secret)
    }

    /// Parses the wire form back into its segments.
    pub fn parse(token: &str) -> Result<Self, RefreshError> {
        let mut parts = token.split('.');
        let (family, jti, secret) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(f), Some(j), Some(s), None) if !s.is_empty() => (f, j, s),
            _ => return Err(RefreshError::InvalidRefreshToken),
        };
        let family_id = Uuid::parse_str(family).map_err(|_| RefreshError::InvalidRefreshToken)?;
        let jti = Uuid::parse_str(jti).map_err(|_| RefreshError::InvalidRefreshToken)?;
        Ok(Self {
            family_id,
            jti,
            secret: secret.to_string(),
        })
    }

    /// Storage hash of the encoded token.
    pub fn hash(&self) -> String {
        hash_token(&self.encode())
    }
}

/// Refresh token record as persisted by a [`RefreshTokenStore`].
///
/// [`RefreshTokenStore`]: crate::repositories::RefreshTokenStore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Rotation family this record belongs to.
    pub family_id: Uuid,

    /// Unique identifier of this record within the family.
    pub jti: Uuid,

    /// User the family was issued to.
    pub user_id: Uuid,

    /// SHA-256 hash of the full plaintext token.
    pub token_hash: String,

    /// Timestamp when the record was created.
    pub created_at: DateTime<Utc>,

    /// Timestamp when the record expires.
    pub expires_at: DateTime<Utc>,

    /// The jti this token was rotated from; `None` for the login token.
    pub parent_jti: Option<Uuid>,

    /// Set by the store when this record is consumed by a rotation.
    pub rotated_at: Option<DateTime<Utc>>,

    /// Session ID, if tracked.
    pub session_id: Option<String>,

    /// Client IP at issuance.
    pub ip: Option<String>,

    /// Client user agent at issuance.
    pub user_agent: Option<String>,
}

impl RefreshTokenRecord {
    pub fn new(
        user_id: Uuid,
        token: &OpaqueRefreshToken,
        ttl: Duration,
        parent_jti: Option<Uuid>,
        metadata: RefreshTokenMetadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            family_id: token.family_id,
            jti: token.jti,
            user_id,
            token_hash: token.hash(),
            created_at: now,
            expires_at: now + ttl,
            parent_jti,
            rotated_at: None,
            session_id: metadata.session_id,
            ip: metadata.ip,
            user_agent: metadata.user_agent,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// True once this record has been consumed by a rotation.
    pub fn is_rotated(&self) -> bool {
        self.rotated_at.is_some()
    }
}

/// A freshly minted refresh token: the plaintext (returned to the client
/// exactly once) and the record persisted for it.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub record: RefreshTokenRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_token_encode_parse_round_trip() {
        let token = OpaqueRefreshToken::mint(Uuid::new_v4());
        let encoded = token.encode();

        let parsed = OpaqueRefreshToken::parse(&encoded).unwrap();
        assert_eq!(parsed, token);
        assert_eq!(parsed.hash(), token.hash());
    }

    #[test]
    fn test_opaque_token_rejects_malformed_input() {
        assert!(OpaqueRefreshToken::parse("").is_err());
        assert!(OpaqueRefreshToken::parse("only-one-segment").is_err());
        assert!(OpaqueRefreshToken::parse("a.b").is_err());
        assert!(OpaqueRefreshToken::parse("not-a-uuid.also-not.secret").is_err());

        let token = OpaqueRefreshToken::mint(Uuid::new_v4());
        let too_many = format!("{}.extra", token.encode());
        assert!(OpaqueRefreshToken::parse(&too_many).is_err());
    }

    #[test]
    fn test_minted_secrets_are_unique() {
        let family = Uuid::new_v4();
        let a = OpaqueRefreshToken::mint(family);
        let b = OpaqueRefreshToken::mint(family);
        assert_ne!(a.encode(), b.encode());
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_hash_is_stable_and_not_plaintext() {
        let token = OpaqueRefreshToken::mint(Uuid::new_v4());
        let encoded = token.encode();

        assert_eq!(hash_token(&encoded), hash_token(&encoded));
        assert_ne!(hash_token(&encoded), encoded);
        // SHA-256 hex
        assert_eq!(hash_token(&encoded).len(), 64);
    }

    #[test]
    fn test_record_expiry_and_rotation_state() {
        let token = OpaqueRefreshToken::mint(Uuid::new_v4());
        let mut record = RefreshTokenRecord::new(
            Uuid::new_v4(),
            &token,
            Duration::days(7),
            None,
            RefreshTokenMetadata::default(),
        );

        assert!(!record.is_expired());
        assert!(!record.is_rotated());
        assert_eq!(record.parent_jti, None);
        assert_eq!(record.token_hash, token.hash());

        record.expires_at = Utc::now() - Duration::days(1);
        record.rotated_at = Some(Utc::now());
        assert!(record.is_expired());
        assert!(record.is_rotated());
    }
}
