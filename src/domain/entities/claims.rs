//! Claims and header types for signed tokens.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audience claim: a single value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// All audience values, regardless of representation.
    pub fn values(&self) -> &[String] {
        match self {
            Audience::One(v) => std::slice::from_ref(v),
            Audience::Many(vs) => vs.as_slice(),
        }
    }

    /// True when the two audience sets share at least one value.
    pub fn intersects(&self, other: &Audience) -> bool {
        self.values().iter().any(|v| other.values().contains(v))
    }
}

impl From<&str> for Audience {
    fn from(value: &str) -> Self {
        Audience::One(value.to_string())
    }
}

impl From<Vec<String>> for Audience {
    fn from(values: Vec<String>) -> Self {
        Audience::Many(values)
    }
}

/// Header segment of a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Signing algorithm name (JOSE registry name, e.g. "EdDSA").
    pub alg: String,

    /// Key id used to select the verification key.
    pub kid: String,

    /// Token type, always "JWT" for tokens minted by this crate.
    pub typ: String,
}

impl TokenHeader {
    pub fn new(alg: impl Into<String>, kid: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            kid: kid.into(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims segment of a signed token.
///
/// Registered claims are explicit fields; anything else round-trips through
/// the flattened `extra` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    pub iss: String,

    /// Audience (single value or list)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Subject (user ID)
    pub sub: String,

    /// Issued at timestamp (seconds since epoch)
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Token ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Session ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    /// Organization ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,

    /// Role label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Any non-registered claims.
    #[serde(flatten, skip_serializing_if = "serde_json::Map::is_empty", default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// Creates claims for a token issued now and valid for `ttl`.
    ///
    /// A fresh random `jti` is minted; the invariant `exp > iat` holds for
    /// any positive `ttl`.
    pub fn new(issuer: impl Into<String>, subject: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            iss: issuer.into(),
            aud: None,
            sub: subject.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: None,
            jti: Some(Uuid::new_v4().to_string()),
            sid: None,
            org: None,
            role: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_audience(mut self, aud: impl Into<Audience>) -> Self {
        self.aud = Some(aud.into());
        self
    }

    pub fn with_not_before(mut self, nbf: i64) -> Self {
        self.nbf = Some(nbf);
        self
    }

    pub fn with_session(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn with_org(mut self, org: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_claim(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Checks if the claims have expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Gets the subject as a UUID.
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_builder() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new("authkit", user_id.to_string(), Duration::minutes(15))
            .with_audience("authkit-api")
            .with_session("s-1")
            .with_role("admin");

        assert_eq!(claims.iss, "authkit");
        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.aud, Some(Audience::One("authkit-api".to_string())));
        assert_eq!(claims.sid.as_deref(), Some("s-1"));
        assert_eq!(claims.role.as_deref(), Some("admin"));
        assert!(claims.jti.is_some());
        assert!(!claims.is_expired());
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_audience_serde_single_and_list() {
        let one: Audience = serde_json::from_str("\"svc-a\"").unwrap();
        assert_eq!(one, Audience::One("svc-a".to_string()));

        let many: Audience = serde_json::from_str("[\"svc-a\",\"svc-b\"]").unwrap();
        assert_eq!(many.values().len(), 2);

        assert!(one.intersects(&many));
        assert!(!Audience::from("svc-c").intersects(&many));
    }

    #[test]
    fn test_extra_claims_round_trip() {
        let claims = Claims::new("authkit", "u1", Duration::minutes(5))
            .with_claim("scope", serde_json::json!("read write"));

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"scope\":\"read write\""));

        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back, claims);
        assert_eq!(back.extra["scope"], serde_json::json!("read write"));
    }

    #[test]
    fn test_claims_expiration() {
        let mut claims = Claims::new("authkit", "u1", Duration::minutes(5));
        claims.exp = Utc::now().timestamp() - 1;
        assert!(claims.is_expired());
    }

    #[test]
    fn test_header_defaults_to_jwt_type() {
        let header = TokenHeader::new("EdDSA", "kid-1");
        assert_eq!(header.typ, "JWT");

        let json = serde_json::to_string(&header).unwrap();
        let back: TokenHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(back, header);
    }
}
