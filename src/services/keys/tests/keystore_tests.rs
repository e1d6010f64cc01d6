//! Keystore state-transition tests.

use chrono::{Duration, Utc};

use crate::errors::KeyError;
use crate::services::codec;
use crate::services::keys::{KeyLookup, Keystore, RotationPolicy, SigningAlgorithm};

fn policy(rotation_days: i64, overlap_days: i64) -> RotationPolicy {
    RotationPolicy {
        rotation_days,
        overlap_days,
    }
}

#[test]
fn test_create_has_one_active_key_and_no_retired_keys() {
    let ks = Keystore::create(SigningAlgorithm::Ed25519).unwrap();
    assert!(!ks.active().kid.is_empty());
    assert!(ks.previous().is_empty());
}

#[test]
fn test_needs_rotation_tracks_key_age() {
    let ks = Keystore::create(SigningAlgorithm::Ed25519).unwrap();
    let p = policy(30, 7);

    assert!(!ks.needs_rotation(&p, Utc::now()));
    assert!(ks.needs_rotation(&p, Utc::now() + Duration::days(30)));
    assert!(!ks.needs_rotation(&p, Utc::now() + Duration::days(29)));
}

#[test]
fn test_rotate_retires_the_old_active_key() {
    let ks = Keystore::create(SigningAlgorithm::Ed25519).unwrap();
    let old_kid = ks.active().kid.clone();
    let now = Utc::now();

    let rotated = ks.rotate(SigningAlgorithm::Ed25519, &policy(30, 7), now).unwrap();

    assert_ne!(rotated.active().kid, old_kid);
    assert!(rotated.previous().contains_kid(&old_kid));
    let retired = rotated.previous().find(&old_kid).unwrap();
    assert_eq!(retired.retired_at, now);
    assert_eq!(retired.expires_at, now + Duration::days(7));
}

#[test]
fn test_rotation_mints_a_globally_fresh_kid() {
    let mut ks = Keystore::create(SigningAlgorithm::Ed25519).unwrap();
    let mut seen = vec![ks.active().kid.clone()];

    for _ in 0..3 {
        ks = ks
            .rotate(SigningAlgorithm::Ed25519, &policy(30, 365), Utc::now())
            .unwrap();
        assert!(!seen.contains(&ks.active().kid));
        seen.push(ks.active().kid.clone());
    }
}

#[test]
fn test_rotate_prunes_retired_keys_past_their_overlap_window() {
    let ks = Keystore::create(SigningAlgorithm::Ed25519).unwrap();
    let first_kid = ks.active().kid.clone();
    let now = Utc::now();

    let ks = ks.rotate(SigningAlgorithm::Ed25519, &policy(30, 7), now).unwrap();
    assert!(ks.previous().contains_kid(&first_kid));

    // Second rotation lands after the first retired key expired.
    let later = now + Duration::days(8);
    let second_kid = ks.active().kid.clone();
    let ks = ks
        .rotate(SigningAlgorithm::Ed25519, &policy(30, 7), later)
        .unwrap();

    assert!(!ks.previous().contains_kid(&first_kid));
    assert!(ks.previous().contains_kid(&second_kid));
    assert_eq!(ks.previous().len(), 1);
}

#[test]
fn test_rotate_can_switch_algorithms() {
    let ks = Keystore::create(SigningAlgorithm::Ed25519).unwrap();
    let rotated = ks
        .rotate(SigningAlgorithm::Es256, &policy(30, 7), Utc::now())
        .unwrap();

    assert_eq!(rotated.active().algorithm, SigningAlgorithm::Es256);
    let retired = rotated.previous().iter().next().unwrap();
    assert_eq!(retired.algorithm, SigningAlgorithm::Ed25519);
}

#[test]
fn test_rotate_rejects_invalid_policy() {
    let ks = Keystore::create(SigningAlgorithm::Ed25519).unwrap();
    let err = ks
        .rotate(SigningAlgorithm::Ed25519, &policy(0, 7), Utc::now())
        .unwrap_err();
    assert!(matches!(err, KeyError::InvalidRotationPolicy { .. }));
    assert!(policy(30, 0).validate().is_err());
    assert!(policy(30, 7).validate().is_ok());
}

#[test]
fn test_jwks_export_is_public_only_and_active_first() {
    let ks = Keystore::create(SigningAlgorithm::Ed25519).unwrap();
    let ks = ks
        .rotate(SigningAlgorithm::Ed25519, &policy(30, 7), Utc::now())
        .unwrap();

    let jwks = ks.export_public_jwks();
    assert_eq!(jwks.keys.len(), 2);
    assert_eq!(jwks.keys[0].kid, ks.active().kid);
    for key in &jwks.keys {
        assert!(!key.is_private());
    }

    let json = serde_json::to_string(&jwks).unwrap();
    assert!(json.starts_with("{\"keys\":["));
    assert!(!json.contains("\"d\""));
}

#[test]
fn test_find_key_exposes_private_material_for_active_only() {
    let ks = Keystore::create(SigningAlgorithm::Ed25519).unwrap();
    let old_kid = ks.active().kid.clone();
    let ks = ks
        .rotate(SigningAlgorithm::Ed25519, &policy(30, 7), Utc::now())
        .unwrap();

    match ks.find_key(&ks.active().kid.clone()) {
        Some(KeyLookup::Active(record)) => assert!(record.private_jwk().is_private()),
        other => panic!("expected active lookup, got {:?}", other),
    }
    match ks.find_key(&old_kid) {
        Some(KeyLookup::Retired(retired)) => assert!(!retired.public_jwk.is_private()),
        other => panic!("expected retired lookup, got {:?}", other),
    }
    assert!(ks.find_key("no-such-kid").is_none());
}

#[test]
fn test_tokens_signed_before_rotation_still_verify() {
    let ks = Keystore::create(SigningAlgorithm::Ed25519).unwrap();
    let claims = crate::domain::entities::claims::Claims::new("authkit", "u1", Duration::minutes(15));
    let token = codec::sign(&claims, ks.active()).unwrap();

    let ks = ks
        .rotate(SigningAlgorithm::Es256, &policy(30, 7), Utc::now())
        .unwrap();

    let keys = ks.verification_keys().unwrap();
    let verified = codec::verify(&token, &keys).unwrap();
    assert_eq!(verified.claims, claims);
}

#[test]
fn test_document_round_trip() {
    let ks = Keystore::create(SigningAlgorithm::Es256).unwrap();
    let ks = ks
        .rotate(SigningAlgorithm::Es256, &policy(30, 7), Utc::now())
        .unwrap();

    let document = ks.to_document();
    // Only the active key is persisted with private material.
    assert!(document.active.jwk.is_private());
    assert!(document.previous.iter().all(|k| !k.public_jwk.is_private()));

    let restored = Keystore::from_document(&document).unwrap();
    assert_eq!(restored.active().kid, ks.active().kid);
    assert_eq!(restored.previous().len(), ks.previous().len());
    assert_eq!(restored.export_public_jwks(), ks.export_public_jwks());
}
