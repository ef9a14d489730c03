// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication tests.
//!
//! These tests verify that tokens created by the auth routes can be decoded
//! by the auth middleware, catching compatibility issues early.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use showtracker::middleware::auth::{create_jwt, verify_jwt};

/// Claims structure that must match what the middleware expects.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    email: String,
    password: String,
    exp: usize,
    iat: usize,
}

const KEY: &[u8] = b"test_jwt_key_32_bytes_minimum!!";

#[test]
fn test_jwt_roundtrip() {
    let token = create_jwt("ada@example.com", "$2b$04$abc", KEY).unwrap();

    let key = DecodingKey::from_secret(KEY);
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(&token, &key, &validation).expect("token should decode");

    assert_eq!(data.claims.email, "ada@example.com");
    assert_eq!(data.claims.password, "$2b$04$abc");
}

#[test]
fn test_jwt_expires_after_thirty_days() {
    let token = create_jwt("ada@example.com", "hash", KEY).unwrap();
    let claims = verify_jwt(&token, KEY).unwrap();

    assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
}

#[test]
fn test_expired_jwt_is_rejected() {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        email: "ada@example.com".to_string(),
        password: "hash".to_string(),
        iat: 1_000_000,
        exp: 1_000_060,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(KEY),
    )
    .unwrap();

    assert!(verify_jwt(&token, KEY).is_err());
}

#[test]
fn test_jwt_wrong_algorithm_fails() {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        email: "ada@example.com".to_string(),
        password: "hash".to_string(),
        iat: 0,
        exp: usize::MAX / 2,
    };
    let token = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(KEY),
    )
    .unwrap();

    assert!(verify_jwt(&token, KEY).is_err());
}

#[test]
fn test_tampered_jwt_fails() {
    let token = create_jwt("ada@example.com", "hash", KEY).unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();
    let forged_payload = create_jwt("mallory@example.com", "hash", b"different_key_also_32_bytes_long")
        .unwrap();
    let forged_parts: Vec<&str> = forged_payload.split('.').collect();
    parts[1] = forged_parts[1];

    assert!(verify_jwt(&parts.join("."), KEY).is_err());
}
