// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session lifetime.
const TOKEN_TTL_SECS: usize = 30 * 24 * 60 * 60; // 30 days

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account email
    pub email: String,
    /// Password hash at issue time
    pub password: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated caller extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
    pub password_hash: String,
}

impl AuthUser {
    /// Load the caller's record and check the token still matches it.
    ///
    /// A token minted before a password change carries the old hash and is
    /// refused.
    pub async fn load(&self, state: &AppState) -> Result<User, AppError> {
        let user = state
            .db
            .find_user_by_email(&self.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.password_hash != self.password_hash {
            tracing::debug!(user_id = %user.id, "Token predates password change");
            return Err(AppError::InvalidToken);
        }

        Ok(user)
    }
}

/// Middleware that requires valid JWT authentication.
///
/// Failure ends the request here; the handler never runs.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    // Auth schemes are case-insensitive (RFC 7235).
    let token = match auth_header {
        Some(h) if h.get(..7).is_some_and(|scheme| scheme.eq_ignore_ascii_case("bearer ")) => {
            h[7..].trim().to_string()
        }
        _ => return Err(AppError::Unauthorized),
    };

    let claims = verify_jwt(&token, &state.config.jwt_signing_key).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::InvalidToken
    })?;

    let auth_user = AuthUser {
        email: claims.email,
        password_hash: claims.password,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Decode and validate a session token.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> jsonwebtoken::errors::Result<Claims> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation).map(|data| data.claims)
}

/// Create a JWT for a user session.
pub fn create_jwt(email: &str, password_hash: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        email: email.to_string(),
        password: password_hash.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
