// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration and login routes.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, Result};
use crate::middleware::auth::create_jwt;
use crate::models::user::normalize_email;
use crate::models::{User, UserProfile};
use crate::routes::{success, ApiJson, Envelope};
use crate::services::password::{hash_password, verify_password};
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Session issued by register and login.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user_data: UserProfile,
}

/// Turn validator output into a single client-facing message.
fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|field| field.to_string())
        .collect();
    fields.sort();
    format!("Invalid {}", fields.join(", "))
}

fn issue_token(state: &AppState, user: &User) -> Result<String> {
    create_jwt(&user.email, &user.password_hash, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
}

/// Create an account and log it in.
async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(mut req): ApiJson<RegisterRequest>,
) -> Result<Json<Envelope<SessionResponse>>> {
    req.email = normalize_email(&req.email);
    req.name = req.name.trim().to_string();
    req.validate()
        .map_err(|e| AppError::BadRequest(validation_message(&e)))?;

    if state.db.find_user_by_email(&req.email).await?.is_some() {
        tracing::info!("Registration rejected: email already exists");
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let hash = hash_password(&req.password, state.config.bcrypt_cost).await?;
    let user = User::new(
        &req.name,
        &req.email,
        hash,
        now_rfc3339(),
    );
    // Registrations racing past the check above are settled by the store:
    // one lock in memory, an email claim document in Firestore.
    state.db.create_user(&user).await?;

    let token = issue_token(&state, &user)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok(success(
        "Successfully created new user!",
        SessionResponse {
            token,
            user_data: user.into(),
        },
    ))
}

/// Check credentials and issue a session token.
async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(mut req): ApiJson<LoginRequest>,
) -> Result<Json<Envelope<SessionResponse>>> {
    req.email = normalize_email(&req.email);
    req.validate()
        .map_err(|e| AppError::BadRequest(validation_message(&e)))?;

    let user = state
        .db
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&req.password, &user.password_hash).await? {
        tracing::info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&state, &user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(success(
        "Successfully logged in!",
        SessionResponse {
            token,
            user_data: user.into(),
        },
    ))
}
