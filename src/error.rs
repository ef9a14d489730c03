// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every error renders as the same `{ success: false, msg }` envelope the
//! handlers use for successful responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message shown for any upstream failure. Details only go to the logs.
pub const GENERIC_FAILURE_MSG: &str = "Something went wrong on the server while loading the data";

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password is incorrect")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    msg: String,
}

impl AppError {
    /// HTTP status for this error.
    ///
    /// Lookup misses and validation conflicts are reported in the body only,
    /// the request itself was handled fine.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredentials | AppError::NotFound(_) | AppError::Conflict(_) => {
                StatusCode::OK
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Catalog(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true for failures of a collaborator (store, catalog, runtime).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::Catalog(_) | AppError::Database(_) | AppError::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let msg = match &self {
            AppError::Catalog(msg) => {
                tracing::error!(error = %msg, "Catalog error");
                GENERIC_FAILURE_MSG.to_string()
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                GENERIC_FAILURE_MSG.to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                GENERIC_FAILURE_MSG.to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            msg,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
