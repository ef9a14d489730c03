// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::user::normalize_email;
use crate::models::{
    PropertyUpdate, SearchResult, ShowDetails, TrackedShow, UserPatch, UserProfile,
};
use crate::routes::{success, ApiJson, Envelope};
use crate::services::avatar::decode_data_url;
use crate::services::feed::{self, HomepageFeed};
use crate::services::password::hash_password;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upper bound on user search results.
const MAX_USER_SEARCH_RESULTS: usize = 25;
/// Longest accepted search string.
const MAX_SEARCH_QUERY_LEN: usize = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/index/profile_page_data", get(get_profile))
        .route("/index/update_user_data", post(update_user_data))
        .route("/index/home_page_data", get(get_home_page))
        .route("/index/shows_page_data", get(get_shows_page))
        .route("/index/search_shows", get(search_shows))
        .route("/index/search_users", get(search_users))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    #[serde(default)]
    search_query: String,
}

impl SearchQuery {
    fn validated(&self) -> Result<&str> {
        let query = self.search_query.trim();
        if query.len() > MAX_SEARCH_QUERY_LEN {
            return Err(AppError::BadRequest(format!(
                "Search query too long (max {} characters)",
                MAX_SEARCH_QUERY_LEN
            )));
        }
        Ok(query)
    }
}

// ─── User Profile ────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
}

/// Get current user profile.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<ProfileResponse>>> {
    let user = auth.load(&state).await?;

    Ok(success(
        "Successfully loaded profile data",
        ProfileResponse { user: user.into() },
    ))
}

// ─── Profile Updates ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserRequest {
    properties_to_update: PropertyUpdate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserResponse {
    pub properties_to_update: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Apply one property update to the current user.
///
/// Email and password changes invalidate the old token's claims, so a new
/// token is issued with the response.
async fn update_user_data(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<Envelope<UpdateUserResponse>>> {
    let user = auth.load(&state).await?;
    let signing_key = &state.config.jwt_signing_key;

    let (patch, token) = match req.properties_to_update {
        PropertyUpdate::Avatar(data_url) => {
            let raw = decode_data_url(&data_url)?;
            let raw_size = raw.len();
            let minified = state.minifier.minify(raw).await?;
            tracing::info!(
                user_id = %user.id,
                raw_size,
                minified_size = minified.bytes.len(),
                "Avatar updated"
            );
            (UserPatch::Avatar(minified.to_data_url()), None)
        }
        PropertyUpdate::Email(email) => {
            let email = normalize_email(&email);
            if !validator::ValidateEmail::validate_email(&email) {
                return Err(AppError::BadRequest("Invalid email".to_string()));
            }
            if email != user.email && state.db.find_user_by_email(&email).await?.is_some() {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
            let token = create_jwt(&email, &user.password_hash, signing_key)?;
            (UserPatch::Email(email), Some(token))
        }
        PropertyUpdate::Password(password) => {
            if password.is_empty() {
                return Err(AppError::BadRequest("Invalid password".to_string()));
            }
            let hash = hash_password(&password, state.config.bcrypt_cost).await?;
            let token = create_jwt(&user.email, &hash, signing_key)?;
            (UserPatch::PasswordHash(hash), Some(token))
        }
        PropertyUpdate::Name(name) => {
            if name.trim().is_empty() {
                return Err(AppError::BadRequest("Invalid name".to_string()));
            }
            (UserPatch::Name(name), None)
        }
        PropertyUpdate::Shows(shows) => (UserPatch::Shows(shows), None),
    };

    state.db.apply_patch(&user.id, &patch).await?;
    tracing::debug!(user_id = %user.id, fields = ?patch.field_paths(), "User data saved");

    Ok(success(
        "Successfully saved the data!",
        UpdateUserResponse {
            properties_to_update: patch.echo(),
            token,
        },
    ))
}

// ─── Homepage ────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePageResponse {
    pub user: UserProfile,
    #[serde(flatten)]
    pub feed: HomepageFeed,
    pub cached_shows: Vec<ShowDetails>,
    pub cached_friends: Vec<UserProfile>,
}

/// Aggregate what the user's friends are watching.
async fn get_home_page(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<HomePageResponse>>> {
    let user = auth.load(&state).await?;
    let friends = state.db.get_users(&user.friends).await?;

    let feed = feed::aggregate(&friends);
    let cached_shows = state.catalog.get_shows(&feed.show_ids).await?;

    tracing::debug!(
        user_id = %user.id,
        friends = friends.len(),
        shows = cached_shows.len(),
        "Homepage aggregated"
    );

    Ok(success(
        "Successfully created homepage data",
        HomePageResponse {
            user: user.into(),
            feed,
            cached_shows,
            cached_friends: friends.into_iter().map(UserProfile::from).collect(),
        },
    ))
}

// ─── Shows ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ShowsPageResponse {
    pub user: UserProfile,
    pub shows: Vec<TrackedShow>,
}

/// The user's own shows with catalog metadata.
async fn get_shows_page(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<ShowsPageResponse>>> {
    let user = auth.load(&state).await?;

    let imdb_ids: Vec<String> = user.shows.iter().map(|s| s.imdb_id.clone()).collect();
    let details = state.catalog.get_shows(&imdb_ids).await?;

    // Batch results come back in request order, so they line up by index.
    let shows = details
        .into_iter()
        .zip(&user.shows)
        .map(|(details, show)| TrackedShow {
            details,
            currently_watching: show.currently_watching,
        })
        .collect();

    Ok(success(
        "Successfully loaded shows data",
        ShowsPageResponse {
            user: user.into(),
            shows,
        },
    ))
}

#[derive(Serialize)]
pub struct ShowSearchResponse {
    pub results: Vec<SearchResult>,
}

/// Search the catalog for series by name.
async fn search_shows(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Envelope<ShowSearchResponse>>> {
    let query = params.validated()?;
    let results = state.catalog.search_series(query).await?;

    Ok(success(
        "Successfully retrieved results for search query",
        ShowSearchResponse { results },
    ))
}

// ─── Users ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UserSearchResponse {
    pub results: Vec<UserProfile>,
}

/// Find other users by name prefix.
async fn search_users(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Envelope<UserSearchResponse>>> {
    let query = params.validated()?;
    let users = state
        .db
        .search_users(query, &normalize_email(&auth.email), MAX_USER_SEARCH_RESULTS)
        .await?;

    Ok(success(
        "Successfully retrieved results for search query",
        UserSearchResponse {
            results: users.into_iter().map(UserProfile::from).collect(),
        },
    ))
}
