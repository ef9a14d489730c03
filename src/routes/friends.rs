// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend list and friend-request routes.
//!
//! The acting user is always the token holder. Bodies name the other party
//! with `friendId`; any `userId` the client sends along is ignored.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::UserProfile;
use crate::routes::{success, ApiJson, Envelope};
use crate::services::friendship::FriendAction;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/index/friends_page_data", get(get_friends_page))
        .route("/index/request_friend", post(request_friend))
        .route("/index/accept_friend_request", post(accept_friend_request))
        .route("/index/reject_friend_request", post(reject_friend_request))
}

// ─── Friends Page ────────────────────────────────────────────

#[derive(Serialize)]
pub struct FriendsPageResponse {
    pub user: UserProfile,
    pub friends: Vec<UserProfile>,
    pub incoming: Vec<UserProfile>,
    pub outgoing: Vec<UserProfile>,
}

/// Friends plus both directions of pending requests, resolved concurrently.
async fn get_friends_page(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Envelope<FriendsPageResponse>>> {
    let user = auth.load(&state).await?;

    let (friends, incoming, outgoing) = tokio::try_join!(
        state.db.get_users(&user.friends),
        state.db.get_users(&user.incoming_friend_requests),
        state.db.get_users(&user.outgoing_friend_requests),
    )?;

    let profiles = |users: Vec<crate::models::User>| -> Vec<UserProfile> {
        users.into_iter().map(UserProfile::from).collect()
    };

    Ok(success(
        "Successfully loaded friends data",
        FriendsPageResponse {
            user: user.into(),
            friends: profiles(friends),
            incoming: profiles(incoming),
            outgoing: profiles(outgoing),
        },
    ))
}

// ─── Friend Requests ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub friend_id: String,
}

/// Relationship lists echoed after a transition, as the client caches them.
#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friends: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming_friend_requests: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing_friend_requests: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendActionResponse {
    pub properties_to_update: RelationshipUpdate,
}

/// Run one transition for the caller and echo the lists it changed.
async fn transition(
    state: &AppState,
    auth: &AuthUser,
    friend_id: &str,
    action: FriendAction,
) -> Result<RelationshipUpdate> {
    let user = auth.load(state).await?;
    let updated = state
        .db
        .apply_friend_action(&user.id, friend_id, action)
        .await?;

    tracing::info!(
        user_id = %user.id,
        friend_id,
        action = ?action,
        "Friend request processed"
    );

    Ok(match action {
        FriendAction::Request => RelationshipUpdate {
            outgoing_friend_requests: Some(updated.outgoing_friend_requests),
            ..Default::default()
        },
        FriendAction::Accept => RelationshipUpdate {
            friends: Some(updated.friends),
            incoming_friend_requests: Some(updated.incoming_friend_requests),
            ..Default::default()
        },
        FriendAction::Reject => RelationshipUpdate {
            incoming_friend_requests: Some(updated.incoming_friend_requests),
            ..Default::default()
        },
    })
}

/// Send a friend request to `friendId`.
async fn request_friend(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<FriendRequestBody>,
) -> Result<Json<Envelope<FriendActionResponse>>> {
    let update = transition(&state, &auth, &body.friend_id, FriendAction::Request).await?;
    Ok(success(
        "Friend request successfully processed",
        FriendActionResponse {
            properties_to_update: update,
        },
    ))
}

/// Accept the pending request from `friendId`.
async fn accept_friend_request(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<FriendRequestBody>,
) -> Result<Json<Envelope<FriendActionResponse>>> {
    let update = transition(&state, &auth, &body.friend_id, FriendAction::Accept).await?;
    Ok(success(
        "Friend request successfully accepted",
        FriendActionResponse {
            properties_to_update: update,
        },
    ))
}

/// Decline the pending request from `friendId`.
async fn reject_friend_request(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<FriendRequestBody>,
) -> Result<Json<Envelope<FriendActionResponse>>> {
    let update = transition(&state, &auth, &body.friend_id, FriendAction::Reject).await?;
    Ok(success(
        "Friend request successfully rejected",
        FriendActionResponse {
            properties_to_update: update,
        },
    ))
}
