// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend request flow over HTTP.

use axum::http::StatusCode;
use serde_json::json;
use showtracker::db::UserStore;

mod common;

use common::{befriend, create_test_app, register, send, TestAccount};

async fn post_friend(
    app: &axum::Router,
    path: &str,
    actor: &TestAccount,
    friend_id: &str,
) -> (StatusCode, serde_json::Value) {
    send(
        app,
        "POST",
        path,
        Some(&actor.token),
        Some(json!({ "friendId": friend_id })),
    )
    .await
}

#[tokio::test]
async fn test_request_creates_pending_pair() {
    let (app, _, db) = create_test_app();
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;

    let (status, body) = post_friend(&app, "/index/request_friend", &ada, &bob.id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["msg"], "Friend request successfully processed");
    assert_eq!(
        body["propertiesToUpdate"]["outgoingFriendRequests"],
        json!([bob.id])
    );

    let stored_ada = db.get_user(&ada.id).await.unwrap().unwrap();
    let stored_bob = db.get_user(&bob.id).await.unwrap().unwrap();
    assert_eq!(stored_ada.outgoing_friend_requests, vec![bob.id.clone()]);
    assert_eq!(stored_bob.incoming_friend_requests, vec![ada.id.clone()]);
}

#[tokio::test]
async fn test_accept_makes_mutual_friends() {
    let (app, _, db) = create_test_app();
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;

    post_friend(&app, "/index/request_friend", &ada, &bob.id).await;
    let (_, body) = post_friend(&app, "/index/accept_friend_request", &bob, &ada.id).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["msg"], "Friend request successfully accepted");
    assert_eq!(body["propertiesToUpdate"]["friends"], json!([ada.id]));
    assert_eq!(
        body["propertiesToUpdate"]["incomingFriendRequests"],
        json!([])
    );

    let stored_ada = db.get_user(&ada.id).await.unwrap().unwrap();
    let stored_bob = db.get_user(&bob.id).await.unwrap().unwrap();
    assert_eq!(stored_ada.friends, vec![bob.id.clone()]);
    assert_eq!(stored_bob.friends, vec![ada.id.clone()]);
    assert!(stored_ada.outgoing_friend_requests.is_empty());
    assert!(stored_bob.incoming_friend_requests.is_empty());
}

#[tokio::test]
async fn test_reject_clears_pending_pair() {
    let (app, _, db) = create_test_app();
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;

    post_friend(&app, "/index/request_friend", &ada, &bob.id).await;
    let (_, body) = post_friend(&app, "/index/reject_friend_request", &bob, &ada.id).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["msg"], "Friend request successfully rejected");
    assert_eq!(
        body["propertiesToUpdate"]["incomingFriendRequests"],
        json!([])
    );
    assert!(body["propertiesToUpdate"].get("friends").is_none());

    let stored_ada = db.get_user(&ada.id).await.unwrap().unwrap();
    let stored_bob = db.get_user(&bob.id).await.unwrap().unwrap();
    assert!(stored_ada.outgoing_friend_requests.is_empty());
    assert!(stored_bob.incoming_friend_requests.is_empty());
    assert!(stored_ada.friends.is_empty());
    assert!(stored_bob.friends.is_empty());
}

#[tokio::test]
async fn test_request_between_friends_is_rejected() {
    let (app, _, db) = create_test_app();
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;
    befriend(&app, &ada, &bob).await;

    let (_, body) = post_friend(&app, "/index/request_friend", &bob, &ada.id).await;
    assert_eq!(body["success"], false);

    let stored_ada = db.get_user(&ada.id).await.unwrap().unwrap();
    assert!(stored_ada.incoming_friend_requests.is_empty());
    assert_eq!(stored_ada.friends, vec![bob.id.clone()]);
}

#[tokio::test]
async fn test_accept_without_pending_request_fails() {
    let (app, _, db) = create_test_app();
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;

    let (_, body) = post_friend(&app, "/index/accept_friend_request", &bob, &ada.id).await;
    assert_eq!(body["success"], false);

    let stored_bob = db.get_user(&bob.id).await.unwrap().unwrap();
    assert!(stored_bob.friends.is_empty());
}

#[tokio::test]
async fn test_request_to_self_or_unknown_user_fails() {
    let (app, _, _) = create_test_app();
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;

    let (_, body) = post_friend(&app, "/index/request_friend", &ada, &ada.id).await;
    assert_eq!(body["success"], false);

    let (_, body) = post_friend(&app, "/index/request_friend", &ada, "no-such-user").await;
    assert_eq!(body["success"], false);
    assert_eq!(body["msg"], "User not found");
}

#[tokio::test]
async fn test_friends_page_lists_all_relationships() {
    let (app, _, _) = create_test_app();
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;
    let cat = register(&app, "Cat", "cat@example.com", "pw").await;
    let dan = register(&app, "Dan", "dan@example.com", "pw").await;

    befriend(&app, &ada, &bob).await;
    post_friend(&app, "/index/request_friend", &cat, &ada.id).await;
    post_friend(&app, "/index/request_friend", &ada, &dan.id).await;

    let (status, body) = send(&app, "GET", "/index/friends_page_data", Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["friends"][0]["id"], bob.id);
    assert_eq!(body["incoming"][0]["id"], cat.id);
    assert_eq!(body["outgoing"][0]["id"], dan.id);
    assert!(body["friends"][0].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_search_users_excludes_caller() {
    let (app, _, _) = create_test_app();
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    register(&app, "Adam", "adam@example.com", "pw").await;
    register(&app, "Bob", "bob@example.com", "pw").await;

    let (status, body) = send(
        &app,
        "GET",
        "/index/search_users?searchQuery=ad",
        Some(&ada.token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "Adam");
}
