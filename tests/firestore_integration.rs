// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and
//! FIRESTORE_EMULATOR_HOST to point at it. They skip otherwise.

use showtracker::db::UserStore;
use showtracker::error::AppError;
use showtracker::models::{Show, User, UserPatch};
use showtracker::services::FriendAction;

mod common;
use common::test_db;

/// Unique suffix for test isolation across runs.
fn unique() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn test_user(name: &str) -> User {
    User::new(
        name,
        &format!("{}-{}@example.com", name.to_lowercase(), unique()),
        "hash".to_string(),
        chrono::Utc::now().to_rfc3339(),
    )
}

#[tokio::test]
async fn test_create_and_lookup_user() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user("Ada");

    assert!(db.get_user(&user.id).await.unwrap().is_none());
    db.create_user(&user).await.unwrap();

    let by_id = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id, user);

    let by_email = db.find_user_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    let err = db.create_user(&User { id: unique(), ..user.clone() }).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    db.delete_user(&user.id).await.unwrap();
}

#[tokio::test]
async fn test_patch_writes_only_masked_fields() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user("Ada");
    db.create_user(&user).await.unwrap();

    let shows = vec![Show::new("tt0903747", true)];
    db.apply_patch(&user.id, &UserPatch::Shows(shows.clone()))
        .await
        .unwrap();
    db.apply_patch(&user.id, &UserPatch::Name("Ada Lovelace".to_string()))
        .await
        .unwrap();

    let stored = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.shows, shows);
    assert_eq!(stored.name, "Ada Lovelace");
    assert_eq!(stored.name_lower, "ada lovelace");
    assert_eq!(stored.password_hash, "hash");

    db.delete_user(&user.id).await.unwrap();
}

#[tokio::test]
async fn test_friend_transitions_are_written_to_both_users() {
    require_emulator!();

    let db = test_db().await;
    let ada = test_user("Ada");
    let bob = test_user("Bob");
    db.create_user(&ada).await.unwrap();
    db.create_user(&bob).await.unwrap();

    let after_request = db
        .apply_friend_action(&ada.id, &bob.id, FriendAction::Request)
        .await
        .unwrap();
    assert_eq!(after_request.outgoing_friend_requests, vec![bob.id.clone()]);

    let stored_bob = db.get_user(&bob.id).await.unwrap().unwrap();
    assert_eq!(stored_bob.incoming_friend_requests, vec![ada.id.clone()]);

    // Repeating the request is refused and changes nothing.
    let err = db
        .apply_friend_action(&ada.id, &bob.id, FriendAction::Request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    db.apply_friend_action(&bob.id, &ada.id, FriendAction::Accept)
        .await
        .unwrap();

    let stored_ada = db.get_user(&ada.id).await.unwrap().unwrap();
    let stored_bob = db.get_user(&bob.id).await.unwrap().unwrap();
    assert_eq!(stored_ada.friends, vec![bob.id.clone()]);
    assert_eq!(stored_bob.friends, vec![ada.id.clone()]);
    assert!(stored_ada.outgoing_friend_requests.is_empty());
    assert!(stored_bob.incoming_friend_requests.is_empty());

    db.delete_user(&ada.id).await.unwrap();
    db.delete_user(&bob.id).await.unwrap();
}

#[tokio::test]
async fn test_search_users_by_name_prefix() {
    require_emulator!();

    let db = test_db().await;
    let tag = unique();
    let caller = test_user(&format!("Zed{}", tag));
    let match_a = test_user(&format!("Zed{}a", tag));
    let match_b = test_user(&format!("zed{}b", tag));
    for user in [&caller, &match_a, &match_b] {
        db.create_user(user).await.unwrap();
    }

    let found = db
        .search_users(&format!("ZED{}", tag), &caller.email, 25)
        .await
        .unwrap();
    let ids: Vec<&str> = found.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec![match_a.id.as_str(), match_b.id.as_str()]);

    for user in [&caller, &match_a, &match_b] {
        db.delete_user(&user.id).await.unwrap();
    }
}

#[tokio::test]
async fn test_concurrent_requests_to_one_user_both_land() {
    require_emulator!();

    let db = test_db().await;
    let ada = test_user("Ada");
    let cat = test_user("Cat");
    let bob = test_user("Bob");
    for user in [&ada, &cat, &bob] {
        db.create_user(user).await.unwrap();
    }

    let (from_ada, from_cat) = tokio::join!(
        db.apply_friend_action(&ada.id, &bob.id, FriendAction::Request),
        db.apply_friend_action(&cat.id, &bob.id, FriendAction::Request),
    );
    from_ada.unwrap();
    from_cat.unwrap();

    let stored_bob = db.get_user(&bob.id).await.unwrap().unwrap();
    let mut incoming = stored_bob.incoming_friend_requests.clone();
    incoming.sort();
    let mut expected = vec![ada.id.clone(), cat.id.clone()];
    expected.sort();
    assert_eq!(incoming, expected);

    for user in [&ada, &cat, &bob] {
        db.delete_user(&user.id).await.unwrap();
    }
}

#[tokio::test]
async fn test_concurrent_registrations_with_one_email() {
    require_emulator!();

    let db = test_db().await;
    let first = test_user("Ada");
    let second = User {
        id: unique(),
        ..first.clone()
    };

    let (a, b) = tokio::join!(db.create_user(&first), db.create_user(&second));
    assert!(a.is_ok() != b.is_ok(), "exactly one registration should win");
    let loser = if a.is_err() { a } else { b };
    assert!(matches!(loser, Err(AppError::Conflict(_))));

    let winner_id = db
        .find_user_by_email(&first.email)
        .await
        .unwrap()
        .unwrap()
        .id;
    let other_id = if winner_id == first.id { &second.id } else { &first.id };
    assert!(db.get_user(other_id).await.unwrap().is_none());

    db.delete_user(&winner_id).await.unwrap();
}

#[tokio::test]
async fn test_email_change_moves_claim() {
    require_emulator!();

    let db = test_db().await;
    let ada = test_user("Ada");
    let bob = test_user("Bob");
    db.create_user(&ada).await.unwrap();
    db.create_user(&bob).await.unwrap();

    let err = db
        .apply_patch(&ada.id, &UserPatch::Email(bob.email.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let new_email = format!("ada-{}@example.com", unique());
    db.apply_patch(&ada.id, &UserPatch::Email(new_email.clone()))
        .await
        .unwrap();

    // The old address is free again.
    let reuse = User {
        id: unique(),
        ..ada.clone()
    };
    db.create_user(&reuse).await.unwrap();

    for id in [&ada.id, &bob.id, &reuse.id] {
        db.delete_user(id).await.unwrap();
    }
}
