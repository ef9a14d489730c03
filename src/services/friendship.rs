// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend-request state machine.
//!
//! Relationship lists live on both user records. These functions mutate a
//! pair of in-memory records; the store is responsible for persisting both
//! writes together.

use crate::error::AppError;
use crate::models::User;

/// Relationship between two users, seen from the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    None,
    /// First user has asked the second
    Outgoing,
    /// Second user has asked the first
    Incoming,
    Friends,
}

/// Transition requested by the acting (authenticated) user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendAction {
    /// Actor asks `other` to become friends
    Request,
    /// Actor accepts the pending request from `other`
    Accept,
    /// Actor declines the pending request from `other`
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FriendshipError {
    #[error("You cannot send a friend request to yourself")]
    SelfRequest,

    #[error("You are already friends")]
    AlreadyFriends,

    #[error("A friend request between you is already pending")]
    AlreadyPending,

    #[error("No pending friend request from this user")]
    NoPendingRequest,
}

impl From<FriendshipError> for AppError {
    fn from(err: FriendshipError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

/// Classify the relationship between `a` and `b`.
///
/// Either side's list is enough to count; half-written pairs from older data
/// are treated as the state they were heading for.
pub fn relation(a: &User, b: &User) -> Relation {
    if a.friends.contains(&b.id) || b.friends.contains(&a.id) {
        Relation::Friends
    } else if a.outgoing_friend_requests.contains(&b.id)
        || b.incoming_friend_requests.contains(&a.id)
    {
        Relation::Outgoing
    } else if a.incoming_friend_requests.contains(&b.id)
        || b.outgoing_friend_requests.contains(&a.id)
    {
        Relation::Incoming
    } else {
        Relation::None
    }
}

/// Apply `action` by `actor` towards `other`, mutating both records.
///
/// On error neither record is modified.
pub fn apply(action: FriendAction, actor: &mut User, other: &mut User) -> Result<(), FriendshipError> {
    if actor.id == other.id {
        return Err(FriendshipError::SelfRequest);
    }

    match action {
        FriendAction::Request => match relation(actor, other) {
            Relation::None => {
                push_unique(&mut actor.outgoing_friend_requests, &other.id);
                push_unique(&mut other.incoming_friend_requests, &actor.id);
                Ok(())
            }
            Relation::Friends => Err(FriendshipError::AlreadyFriends),
            Relation::Outgoing | Relation::Incoming => Err(FriendshipError::AlreadyPending),
        },
        FriendAction::Accept => {
            ensure_incoming(actor, other)?;
            clear_pending(actor, other);
            push_unique(&mut actor.friends, &other.id);
            push_unique(&mut other.friends, &actor.id);
            Ok(())
        }
        FriendAction::Reject => {
            ensure_incoming(actor, other)?;
            clear_pending(actor, other);
            Ok(())
        }
    }
}

fn ensure_incoming(actor: &User, other: &User) -> Result<(), FriendshipError> {
    match relation(actor, other) {
        Relation::Incoming => Ok(()),
        Relation::Friends => Err(FriendshipError::AlreadyFriends),
        Relation::None | Relation::Outgoing => Err(FriendshipError::NoPendingRequest),
    }
}

/// Pull-all of the pending entries on both sides.
fn clear_pending(actor: &mut User, other: &mut User) {
    actor.incoming_friend_requests.retain(|id| id != &other.id);
    other.outgoing_friend_requests.retain(|id| id != &actor.id);
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}
