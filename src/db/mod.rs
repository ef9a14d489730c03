//! Database layer.
//!
//! `UserStore` is the seam between handlers and persistence. Production uses
//! Firestore; `MemoryDb` backs local runs and tests.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use self::memory::MemoryDb;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};

use crate::error::AppError;
use crate::models::{User, UserPatch};
use crate::services::friendship::FriendAction;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// One document per email address, owned by a user id.
    pub const USER_EMAILS: &str = "user_emails";
}

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Persistence operations on user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by identifier.
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Get a user by (normalized) email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Store a new user. Fails with `Conflict` if the email is taken.
    async fn create_user(&self, user: &User) -> Result<(), AppError>;

    /// Write only the fields named by `patch`. Returns the updated user.
    async fn apply_patch(&self, id: &str, patch: &UserPatch) -> Result<User, AppError>;

    /// Users whose name starts with `prefix` (case-insensitive), ordered by
    /// name, excluding `exclude_email`.
    async fn search_users(
        &self,
        prefix: &str,
        exclude_email: &str,
        limit: usize,
    ) -> Result<Vec<User>, AppError>;

    /// Apply a friend-request transition to both records atomically.
    /// Returns the actor's updated record.
    async fn apply_friend_action(
        &self,
        actor_id: &str,
        other_id: &str,
        action: FriendAction,
    ) -> Result<User, AppError>;

    /// Resolve many ids concurrently, in order. Ids that no longer resolve
    /// are skipped.
    async fn get_users(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = stream::iter(ids.iter().cloned())
            .map(|id| async move { self.get_user(&id).await.map(|user| (id, user)) })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<_, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(found
            .into_iter()
            .filter_map(|(id, user)| {
                if user.is_none() {
                    tracing::warn!(user_id = %id, "Referenced user no longer exists");
                }
                user
            })
            .collect())
    }
}
