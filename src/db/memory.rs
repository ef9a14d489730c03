//! In-process user store.
//!
//! Everything sits behind one lock, so two-record transitions are atomic
//! for free. Used for local development (`STORAGE_BACKEND=memory`) and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{User, UserPatch};
use crate::services::friendship::{self, FriendAction};

#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Replace a user record wholesale. Test setup helper.
    pub async fn put_user(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

fn not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn apply_patch(&self, id: &str, patch: &UserPatch) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if let UserPatch::Email(email) = patch {
            if users.values().any(|other| other.id != id && other.email == normalize_email(email)) {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }
        let user = users.get_mut(id).ok_or_else(not_found)?;
        patch.apply(user);
        Ok(user.clone())
    }

    async fn search_users(
        &self,
        prefix: &str,
        exclude_email: &str,
        limit: usize,
    ) -> Result<Vec<User>, AppError> {
        let prefix = prefix.trim().to_lowercase();
        let users = self.users.read().await;

        let mut matches: Vec<User> = users
            .values()
            .filter(|user| user.email != exclude_email && user.name_lower.starts_with(&prefix))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name_lower.cmp(&b.name_lower).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(limit);

        Ok(matches)
    }

    async fn apply_friend_action(
        &self,
        actor_id: &str,
        other_id: &str,
        action: FriendAction,
    ) -> Result<User, AppError> {
        let mut users = self.users.write().await;

        let mut actor = users.get(actor_id).cloned().ok_or_else(not_found)?;
        let mut other = users.get(other_id).cloned().ok_or_else(not_found)?;

        friendship::apply(action, &mut actor, &mut other)?;

        users.insert(other.id.clone(), other);
        users.insert(actor.id.clone(), actor.clone());

        Ok(actor)
    }
}
