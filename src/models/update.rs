//! Profile update commands.
//!
//! `PropertyUpdate` is what a client asks for. It is externally tagged, so a
//! payload such as `{"email": "new@example.com"}` selects the variant by its
//! single key. `UserPatch` is what actually gets written once the handler has
//! done the per-variant work (minify, hash, uniqueness check).

use serde::Deserialize;
use serde_json::json;

use crate::models::user::{normalize_email, Show, User};

/// Requested change to the current user's profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyUpdate {
    /// Image as a `data:` URL or bare base64
    Avatar(String),
    Email(String),
    Password(String),
    Name(String),
    Shows(Vec<Show>),
}

/// Field-level write applied to a stored user.
#[derive(Debug, Clone, PartialEq)]
pub enum UserPatch {
    Avatar(String),
    Email(String),
    PasswordHash(String),
    Name(String),
    Shows(Vec<Show>),
}

impl UserPatch {
    /// Stored field paths touched by this patch (Firestore update mask).
    pub fn field_paths(&self) -> &'static [&'static str] {
        match self {
            UserPatch::Avatar(_) => &["avatar"],
            UserPatch::Email(_) => &["email"],
            UserPatch::PasswordHash(_) => &["password_hash"],
            UserPatch::Name(_) => &["name", "name_lower"],
            UserPatch::Shows(_) => &["shows"],
        }
    }

    pub fn apply(&self, user: &mut User) {
        match self {
            UserPatch::Avatar(avatar) => user.avatar = Some(avatar.clone()),
            UserPatch::Email(email) => user.email = normalize_email(email),
            UserPatch::PasswordHash(hash) => user.password_hash = hash.clone(),
            UserPatch::Name(name) => {
                user.name = name.trim().to_string();
                user.name_lower = user.name.to_lowercase();
            }
            UserPatch::Shows(shows) => user.shows = shows.clone(),
        }
    }

    /// Client-facing echo of what was saved. Password hashes are never echoed.
    pub fn echo(&self) -> serde_json::Value {
        match self {
            UserPatch::Avatar(avatar) => json!({ "avatar": avatar }),
            UserPatch::Email(email) => json!({ "email": normalize_email(email) }),
            UserPatch::PasswordHash(_) => json!({}),
            UserPatch::Name(name) => json!({ "name": name.trim() }),
            UserPatch::Shows(shows) => json!({ "shows": shows }),
        }
    }
}
