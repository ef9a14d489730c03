//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// A show on a user's list. Copied per user, not shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    /// External catalog (IMDb) identifier
    pub imdb_id: String,
    #[serde(default)]
    pub currently_watching: bool,
}

impl Show {
    pub fn new(imdb_id: impl Into<String>, currently_watching: bool) -> Self {
        Self {
            imdb_id: imdb_id.into(),
            currently_watching,
        }
    }
}

/// User record stored in Firestore.
///
/// Field names are stored as-is (snake_case) so update masks can name them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier (also used as document ID)
    pub id: String,
    /// Unique, trimmed and lowercased
    pub email: String,
    pub name: String,
    /// Lowercased name, used for prefix search
    #[serde(default)]
    pub name_lower: String,
    /// bcrypt hash
    pub password_hash: String,
    /// Minified avatar as a `data:` URL
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub shows: Vec<Show>,
    #[serde(default)]
    pub friends: Vec<String>,
    #[serde(default)]
    pub incoming_friend_requests: Vec<String>,
    #[serde(default)]
    pub outgoing_friend_requests: Vec<String>,
    /// When the account was created (RFC3339)
    #[serde(default)]
    pub created_at: String,
}

impl User {
    /// Build a fresh user with empty lists and a new random identifier.
    pub fn new(name: &str, email: &str, password_hash: String, created_at: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(email),
            name: name.trim().to_string(),
            name_lower: name.trim().to_lowercase(),
            password_hash,
            avatar: None,
            shows: Vec::new(),
            friends: Vec::new(),
            incoming_friend_requests: Vec::new(),
            outgoing_friend_requests: Vec::new(),
            created_at,
        }
    }
}

/// Canonical form of an email address used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
    pub shows: Vec<Show>,
    pub friends: Vec<String>,
    pub incoming_friend_requests: Vec<String>,
    pub outgoing_friend_requests: Vec<String>,
    pub created_at: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar: user.avatar,
            shows: user.shows,
            friends: user.friends,
            incoming_friend_requests: user.incoming_friend_requests,
            outgoing_friend_requests: user.outgoing_friend_requests,
            created_at: user.created_at,
        }
    }
}
