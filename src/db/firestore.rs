// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Users live in a single `users` collection keyed by their identifier.
//! Relationship lists are plain arrays on the user document; friend-request
//! transitions rewrite both documents in one transaction.
//!
//! Firestore has no unique indexes, so each email is claimed by a document
//! in `user_emails`. The claim and the user record are written in the same
//! transaction that read the claim, which makes concurrent registrations
//! with one address conflict at commit.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use firestore::{FirestoreConsistencySelector, FirestoreTransaction};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::db::{collections, UserStore};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{User, UserPatch};
use crate::services::friendship::{self, FriendAction};

/// Fields rewritten by a friend-request transition.
const RELATIONSHIP_FIELDS: [&str; 3] = [
    "friends",
    "incoming_friend_requests",
    "outgoing_friend_requests",
];

/// Attempts per transaction before contention is reported as an error.
const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

/// Marker document owning an email address.
#[derive(Debug, Serialize, Deserialize)]
struct EmailClaim {
    user_id: String,
}

/// Document id of the claim for `email`. Emails may contain characters
/// Firestore does not allow in ids.
fn email_key(email: &str) -> String {
    URL_SAFE_NO_PAD.encode(email)
}

/// Result of one transaction attempt.
enum Attempt<T> {
    Committed(T),
    /// Commit failed, usually because a concurrent transaction touched the
    /// same documents. Safe to run again from the start.
    Aborted(String),
}

fn db_err(e: firestore::errors::FirestoreError) -> AppError {
    AppError::Database(e.to_string())
}

/// A view of `client` whose reads join `transaction`.
fn transaction_reader(
    client: &firestore::FirestoreDb,
    transaction: &FirestoreTransaction<'_>,
) -> firestore::FirestoreDb {
    client.clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
        transaction.transaction_id().clone(),
    ))
}

async fn read_user(client: &firestore::FirestoreDb, id: &str) -> Result<Option<User>, AppError> {
    client
        .fluent()
        .select()
        .by_id_in(collections::USERS)
        .obj()
        .one(id)
        .await
        .map_err(db_err)
}

async fn require_user(client: &firestore::FirestoreDb, id: &str) -> Result<User, AppError> {
    read_user(client, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

async fn read_claim(
    client: &firestore::FirestoreDb,
    email: &str,
) -> Result<Option<EmailClaim>, AppError> {
    client
        .fluent()
        .select()
        .by_id_in(collections::USER_EMAILS)
        .obj()
        .one(email_key(email))
        .await
        .map_err(db_err)
}

fn stage_claim(
    client: &firestore::FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    email: &str,
    user_id: &str,
) -> Result<(), AppError> {
    client
        .fluent()
        .update()
        .in_col(collections::USER_EMAILS)
        .document_id(email_key(email))
        .object(&EmailClaim {
            user_id: user_id.to_string(),
        })
        .add_to_transaction(transaction)
        .map_err(|e| AppError::Database(format!("Failed to add email claim to transaction: {}", e)))?;
    Ok(())
}

async fn begin(client: &firestore::FirestoreDb) -> Result<FirestoreTransaction<'_>, AppError> {
    client
        .begin_transaction()
        .await
        .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))
}

/// Commit staged writes. A failed commit leaves nothing written.
async fn finish<T>(transaction: FirestoreTransaction<'_>, value: T) -> Attempt<T> {
    match transaction.commit().await {
        Ok(_) => Attempt::Committed(value),
        Err(e) => Attempt::Aborted(e.to_string()),
    }
}

async fn abandon(transaction: FirestoreTransaction<'_>) {
    if let Err(e) = transaction.rollback().await {
        tracing::debug!(error = %e, "Transaction rollback failed");
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Run a transaction body until it commits.
    ///
    /// Reads inside the body join the transaction, so a conflicting commit
    /// aborts one side and that side is re-run against fresh data.
    async fn run_with_retries<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Attempt<T>, AppError>>,
    {
        for n in 1..=MAX_TRANSACTION_ATTEMPTS {
            match attempt().await? {
                Attempt::Committed(value) => return Ok(value),
                Attempt::Aborted(reason) => {
                    tracing::warn!(operation, attempt = n, reason = %reason, "Transaction aborted");
                    tokio::time::sleep(Duration::from_millis(20 * 2u64.pow(n))).await;
                }
            }
        }

        Err(AppError::Database(format!(
            "{} did not commit after {} attempts",
            operation, MAX_TRANSACTION_ATTEMPTS
        )))
    }

    /// Delete a user document and its email claim. Used by tests to clean up
    /// after themselves.
    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let client = self.get_client()?;
        let Some(user) = read_user(client, id).await? else {
            return Ok(());
        };

        client
            .fluent()
            .delete()
            .from(collections::USER_EMAILS)
            .document_id(email_key(&user.email))
            .execute()
            .await
            .map_err(db_err)?;
        client
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(id)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn create_user_attempt(&self, user: &User) -> Result<Attempt<()>, AppError> {
        let client = self.get_client()?;
        let mut transaction = begin(client).await?;

        match stage_new_user(client, &mut transaction, user).await {
            Ok(()) => Ok(finish(transaction, ()).await),
            Err(e) => {
                abandon(transaction).await;
                Err(e)
            }
        }
    }

    async fn change_email_attempt(&self, id: &str, email: &str) -> Result<Attempt<User>, AppError> {
        let client = self.get_client()?;
        let mut transaction = begin(client).await?;

        match stage_email_change(client, &mut transaction, id, email).await {
            Ok(user) => Ok(finish(transaction, user).await),
            Err(e) => {
                abandon(transaction).await;
                Err(e)
            }
        }
    }

    async fn friend_action_attempt(
        &self,
        actor_id: &str,
        other_id: &str,
        action: FriendAction,
    ) -> Result<Attempt<User>, AppError> {
        let client = self.get_client()?;
        let mut transaction = begin(client).await?;

        match stage_friend_action(client, &mut transaction, actor_id, other_id, action).await {
            Ok(actor) => Ok(finish(transaction, actor).await),
            Err(e) => {
                abandon(transaction).await;
                Err(e)
            }
        }
    }
}

/// Claim the email and write the new user.
async fn stage_new_user(
    client: &firestore::FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    user: &User,
) -> Result<(), AppError> {
    let reader = transaction_reader(client, transaction);
    if read_claim(&reader, &user.email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    stage_claim(client, transaction, &user.email, &user.id)?;
    client
        .fluent()
        .update()
        .in_col(collections::USERS)
        .document_id(&user.id)
        .object(user)
        .add_to_transaction(transaction)
        .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;
    Ok(())
}

/// Move the user's email claim to `email` and update the record.
async fn stage_email_change(
    client: &firestore::FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    id: &str,
    email: &str,
) -> Result<User, AppError> {
    let email = normalize_email(email);
    let reader = transaction_reader(client, transaction);
    let (mut user, claim) = tokio::try_join!(require_user(&reader, id), read_claim(&reader, &email))?;

    if claim.is_some_and(|claim| claim.user_id != user.id) {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let patch = UserPatch::Email(email);
    let previous = std::mem::take(&mut user.email);
    patch.apply(&mut user);

    if previous != user.email {
        client
            .fluent()
            .delete()
            .from(collections::USER_EMAILS)
            .document_id(email_key(&previous))
            .add_to_transaction(transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add claim removal to transaction: {}", e))
            })?;
    }
    stage_claim(client, transaction, &user.email, &user.id)?;
    client
        .fluent()
        .update()
        .fields(patch.field_paths())
        .in_col(collections::USERS)
        .document_id(id)
        .object(&user)
        .add_to_transaction(transaction)
        .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

    Ok(user)
}

/// Read both users inside the transaction, apply the transition and stage
/// both writes. Returns the actor's updated record.
async fn stage_friend_action(
    client: &firestore::FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    actor_id: &str,
    other_id: &str,
    action: FriendAction,
) -> Result<User, AppError> {
    let reader = transaction_reader(client, transaction);
    let (mut actor, mut other) =
        tokio::try_join!(require_user(&reader, actor_id), require_user(&reader, other_id))?;

    if let Err(e) = friendship::apply(action, &mut actor, &mut other) {
        tracing::debug!(
            actor_id,
            other_id,
            action = ?action,
            reason = %e,
            "Friend transition rejected"
        );
        return Err(e.into());
    }

    for user in [&actor, &other] {
        client
            .fluent()
            .update()
            .fields(RELATIONSHIP_FIELDS)
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .add_to_transaction(transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;
    }

    Ok(actor)
}

#[async_trait]
impl UserStore for FirestoreDb {
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        read_user(self.get_client()?, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(db_err)?;

        Ok(users.into_iter().next())
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        self.run_with_retries("create_user", || self.create_user_attempt(user))
            .await?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(())
    }

    /// Email changes move the email claim in a transaction. Other patches
    /// write only their own fields, so a plain masked update is enough.
    async fn apply_patch(&self, id: &str, patch: &UserPatch) -> Result<User, AppError> {
        if let UserPatch::Email(email) = patch {
            let user = self
                .run_with_retries("change_email", || self.change_email_attempt(id, email))
                .await?;
            tracing::debug!(user_id = id, "Email changed");
            return Ok(user);
        }

        let mut user = require_user(self.get_client()?, id).await?;
        patch.apply(&mut user);

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(patch.field_paths())
            .in_col(collections::USERS)
            .document_id(id)
            .object(&user)
            .execute()
            .await
            .map_err(db_err)?;

        tracing::debug!(user_id = id, fields = ?patch.field_paths(), "User patched");
        Ok(user)
    }

    async fn search_users(
        &self,
        prefix: &str,
        exclude_email: &str,
        limit: usize,
    ) -> Result<Vec<User>, AppError> {
        let lower = prefix.trim().to_lowercase();
        // Range scan on the lowercased name covers every string with this prefix.
        let upper = format!("{}\u{f8ff}", lower);

        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| {
                q.for_all([
                    q.field("name_lower").greater_than_or_equal(lower.clone()),
                    q.field("name_lower").less_than(upper.clone()),
                ])
            })
            .order_by([("name_lower", firestore::FirestoreQueryDirection::Ascending)])
            // One extra to make up for the excluded caller.
            .limit((limit + 1) as u32)
            .obj()
            .query()
            .await
            .map_err(db_err)?;

        Ok(users
            .into_iter()
            .filter(|user| user.email != exclude_email)
            .take(limit)
            .collect())
    }

    /// Transactional read-modify-write of both user documents.
    ///
    /// The pure transition runs in memory; if it rejects the move, the
    /// transaction is rolled back and nothing is written. Both reads belong
    /// to the transaction, so a concurrent transition on either user aborts
    /// one commit and that side is re-run.
    async fn apply_friend_action(
        &self,
        actor_id: &str,
        other_id: &str,
        action: FriendAction,
    ) -> Result<User, AppError> {
        let actor = self
            .run_with_retries("friend_action", || {
                self.friend_action_attempt(actor_id, other_id, action)
            })
            .await?;

        tracing::info!(actor_id, other_id, action = ?action, "Friend transition committed");
        Ok(actor)
    }
}
