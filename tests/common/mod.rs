// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::Value;
use showtracker::config::Config;
use showtracker::db::{FirestoreDb, MemoryDb};
use showtracker::error::AppError;
use showtracker::models::{SearchResult, ShowDetails};
use showtracker::routes::create_router;
use showtracker::services::{ShowCatalog, ThumbnailMinifier};
use showtracker::AppState;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Catalog double with a fixed set of titles.
#[allow(dead_code)]
#[derive(Default)]
pub struct StubCatalog {
    titles: HashMap<String, ShowDetails>,
    search: Vec<SearchResult>,
}

#[allow(dead_code)]
impl StubCatalog {
    pub fn with_titles(ids: &[&str]) -> Self {
        let titles = ids
            .iter()
            .map(|id| (id.to_string(), details(id)))
            .collect();
        Self {
            titles,
            search: Vec::new(),
        }
    }

    pub fn with_search(mut self, results: Vec<SearchResult>) -> Self {
        self.search = results;
        self
    }
}

#[allow(dead_code)]
pub fn details(id: &str) -> ShowDetails {
    serde_json::from_value(serde_json::json!({
        "Title": format!("Title {}", id),
        "imdbID": id,
        "Type": "series",
    }))
    .unwrap()
}

#[async_trait]
impl ShowCatalog for StubCatalog {
    async fn get_show(&self, imdb_id: &str) -> Result<ShowDetails, AppError> {
        self.titles
            .get(imdb_id)
            .cloned()
            .ok_or_else(|| AppError::Catalog(format!("Unknown title {}", imdb_id)))
    }

    async fn search_series(&self, name: &str) -> Result<Vec<SearchResult>, AppError> {
        if name.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.search.iter().filter(|r| r.is_series()).cloned().collect())
    }
}

/// Create a test app with offline dependencies and the given catalog.
/// Returns the router, the shared state and the backing store.
#[allow(dead_code)]
pub fn create_test_app_with(catalog: StubCatalog) -> (axum::Router, Arc<AppState>, MemoryDb) {
    let config = Config::default();
    let db = MemoryDb::new();

    let state = Arc::new(AppState {
        config,
        db: Arc::new(db.clone()),
        catalog: Arc::new(catalog),
        minifier: Arc::new(ThumbnailMinifier::default()),
    });

    (create_router(state.clone()), state, db)
}

#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryDb) {
    create_test_app_with(StubCatalog::default())
}

/// Send a request and decode the JSON body.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// A registered account: its token and id.
#[allow(dead_code)]
pub struct TestAccount {
    pub token: String,
    pub id: String,
}

/// Register through the API and return the session.
#[allow(dead_code)]
pub async fn register(app: &axum::Router, name: &str, email: &str, password: &str) -> TestAccount {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(serde_json::json!({ "name": name, "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    assert_eq!(body["success"], true, "register failed: {}", body);

    TestAccount {
        token: body["token"].as_str().unwrap().to_string(),
        id: body["userData"]["id"].as_str().unwrap().to_string(),
    }
}

/// Make `a` and `b` friends through the request/accept endpoints.
#[allow(dead_code)]
pub async fn befriend(app: &axum::Router, a: &TestAccount, b: &TestAccount) {
    let (_, body) = send(
        app,
        "POST",
        "/index/request_friend",
        Some(&a.token),
        Some(serde_json::json!({ "friendId": b.id })),
    )
    .await;
    assert_eq!(body["success"], true, "request failed: {}", body);

    let (_, body) = send(
        app,
        "POST",
        "/index/accept_friend_request",
        Some(&b.token),
        Some(serde_json::json!({ "friendId": a.id })),
    )
    .await;
    assert_eq!(body["success"], true, "accept failed: {}", body);
}
