// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Showtracker API Server
//!
//! Social show tracking: users keep show lists, befriend each other and get a
//! homepage feed built from what their friends are watching.

use showtracker::{
    config::{Config, StorageBackend},
    db::{FirestoreDb, MemoryDb, UserStore},
    services::{OmdbClient, ThumbnailMinifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, storage = ?config.storage, "Starting Showtracker API");

    // Initialize the user store
    let db: Arc<dyn UserStore> = match config.storage {
        StorageBackend::Firestore => Arc::new(
            FirestoreDb::new(&config.gcp_project_id)
                .await
                .expect("Failed to connect to Firestore"),
        ),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    // External collaborators
    let catalog = Arc::new(OmdbClient::new(
        config.omdb_api_key.clone(),
        config.omdb_base_url.clone(),
    ));
    tracing::info!(base_url = %config.omdb_base_url, "Show catalog client initialized");

    let minifier = Arc::new(ThumbnailMinifier::default());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        catalog,
        minifier,
    });

    // Build router
    let app = showtracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("showtracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
