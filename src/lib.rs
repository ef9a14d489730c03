// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Showtracker: social show tracking backend
//!
//! Users keep a list of the shows they watch and befriend each other; the
//! homepage feed is aggregated from what their friends are watching.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::UserStore;
use services::{AvatarMinifier, ShowCatalog};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn UserStore>,
    pub catalog: Arc<dyn ShowCatalog>,
    pub minifier: Arc<dyn AvatarMinifier>,
}
