// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod show;
pub mod update;
pub mod user;

pub use show::{SearchResult, ShowDetails, TrackedShow};
pub use update::{PropertyUpdate, UserPatch};
pub use user::{Show, User, UserProfile};
