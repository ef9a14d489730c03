// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic and external collaborators.

pub mod avatar;
pub mod catalog;
pub mod feed;
pub mod friendship;
pub mod password;

pub use avatar::{AvatarMinifier, ThumbnailMinifier};
pub use catalog::{OmdbClient, ShowCatalog};
pub use feed::HomepageFeed;
pub use friendship::FriendAction;
