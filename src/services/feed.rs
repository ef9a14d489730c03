// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Homepage feed aggregation over the friend graph.
//!
//! Given the requesting user's friends (with their full show lists) this
//! builds:
//! - what each friend is currently watching
//! - a popularity ranking of shows by how many friend entries reference them
//! - the distinct show ids that need resolving against the catalog

use indexmap::IndexMap;
use serde::Serialize;

use crate::models::{Show, User};

/// One friend's relationship to a show in the popularity ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Watcher {
    pub friend_id: String,
    pub currently_watching: bool,
}

/// Aggregated homepage data.
///
/// Both maps serialize as JSON objects in map order, so the popularity
/// ranking order survives the trip to the client.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomepageFeed {
    /// Friend id -> shows that friend is currently watching (never empty)
    pub currently_watching: IndexMap<String, Vec<Show>>,
    /// Show id -> every friend entry for that show, most referenced first
    pub all_time_popular: IndexMap<String, Vec<Watcher>>,
    /// Distinct show ids in first-encounter order
    #[serde(skip)]
    pub show_ids: Vec<String>,
}

/// Aggregate the homepage feed from the friends' show lists.
pub fn aggregate(friends: &[User]) -> HomepageFeed {
    let mut currently_watching: IndexMap<String, Vec<Show>> = IndexMap::new();
    let mut all_time_popular: IndexMap<String, Vec<Watcher>> = IndexMap::new();

    for friend in friends {
        let watching: Vec<Show> = friend
            .shows
            .iter()
            .filter(|show| show.currently_watching)
            .cloned()
            .collect();

        for show in &friend.shows {
            all_time_popular
                .entry(show.imdb_id.clone())
                .or_default()
                .push(Watcher {
                    friend_id: friend.id.clone(),
                    currently_watching: show.currently_watching,
                });
        }

        if !watching.is_empty() {
            currently_watching
                .entry(friend.id.clone())
                .or_default()
                .extend(watching);
        }
    }

    // Insertion order is first-encounter order; capture it before ranking.
    let show_ids: Vec<String> = all_time_popular.keys().cloned().collect();

    // Stable: equal counts keep encounter order.
    all_time_popular.sort_by(|_, a, _, b| b.len().cmp(&a.len()));

    HomepageFeed {
        currently_watching,
        all_time_popular,
        show_ids,
    }
}
