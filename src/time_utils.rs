// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Timestamp helpers for stored records.

use chrono::{DateTime, SecondsFormat, Utc};

/// RFC3339 with whole seconds and a `Z` suffix, e.g. `2026-01-01T00:00:00Z`.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Creation timestamp for a new record.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}
