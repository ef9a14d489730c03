//! Show metadata returned by the external catalog.
//!
//! OMDb answers in PascalCase with a few oddly-cased keys; the API re-emits
//! the same data in camelCase.

use serde::{Deserialize, Serialize};

/// Catalog type string for TV series.
pub const SERIES_TYPE: &str = "series";

/// Full metadata for a single title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "PascalCase"))]
pub struct ShowDetails {
    #[serde(rename(deserialize = "imdbID"))]
    pub imdb_id: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub rated: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub actors: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default, rename(deserialize = "imdbRating"))]
    pub imdb_rating: Option<String>,
    #[serde(default, rename(deserialize = "totalSeasons"))]
    pub total_seasons: Option<String>,
    #[serde(default, rename(serialize = "type", deserialize = "Type"))]
    pub kind: Option<String>,
}

/// Show metadata with the requesting user's watch flag overlaid.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedShow {
    #[serde(flatten)]
    pub details: ShowDetails,
    pub currently_watching: bool,
}

/// One hit from a catalog name search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "PascalCase"))]
pub struct SearchResult {
    #[serde(rename(deserialize = "imdbID"))]
    pub imdb_id: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(rename(serialize = "type", deserialize = "Type"))]
    pub kind: String,
}

impl SearchResult {
    pub fn is_series(&self) -> bool {
        self.kind == SERIES_TYPE
    }
}
