// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External show catalog (OMDb).
//!
//! Handles:
//! - Single title lookup by IMDb id
//! - Batch lookup (bounded fan-out, results in request order)
//! - Name search restricted to series

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{SearchResult, ShowDetails};

const MAX_CONCURRENT_LOOKUPS: usize = 16;

/// Read-only access to show metadata.
#[async_trait]
pub trait ShowCatalog: Send + Sync {
    /// Fetch metadata for one title.
    async fn get_show(&self, imdb_id: &str) -> Result<ShowDetails, AppError>;

    /// Search titles by name, returning series only.
    async fn search_series(&self, name: &str) -> Result<Vec<SearchResult>, AppError>;

    /// Fetch metadata for many titles. Output order matches `imdb_ids`; any
    /// failed lookup fails the whole batch.
    async fn get_shows(&self, imdb_ids: &[String]) -> Result<Vec<ShowDetails>, AppError> {
        if imdb_ids.is_empty() {
            return Ok(Vec::new());
        }

        stream::iter(imdb_ids.iter().cloned())
            .map(|id| async move { self.get_show(&id).await })
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .collect::<Vec<Result<ShowDetails, AppError>>>()
            .await
            .into_iter()
            .collect()
    }
}

/// Raw OMDb title response. `Response` is the string "True" or "False".
#[derive(Debug, Deserialize)]
struct OmdbTitleResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(flatten)]
    details: serde_json::Value,
}

/// Raw OMDb search response.
#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "Search", default)]
    search: Vec<SearchResult>,
}

/// OMDb HTTP API client.
#[derive(Clone)]
pub struct OmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// GET the base URL with the given query plus the API key.
    async fn query<T: for<'de> Deserialize<'de>>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Catalog(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                tracing::warn!("OMDb rejected the API key");
            }
            return Err(AppError::Catalog(format!("HTTP {}: {}", status, body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Catalog(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl ShowCatalog for OmdbClient {
    async fn get_show(&self, imdb_id: &str) -> Result<ShowDetails, AppError> {
        let raw: OmdbTitleResponse = self.query(&[("i", imdb_id)]).await?;
        parse_title(raw)
    }

    async fn search_series(&self, name: &str) -> Result<Vec<SearchResult>, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }

        let raw: OmdbSearchResponse = self.query(&[("s", name)]).await?;
        let results = series_only(raw)?;
        tracing::debug!(query = name, count = results.len(), "Catalog search finished");
        Ok(results)
    }
}

fn parse_title(raw: OmdbTitleResponse) -> Result<ShowDetails, AppError> {
    if raw.response != "True" {
        return Err(AppError::Catalog(
            raw.error.unwrap_or_else(|| "Unknown catalog error".to_string()),
        ));
    }
    serde_json::from_value(raw.details)
        .map_err(|e| AppError::Catalog(format!("Unexpected title shape: {}", e)))
}

/// Keep only series from a search answer.
///
/// "Not found" and "Too many results" (OMDb's answer to very short queries)
/// are both an empty result.
fn series_only(raw: OmdbSearchResponse) -> Result<Vec<SearchResult>, AppError> {
    if raw.response != "True" {
        let error = raw.error.unwrap_or_default();
        if error.ends_with("not found!") || error.starts_with("Too many results") {
            return Ok(Vec::new());
        }
        return Err(AppError::Catalog(error));
    }
    Ok(raw.search.into_iter().filter(SearchResult::is_series).collect())
}
