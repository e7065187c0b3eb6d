//! OMDb API client.
//!
//! OMDb requires an API key; the free tier allows 1000 requests per day,
//! which is plenty for title normalization at scheduling time.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::MovieInfo;
use super::{MovieLookup, MovieLookupError};

/// OMDb API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmdbConfig {
    /// OMDb API key (required).
    pub api_key: String,
    /// Base URL (default: https://www.omdbapi.com).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// OMDb API client.
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    /// Create a new OMDb client.
    pub fn new(config: OmdbConfig) -> Result<Self, MovieLookupError> {
        if config.api_key.is_empty() {
            return Err(MovieLookupError::NotConfigured(
                "OMDb API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://www.omdbapi.com".to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl MovieLookup for OmdbClient {
    async fn resolve_title(&self, title: &str) -> Result<MovieInfo, MovieLookupError> {
        debug!("OMDb title lookup: '{}'", title);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("t", title), ("apikey", &self.api_key)])
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(MovieLookupError::NotConfigured(
                "invalid OMDb API key".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MovieLookupError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: OmdbTitleResponse = response.json().await.map_err(|e| {
            MovieLookupError::Parse(format!("failed to parse title response: {}", e))
        })?;

        // OMDb reports lookup misses inside a 200 response.
        if !body.response.eq_ignore_ascii_case("true") {
            return Err(MovieLookupError::NotFound(title.to_string()));
        }

        let title = body
            .title
            .ok_or_else(|| MovieLookupError::Parse("response missing Title".to_string()))?;

        Ok(MovieInfo {
            title,
            year: none_if_na(body.year),
            genre: none_if_na(body.genre),
            director: none_if_na(body.director),
            actors: none_if_na(body.actors),
            plot: none_if_na(body.plot),
            poster: none_if_na(body.poster),
            imdb_rating: none_if_na(body.imdb_rating),
            runtime: none_if_na(body.runtime),
        })
    }
}

/// OMDb uses the literal string "N/A" for absent fields.
fn none_if_na(value: Option<String>) -> Option<String> {
    value.filter(|v| v != "N/A")
}

#[derive(Debug, Deserialize)]
struct OmdbTitleResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Genre")]
    genre: Option<String>,
    #[serde(rename = "Director")]
    director: Option<String>,
    #[serde(rename = "Actors")]
    actors: Option<String>,
    #[serde(rename = "Plot")]
    plot: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "Runtime")]
    runtime: Option<String>,
}
