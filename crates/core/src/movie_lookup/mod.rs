//! External movie-metadata lookup (OMDb).
//!
//! Used only to normalize a film title to its canonical form before a
//! showing is scheduled. Failures here are never retried by the engine.

mod omdb;
mod types;

pub use omdb::{OmdbClient, OmdbConfig};
pub use types::MovieInfo;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when querying the movie catalog.
#[derive(Debug, Error)]
pub enum MovieLookupError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// No movie matches the title.
    #[error("movie not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse the response.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Client not configured (missing API key, etc.).
    #[error("client not configured: {0}")]
    NotConfigured(String),
}

/// Trait for movie catalog clients.
#[async_trait]
pub trait MovieLookup: Send + Sync {
    /// Resolve a title to its canonical form with metadata attached.
    async fn resolve_title(&self, title: &str) -> Result<MovieInfo, MovieLookupError>;
}
