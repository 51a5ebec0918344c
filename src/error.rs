//! Custom error types for pubsync.
//!
//! `InvalidQuery` and `Fetch` abort a sync run. `Emit` is recovered per
//! article by the emitter and never crosses the batch boundary.

use thiserror::Error;

/// Main error type for pubsync operations.
#[derive(Debug, Error)]
pub enum PubsyncError {
    /// Author query was malformed (neither or both of ORCID and name)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Works API answered with a non-success status
    #[error("Fetch failed with HTTP status {status}")]
    Fetch {
        /// HTTP status code returned by the API
        status: u16,
    },

    /// Writing or rendering a single article page failed
    #[error("Failed to emit '{slug}': {message}")]
    Emit {
        /// Slug of the article that failed
        slug: String,
        /// Underlying failure
        message: String,
    },

    /// Network/HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body or HTML parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl PubsyncError {
    /// Wrap any displayable failure as an emit error for `slug`.
    pub fn emit(slug: &str, err: impl std::fmt::Display) -> Self {
        Self::Emit {
            slug: slug.to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type alias using `PubsyncError`
pub type Result<T> = std::result::Result<T, PubsyncError>;
