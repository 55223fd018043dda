//! Error taxonomy shared by the library.
//!
//! Not-found and malformed-data failures are kept apart so callers can tell a
//! typo from an upstream response they cannot interpret.

use thiserror::Error;

use crate::layout::LayoutError;

/// Errors that can occur while fetching, parsing or rendering evolution data
#[derive(Error, Debug)]
pub enum Error {
    /// The remote lookup returned no match
    #[error("not found: {0}")]
    NotFound(String),

    /// The search input was empty after trimming
    #[error("no species name given")]
    EmptyQuery,

    /// The evolution chain had an unexpected shape
    #[error("malformed evolution chain: {0}")]
    MalformedChain(String),

    /// A reference URL had no trailing numeric identifier
    #[error("could not extract an identifier from {0:?}")]
    IdentifierExtraction(String),

    /// The audio encoder failed
    #[error("audio transcoding failed: {0}")]
    Transcode(String),

    /// A bounded retry loop gave up
    #[error("lookup failed after {attempts} attempts")]
    Lookup { attempts: u32 },

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status other than 404
    #[error("{url} returned {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// The API answered with a body we could not decode
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The operation was cancelled before it completed
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The layout pass rejected the graph
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON (de)serialization error outside of API responses
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTML template rendering failed
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

impl Error {
    /// True when the failure means "no such species" rather than bad data
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::EmptyQuery)
    }

    /// True when the failure comes from data the upstream sent us
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::MalformedChain(_) | Error::IdentifierExtraction(_) | Error::Decode { .. }
        )
    }
}

/// Result type for library operations
pub type Result<T> = std::result::Result<T, Error>;
