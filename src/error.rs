//! Error types for the rating client
//!
//! Each layer has its own error enum: [`FetchError`] for the HTTP side,
//! [`CacheError`] for the cache backends and [`RatingError`] for the client
//! facade, which wraps the other two unchanged.

use thiserror::Error;

/// Result type for rating client operations
pub type Result<T> = std::result::Result<T, RatingError>;

/// Errors raised while talking to the rating API
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure or an unusable request
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status code
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body is not valid JSON
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FetchError {
    /// Whether this is a transport-level failure (network or HTTP status)
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Request(_) | FetchError::Status { .. })
    }
}

/// Errors raised by a cache backend
#[derive(Debug, Error)]
pub enum CacheError {
    /// The memory service could not be reached
    #[error("Couldn't connect to redis at {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: redis::RedisError,
    },

    /// A command against the memory service failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Filesystem error in the file cache
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored entry is not valid JSON
    #[error("Corrupt cache entry for {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a value for storage failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The mask is not a valid glob pattern
    #[error("Invalid cache mask '{mask}': {source}")]
    InvalidMask {
        mask: String,
        #[source]
        source: glob::PatternError,
    },

    /// More than one backend failed during a single write or clear
    #[error("{} cache backends failed: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<CacheError>),
}

fn join_errors(errors: &[CacheError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors returned by [`RatingClient`](crate::RatingClient)
#[derive(Debug, Error)]
pub enum RatingError {
    /// Fetching from the rating API failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A cache backend failed
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The year has no known season id
    #[error("No season ID for the year {year}, only {first}–{last} available")]
    UnknownSeason { year: i32, first: i32, last: i32 },

    /// An endpoint was queried with the wrong number of arguments
    #[error("Endpoint '{endpoint}' takes {expected} argument(s), got {got}")]
    Arity {
        endpoint: &'static str,
        expected: usize,
        got: usize,
    },
}
