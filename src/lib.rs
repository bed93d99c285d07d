//! rating.chgk.info API client
//!
//! A read-only client for the trivia tournament rating API. Responses are
//! returned as untyped JSON, exactly as the API sends them, and can be cached
//! in Redis, on the local filesystem, or both.
//!
//! ```no_run
//! use chgk_rating::{ClientConfig, RatingClient};
//!
//! # fn main() -> chgk_rating::Result<()> {
//! let config = ClientConfig::default().with_file_cache(true);
//! let mut client = RatingClient::new(config)?;
//!
//! let rosters = client.tournament_rosters(5773)?;
//! println!("{} teams", rosters.as_array().map_or(0, |teams| teams.len()));
//!
//! client.clear_cache(Some("*rosters*"))?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod http;

pub use api::{ApiId, Endpoint};
pub use cache::{CacheBackend, CacheSet, FileCache, RedisCache};
pub use client::{ApiResponse, RatingClient};
pub use config::{ClientConfig, MemoryServiceConfig};
pub use error::{CacheError, FetchError, RatingError, Result};
pub use http::Fetcher;
