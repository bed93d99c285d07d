//! Command-line interface parsing for the rating client
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into a [`ClientConfig`] plus the command to run.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::api::{ApiId, Endpoint};
use crate::cache::DEFAULT_REDIS_PORT;
use crate::config::{ClientConfig, MemoryServiceConfig, DEFAULT_CACHE_DIR};
use crate::http::DEFAULT_BASE_URL;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The operation name is not in the endpoint table
    #[error("Invalid operation: '{0}'. Run `chgk-rating endpoints` for the list")]
    InvalidOperation(String),

    /// The operation was given the wrong number of arguments
    #[error("Operation '{operation}' takes {expected} argument(s), got {got}")]
    WrongArgumentCount {
        operation: String,
        expected: usize,
        got: usize,
    },
}

/// rating.chgk.info client - query the rating API with optional caching
#[derive(Parser, Debug)]
#[command(name = "chgk-rating")]
#[command(about = "Read-only client for the rating.chgk.info API")]
#[command(version)]
pub struct Cli {
    /// API root to query
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Enable the Redis cache at this host
    #[arg(long, global = true, value_name = "HOST")]
    pub redis_host: Option<String>,

    /// Redis port
    #[arg(long, global = true, default_value_t = DEFAULT_REDIS_PORT)]
    pub redis_port: u16,

    /// Enable the file cache
    #[arg(long, global = true)]
    pub file_cache: bool,

    /// Directory for the file cache
    #[arg(long, global = true, default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Log cache and HTTP activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do once the client is built
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run one API operation and print the JSON response
    ///
    /// Examples:
    ///   chgk-rating get tournament_rosters 5773
    ///   chgk-rating get player_rating 42 last
    Get {
        /// Operation name, e.g. tournament_rosters
        operation: String,
        /// Operation arguments, in order
        args: Vec<String>,
    },
    /// Remove cached responses, all of them or those matching MASK
    Clear {
        /// Glob over cache keys, e.g. '*rosters*'
        mask: Option<String>,
    },
    /// List every supported operation with its path template
    Endpoints,
}

/// Resolves an operation name and its raw arguments against the endpoint table
///
/// # Returns
/// * `Ok((Endpoint, args))` if the operation exists and the argument count fits
/// * `Err(CliError)` otherwise
pub fn parse_operation_arg(
    operation: &str,
    args: &[String],
) -> Result<(Endpoint, Vec<ApiId>), CliError> {
    let endpoint = Endpoint::from_name(operation)
        .ok_or_else(|| CliError::InvalidOperation(operation.to_string()))?;

    if args.len() != endpoint.arity() {
        return Err(CliError::WrongArgumentCount {
            operation: operation.to_string(),
            expected: endpoint.arity(),
            got: args.len(),
        });
    }

    Ok((endpoint, args.iter().map(|a| ApiId::parse(a)).collect()))
}

impl Cli {
    /// Builds the client configuration from the global flags
    pub fn client_config(&self) -> ClientConfig {
        let memory_service = self.redis_host.as_ref().map(|host| MemoryServiceConfig {
            port: self.redis_port,
            ..MemoryServiceConfig::new(host.clone())
        });

        ClientConfig {
            base_url: self.base_url.clone(),
            memory_service,
            file_cache: self.file_cache,
            cache_dir: self.cache_dir.clone(),
        }
    }
}
