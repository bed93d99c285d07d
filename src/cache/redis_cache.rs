//! Redis cache backend
//!
//! Keeps cached API responses as JSON strings under `{prefix}{key}`. Values
//! are written without a TTL; clearing walks the keyspace with `SCAN MATCH`
//! so only keys carrying the prefix are ever touched.

use redis::Commands;
use serde_json::Value;
use tracing::{debug, error};

use super::{decode_entry, CacheBackend};
use crate::error::CacheError;

/// Port used when none is configured
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Prefix for every key this client writes
pub const DEFAULT_KEY_PREFIX: &str = "chgk_rating:";

/// Keys fetched per `SCAN` round trip
const SCAN_COUNT: usize = 100;

/// Redis-backed cache holding one open connection
pub struct RedisCache {
    con: redis::Connection,
    prefix: String,
}

impl RedisCache {
    /// Connects to `host:port` with the default key prefix
    pub fn connect(host: &str, port: u16) -> Result<Self, CacheError> {
        Self::connect_with_prefix(host, port, DEFAULT_KEY_PREFIX)
    }

    /// Connects to `host:port` and checks the server answers
    ///
    /// Opening a client does not touch the network, so an `ECHO` round trip
    /// is made before returning.
    pub fn connect_with_prefix(
        host: &str,
        port: u16,
        prefix: impl Into<String>,
    ) -> Result<Self, CacheError> {
        debug!("Creating connection to redis at {}:{}", host, port);
        let connect_err = |source| {
            error!("Couldn't connect to redis at {}:{}", host, port);
            CacheError::Connect {
                host: host.to_string(),
                port,
                source,
            }
        };

        let client =
            redis::Client::open(format!("redis://{}:{}/", host, port)).map_err(connect_err)?;
        let mut con = client.get_connection().map_err(connect_err)?;
        redis::cmd("ECHO")
            .arg(42)
            .query::<String>(&mut con)
            .map_err(connect_err)?;

        Ok(Self {
            con,
            prefix: prefix.into(),
        })
    }

    /// Prefix prepended to every key
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build the full Redis key for a cache entry
    fn redis_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl CacheBackend for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>, CacheError> {
        let redis_key = self.redis_key(key);
        let raw: Option<String> = self.con.get(&redis_key)?;

        raw.map(|json_str| decode_entry(key, &json_str)).transpose()
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), CacheError> {
        let redis_key = self.redis_key(key);
        let json_str = serde_json::to_string(value)?;
        self.con.set::<_, _, ()>(&redis_key, &json_str)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), CacheError> {
        let redis_key = self.redis_key(key);
        self.con.del::<_, ()>(&redis_key)?;
        Ok(())
    }

    fn delete_matching(&mut self, mask: &str) -> Result<usize, CacheError> {
        let pattern = self.redis_key(mask);

        // Collect all matching keys via SCAN, then delete them
        let mut cursor: u64 = 0;
        let mut removed = 0;
        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query(&mut self.con)?;

            if !keys.is_empty() {
                removed += self.con.del::<_, usize>(&keys)?;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(removed)
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
