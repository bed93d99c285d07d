//! Cache backends for API responses
//!
//! A [`CacheBackend`] is a flat key-value store without expiry. Two backends
//! exist: [`RedisCache`] for a networked memory service and [`FileCache`] for
//! the local filesystem. [`CacheSet`] combines zero, one or both of them.

mod file;
mod redis_cache;

pub use self::file::{decode_key, encode_key, FileCache};
pub use self::redis_cache::{RedisCache, DEFAULT_KEY_PREFIX, DEFAULT_REDIS_PORT};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CacheError;

/// A key-value store for cached API responses
pub trait CacheBackend: Send {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Returns the stored value, or `None` on a miss
    fn get(&mut self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Stores a value under `key`, replacing any previous entry
    fn set(&mut self, key: &str, value: &Value) -> Result<(), CacheError>;

    /// Removes one key; a missing key is not an error
    fn delete(&mut self, key: &str) -> Result<(), CacheError>;

    /// Removes every key matching `mask`, returning how many were removed
    ///
    /// Masks use Redis `MATCH` syntax: `*`, `?`, `[abc]`, `[^abc]`, `[a-z]`
    /// and `\` to escape the next character.
    fn delete_matching(&mut self, mask: &str) -> Result<usize, CacheError>;
}

/// Mask used when clearing everything
pub const MATCH_ALL: &str = "*";

/// Parses a stored entry, reporting the key on failure
fn decode_entry(key: &str, raw: &str) -> Result<Value, CacheError> {
    serde_json::from_str(raw).map_err(|source| CacheError::Corrupt {
        key: key.to_string(),
        source,
    })
}

/// The enabled backends, in read-preference order
#[derive(Default)]
pub struct CacheSet {
    backends: Vec<Box<dyn CacheBackend>>,
}

impl CacheSet {
    /// An empty set; every lookup misses and writes are dropped
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Appends a backend; backends added earlier are read first
    pub fn push(&mut self, backend: Box<dyn CacheBackend>) {
        self.backends.push(backend);
    }

    /// Whether any backend is enabled
    pub fn is_enabled(&self) -> bool {
        !self.backends.is_empty()
    }

    /// Names of the enabled backends, in read order
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Returns the first hit in preference order
    ///
    /// An error from a backend fails the lookup; later backends are not
    /// consulted.
    pub fn get(&mut self, key: &str) -> Result<Option<Value>, CacheError> {
        for backend in self.backends.iter_mut() {
            if let Some(value) = backend.get(key)? {
                debug!("Cache hit for {} in {}", key, backend.name());
                return Ok(Some(value));
            }
            debug!("No {} cache for {}", backend.name(), key);
        }
        Ok(None)
    }

    /// Writes to every backend, attempting all of them even when one fails
    pub fn set(&mut self, key: &str, value: &Value) -> Result<(), CacheError> {
        self.for_each(|backend| backend.set(key, value))
    }

    /// Removes `key` from every backend
    pub fn delete(&mut self, key: &str) -> Result<(), CacheError> {
        self.for_each(|backend| backend.delete(key))
    }

    /// Removes matching keys from every backend; `None` removes everything
    pub fn clear(&mut self, mask: Option<&str>) -> Result<(), CacheError> {
        let mask = mask.unwrap_or(MATCH_ALL);
        self.for_each(|backend| {
            let removed = backend.delete_matching(mask)?;
            debug!(
                "Removed {} entries matching '{}' from {} cache",
                removed,
                mask,
                backend.name()
            );
            Ok(())
        })
    }

    fn for_each<F>(&mut self, mut op: F) -> Result<(), CacheError>
    where
        F: FnMut(&mut dyn CacheBackend) -> Result<(), CacheError>,
    {
        let mut failures = Vec::new();
        for backend in self.backends.iter_mut() {
            if let Err(e) = op(backend.as_mut()) {
                warn!("{} cache failed: {}", backend.name(), e);
                failures.push(e);
            }
        }

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(CacheError::Multiple(failures)),
        }
    }
}

impl std::fmt::Debug for CacheSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSet")
            .field("backends", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    /// Backend kept in a map, optionally failing every write
    #[derive(Default)]
    struct MapBackend {
        entries: HashMap<String, Value>,
        fail_writes: bool,
    }

    impl CacheBackend for MapBackend {
        fn name(&self) -> &'static str {
            "map"
        }

        fn get(&mut self, key: &str) -> Result<Option<Value>, CacheError> {
            Ok(self.entries.get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &Value) -> Result<(), CacheError> {
            if self.fail_writes {
                return Err(CacheError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.entries.insert(key.to_string(), value.clone());
            Ok(())
        }

        fn delete(&mut self, key: &str) -> Result<(), CacheError> {
            self.entries.remove(key);
            Ok(())
        }

        fn delete_matching(&mut self, mask: &str) -> Result<usize, CacheError> {
            let pattern = glob::Pattern::new(mask).unwrap();
            let before = self.entries.len();
            self.entries.retain(|k, _| !pattern.matches(k));
            Ok(before - self.entries.len())
        }
    }

    #[test]
    fn test_disabled_set_always_misses() {
        let mut set = CacheSet::disabled();
        assert!(!set.is_enabled());
        set.set("player:1", &json!({"idplayer": "1"})).unwrap();
        assert!(set.get("player:1").unwrap().is_none());
        set.clear(None).unwrap();
    }

    #[test]
    fn test_first_backend_wins_on_read() {
        let mut first = MapBackend::default();
        first.entries.insert("k".to_string(), json!("first"));
        let mut second = MapBackend::default();
        second.entries.insert("k".to_string(), json!("second"));

        let mut set = CacheSet::default();
        set.push(Box::new(first));
        set.push(Box::new(second));

        assert_eq!(set.get("k").unwrap(), Some(json!("first")));
    }

    #[test]
    fn test_falls_through_to_later_backend() {
        let mut second = MapBackend::default();
        second.entries.insert("k".to_string(), json!("second"));

        let mut set = CacheSet::default();
        set.push(Box::new(MapBackend::default()));
        set.push(Box::new(second));

        assert_eq!(set.get("k").unwrap(), Some(json!("second")));
    }

    #[test]
    fn test_failed_write_still_reaches_other_backends() {
        let mut set = CacheSet::default();
        set.push(Box::new(MapBackend {
            fail_writes: true,
            ..Default::default()
        }));
        set.push(Box::new(MapBackend::default()));

        let err = set.set("k", &json!([1])).unwrap_err();
        assert!(matches!(err, CacheError::Io(_)));
        assert_eq!(set.get("k").unwrap(), Some(json!([1])));
    }

    #[test]
    fn test_all_failures_are_aggregated() {
        let mut set = CacheSet::default();
        for _ in 0..2 {
            set.push(Box::new(MapBackend {
                fail_writes: true,
                ..Default::default()
            }));
        }

        let err = set.set("k", &json!(null)).unwrap_err();
        match err {
            CacheError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("Expected aggregated error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_entry_reports_key() {
        assert_eq!(decode_entry("player:1", "[1]").unwrap(), json!([1]));

        let err = decode_entry("player:1", "{not json").unwrap_err();
        match &err {
            CacheError::Corrupt { key, .. } => assert_eq!(key, "player:1"),
            other => panic!("Expected corrupt entry error, got {:?}", other),
        }
        assert!(err.to_string().starts_with("Corrupt cache entry for player:1"));
    }

    #[test]
    fn test_clear_with_mask_keeps_unrelated_keys() {
        let mut set = CacheSet::default();
        set.push(Box::new(MapBackend::default()));
        set.set("tournament_rosters:5773", &json!([])).unwrap();
        set.set("player:1", &json!([])).unwrap();

        set.clear(Some("*rosters*")).unwrap();

        assert!(set.get("tournament_rosters:5773").unwrap().is_none());
        assert!(set.get("player:1").unwrap().is_some());
    }
}
