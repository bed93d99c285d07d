//! Redis backend tests
//!
//! These need a running Redis on localhost:6379.
//! Run with: cargo test --test redis_cache -- --ignored

use chgk_rating::{CacheBackend, CacheError, ClientConfig, MemoryServiceConfig, RatingClient, RedisCache};
use serde_json::json;

const REDIS_HOST: &str = "127.0.0.1";
const REDIS_PORT: u16 = 6379;

fn test_cache(prefix: &str) -> RedisCache {
    let mut cache = RedisCache::connect_with_prefix(REDIS_HOST, REDIS_PORT, prefix)
        .expect("Redis connection failed");
    cache.delete_matching("*").expect("Cleanup failed");
    cache
}

#[test]
#[ignore = "requires running Redis"]
fn test_set_and_get_roundtrip() {
    let mut cache = test_cache("chgk_rating:test:roundtrip:");
    let value = json!([{"idplayer": "30152", "rating": "5123"}]);

    cache.set("player_ratings:30152", &value).unwrap();

    assert_eq!(cache.get("player_ratings:30152").unwrap(), Some(value));
    assert_eq!(cache.get("player_ratings:1").unwrap(), None);
}

#[test]
#[ignore = "requires running Redis"]
fn test_invalid_stored_value_is_a_corrupt_entry() {
    let prefix = "chgk_rating:test:corrupt:";
    let mut cache = test_cache(prefix);

    let client = redis::Client::open(format!("redis://{}:{}/", REDIS_HOST, REDIS_PORT)).unwrap();
    let mut con = client.get_connection().unwrap();
    redis::cmd("SET")
        .arg(format!("{}player:1", prefix))
        .arg("{truncated")
        .query::<()>(&mut con)
        .unwrap();

    match cache.get("player:1").unwrap_err() {
        CacheError::Corrupt { key, .. } => assert_eq!(key, "player:1"),
        other => panic!("Expected corrupt entry error, got {:?}", other),
    }
    cache.delete_matching("*").unwrap();
}

#[test]
#[ignore = "requires running Redis"]
fn test_delete_matching_accepts_escapes_and_negated_classes() {
    let mut cache = test_cache("chgk_rating:test:dialect:");
    cache.set("team:*", &json!([])).unwrap();
    cache.set("team:1", &json!([])).unwrap();
    cache.set("player:1", &json!([])).unwrap();

    assert_eq!(cache.delete_matching(r"team:\*").unwrap(), 1);
    assert_eq!(cache.delete_matching("[^t]*").unwrap(), 1);
    assert!(cache.get("team:1").unwrap().is_some());
    cache.delete_matching("*").unwrap();
}

#[test]
#[ignore = "requires running Redis"]
fn test_delete_single_key() {
    let mut cache = test_cache("chgk_rating:test:delete:");
    cache.set("team:1", &json!([])).unwrap();

    cache.delete("team:1").unwrap();
    cache.delete("team:1").expect("Deleting a missing key is not an error");

    assert!(cache.get("team:1").unwrap().is_none());
}

#[test]
#[ignore = "requires running Redis"]
fn test_delete_matching_stays_within_prefix() {
    let mut ours = test_cache("chgk_rating:test:mask:");
    let mut other = test_cache("chgk_rating:test:other:");
    ours.set("tournament_rosters:5773", &json!([])).unwrap();
    ours.set("player:1", &json!([])).unwrap();
    other.set("tournament_rosters:5773", &json!([])).unwrap();

    let removed = ours.delete_matching("*rosters*").unwrap();

    assert_eq!(removed, 1);
    assert!(ours.get("tournament_rosters:5773").unwrap().is_none());
    assert!(ours.get("player:1").unwrap().is_some());
    assert!(other.get("tournament_rosters:5773").unwrap().is_some());
    other.delete_matching("*").unwrap();
}

#[test]
#[ignore = "requires running Redis"]
fn test_client_reads_redis_before_file_cache() {
    let prefix = "chgk_rating:test:client:";
    let mut redis = test_cache(prefix);
    redis
        .set("tournament_appeals:5773", &json!(["from redis"]))
        .unwrap();

    let cache_dir = tempfile::TempDir::new().unwrap();
    let mut file = chgk_rating::FileCache::with_dir(cache_dir.path());
    file.set("tournament_appeals:5773", &json!(["from file"]))
        .unwrap();

    let config = ClientConfig::default()
        .with_base_url("http://127.0.0.1:1/api")
        .with_file_cache(true)
        .with_cache_dir(cache_dir.path())
        .with_memory_service(MemoryServiceConfig {
            host: REDIS_HOST.to_string(),
            port: REDIS_PORT,
            key_prefix: prefix.to_string(),
        });
    let mut client = RatingClient::new(config).unwrap();

    assert_eq!(
        client.tournament_appeals(5773).unwrap(),
        json!(["from redis"])
    );

    client.clear_cache(None).unwrap();
    assert!(redis.get("tournament_appeals:5773").unwrap().is_none());
    assert!(file.get("tournament_appeals:5773").unwrap().is_none());
}
