//! Tests for the Redis backend.
//!
//! Connection tests need a live server at REDIS_HOST and only run with
//! `--features redis-tests`.

use std::sync::Arc;
use std::time::Duration;
use wayfinder_cache::{Cache, RedisBackend, RedisSettings};

#[test]
fn test_settings_host_with_port() {
    let settings = RedisSettings::from_parts("cache.internal:6390", Some("1234"), None, None, 4646);
    assert_eq!(settings.host(), "cache.internal");
    assert_eq!(*settings.port(), 6390);
    assert!(!settings.tls());
}

#[test]
fn test_settings_separate_port_and_default() {
    let settings = RedisSettings::from_parts("cache.internal", Some("1234"), None, None, 4646);
    assert_eq!(*settings.port(), 1234);

    let settings = RedisSettings::from_parts("cache.internal", None, None, None, 4646);
    assert_eq!(*settings.port(), 4646);

    let settings = RedisSettings::from_parts("cache.internal", Some("junk"), None, None, 4646);
    assert_eq!(*settings.port(), 4646);
}

#[test]
fn test_settings_credentials_enable_tls() {
    let settings = RedisSettings::from_parts(
        "cache.internal",
        None,
        Some("default".to_string()),
        None,
        4646,
    );
    assert!(settings.tls());

    let settings =
        RedisSettings::from_parts("cache.internal", None, None, Some("s3cret".to_string()), 4646);
    assert!(settings.tls());
}

#[tokio::test]
#[cfg_attr(not(feature = "redis-tests"), ignore)]
async fn test_redis_round_trip() {
    let settings = RedisSettings::from_env(6379).expect("REDIS_HOST must be set");
    let backend = RedisBackend::connect(&settings).await.expect("redis reachable");
    let cache = Cache::new(Arc::new(backend), "wayfinder-test:");

    cache
        .set("destiny:clan:info", &"clan", Duration::from_secs(30))
        .await
        .unwrap();
    let hit: Option<String> = cache.get("destiny:clan:info").await.unwrap();
    assert_eq!(hit.as_deref(), Some("clan"));

    let miss: Option<String> = cache.get("destiny:clan:absent").await.unwrap();
    assert!(miss.is_none());
}
