//! Tests for layered configuration.

use std::time::Duration;
use wayfinder_core::WayfinderConfig;

#[test]
fn test_bundled_defaults() {
    let config = WayfinderConfig::from_toml_str("").expect("bundled defaults parse");

    assert_eq!(*config.destiny().group_id(), 3760031);
    assert_eq!(config.destiny().throttle_interval(), Duration::from_secs(120));
    assert_eq!(*config.destiny().max_attempts(), 10);
    assert_eq!(config.destiny().manifest_ttl(), Duration::from_secs(86_400));
    assert_eq!(config.destiny().profile_ttl(), Duration::from_secs(7_200));
    assert_eq!(config.feeds().grace_period(), Duration::from_secs(60));
    assert_eq!(config.cache().prefix(), "wayfinder:");
    assert_eq!(*config.cache().redis_port(), 4646);
    assert!(config.destiny().requests_per_second().is_none());
}

#[test]
fn test_user_overrides_take_precedence() {
    let config = WayfinderConfig::from_toml_str(
        r#"
        [destiny]
        group_id = 42
        metrics_concurrency = 4

        [feeds]
        channel_id = 1234567890
        "#,
    )
    .expect("override parses");

    assert_eq!(*config.destiny().group_id(), 42);
    assert_eq!(*config.destiny().metrics_concurrency(), 4);
    // Untouched keys keep their bundled values
    assert_eq!(*config.destiny().max_attempts(), 10);
    assert_eq!(*config.feeds().channel_id(), Some(1234567890));
}

#[test]
fn test_wrong_type_is_config_error() {
    let result = WayfinderConfig::from_toml_str(
        r#"
        [destiny]
        group_id = "not a number"
        "#,
    );

    let err = result.expect_err("string group id must be rejected");
    assert!(err.to_string().contains("Configuration Error"));
}

#[test]
fn test_setters_build_modified_copy() {
    let config = WayfinderConfig::default();
    let feeds = config.feeds().clone().with_grace_period_secs(5);
    let config = config.with_feeds(feeds);

    assert_eq!(config.feeds().grace_period(), Duration::from_secs(5));
}
