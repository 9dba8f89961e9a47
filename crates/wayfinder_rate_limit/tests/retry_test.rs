//! Tests for the throttle retry loop.
//!
//! All timing tests run on a paused clock, so two-minute waits elapse instantly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use wayfinder_error::{DestinyError, DestinyErrorKind};
use wayfinder_rate_limit::{RequestPacer, ThrottlePolicy, retry_throttled};

fn throttled() -> DestinyError {
    DestinyError::new(DestinyErrorKind::Throttled { attempts: 0 })
}

#[test]
fn test_default_policy() {
    let policy = ThrottlePolicy::default();
    assert_eq!(*policy.interval(), Duration::from_secs(120));
    assert_eq!(*policy.max_attempts(), 10);
    assert_eq!(policy.budget(), Duration::from_secs(1200));
}

#[tokio::test(start_paused = true)]
async fn test_success_after_throttling() {
    let calls = AtomicUsize::new(0);
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let result = retry_throttled(&ThrottlePolicy::default(), &cancel, || async {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(throttled())
        } else {
            Ok("profile")
        }
    })
    .await;

    assert_eq!(result.unwrap(), "profile");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(240));
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_fails_with_throttling_error() {
    let calls = AtomicUsize::new(0);
    let cancel = CancellationToken::new();
    let policy = ThrottlePolicy::default();
    let started = Instant::now();

    let result: Result<(), _> = retry_throttled(&policy, &cancel, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(throttled())
    })
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.kind, DestinyErrorKind::Throttled { attempts: 11 });
    // One initial attempt plus the full retry budget, and no more
    assert_eq!(calls.load(Ordering::SeqCst), 11);
    assert_eq!(started.elapsed(), policy.budget());
}

#[tokio::test(start_paused = true)]
async fn test_server_error_is_not_retried() {
    let calls = AtomicUsize::new(0);
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let result: Result<(), _> = retry_throttled(&ThrottlePolicy::default(), &cancel, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(DestinyError::new(DestinyErrorKind::ServerError {
            status: 500,
            body: "SystemDisabled".into(),
        }))
    })
    .await;

    let err = result.unwrap_err();
    assert!(matches!(err.kind, DestinyErrorKind::ServerError { status: 500, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_interrupts_wait() {
    let calls = AtomicUsize::new(0);
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(300)).await;
        trigger.cancel();
    });

    let result: Result<(), _> = retry_throttled(&ThrottlePolicy::default(), &cancel, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(throttled())
    })
    .await;

    let err = result.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(started.elapsed(), Duration::from_secs(300));
    // Attempts at t=0, 120 and 240; the wait toward 360 was interrupted
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_already_cancelled_never_calls() {
    let calls = AtomicUsize::new(0);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result: Result<(), _> = retry_throttled(&ThrottlePolicy::default(), &cancel, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<(), DestinyError>(())
    })
    .await;

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_pacer_disabled_by_default() {
    let pacer = RequestPacer::new(None);
    assert!(!pacer.is_enabled());
    assert!((0..1000).all(|_| pacer.try_acquire()));

    assert!(!RequestPacer::new(Some(0)).is_enabled());
}

#[test]
fn test_pacer_limits_burst() {
    let pacer = RequestPacer::new(Some(2));
    assert!(pacer.is_enabled());
    assert!(pacer.try_acquire());
    assert!(pacer.try_acquire());
    assert!(!pacer.try_acquire());
}
