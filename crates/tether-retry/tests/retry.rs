//! Integration tests for the cancellable retry wait.
//!
//! Uses `tokio::time::pause()` so the delays resolve instantly under a
//! controlled clock: no real sleeping, no flakiness.

use std::time::Duration;

use tether_retry::{cancel_pair, Backoff, RetryConfig};

#[tokio::test(start_paused = true)]
async fn test_wait_completes_after_full_delay() {
    let mut backoff =
        Backoff::new(RetryConfig::fixed(Duration::from_secs(1)));
    let (_handle, mut token) = cancel_pair();

    let start = tokio::time::Instant::now();
    let completed = backoff.wait(&mut token).await;

    assert!(completed);
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_wait_returns_false_when_cancelled_mid_sleep() {
    let mut backoff =
        Backoff::new(RetryConfig::fixed(Duration::from_secs(60)));
    let (handle, mut token) = cancel_pair();

    let waiter = tokio::spawn(async move {
        backoff.wait(&mut token).await
    });

    // Let the waiter reach its sleep, then cancel well before the delay
    // elapses.
    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.cancel();

    let completed = waiter.await.unwrap();
    assert!(!completed, "cancelled wait must report interruption");
}

#[tokio::test(start_paused = true)]
async fn test_backoff_waits_grow_between_attempts() {
    let mut backoff = Backoff::new(RetryConfig::backoff(
        Duration::from_secs(1),
        Duration::from_secs(4),
    ));
    let (_handle, mut token) = cancel_pair();

    let start = tokio::time::Instant::now();
    assert!(backoff.wait(&mut token).await); // 1s
    assert!(backoff.wait(&mut token).await); // 2s
    assert!(backoff.wait(&mut token).await); // 4s
    assert!(backoff.wait(&mut token).await); // 4s (capped)

    assert_eq!(start.elapsed(), Duration::from_secs(11));
}

#[tokio::test(start_paused = true)]
async fn test_loop_exits_promptly_on_cancellation() {
    // A probe loop shaped like the connectivity monitor's: retry forever,
    // honor cancellation at the wait.
    let mut backoff =
        Backoff::new(RetryConfig::fixed(Duration::from_secs(1)));
    let (handle, mut token) = cancel_pair();

    let probes = tokio::spawn(async move {
        let mut attempts = 0u32;
        loop {
            attempts += 1; // the probe itself (always failing here)
            if !backoff.wait(&mut token).await {
                break;
            }
        }
        attempts
    });

    // Let a few failed attempts accumulate, then cancel.
    tokio::time::sleep(Duration::from_millis(3500)).await;
    handle.cancel();

    let attempts = probes.await.unwrap();
    // One immediate attempt plus one per elapsed second.
    assert_eq!(attempts, 4);
}
