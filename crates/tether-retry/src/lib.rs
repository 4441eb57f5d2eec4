//! Cancellable retry policy for Tether's offline probe loop.
//!
//! Provides a delay sequence (fixed interval or exponential backoff with a
//! cap and optional jitter) and a cancellation pair honored at every
//! suspension point. The legacy design retried recursively with a fixed
//! interval and no way to stop; this module replaces it with an explicit,
//! bounded policy.
//!
//! # Integration
//!
//! The probe loop drives a [`Backoff`] through a cancellation-aware
//! wait:
//!
//! ```ignore
//! let mut backoff = Backoff::new(config);
//! loop {
//!     if probe().await { break; }
//!     if !backoff.wait(&mut cancel).await {
//!         break; // cancelled while waiting
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Full configuration for a retry delay sequence.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the second attempt (the first attempt runs
    /// immediately).
    pub initial_delay: Duration,
    /// Per-attempt multiplier. `1.0` = fixed interval.
    pub multiplier: f64,
    /// Hard cap on any single delay.
    pub max_delay: Duration,
    /// Random jitter (0–max ms) added to every delay, so a fleet of
    /// devices recovering from the same outage doesn't probe in lockstep.
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        // The connectivity probe's historical cadence: one second, fixed.
        Self::fixed(Duration::from_secs(1))
    }
}

impl RetryConfig {
    /// A fixed-interval policy.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_delay: interval,
            multiplier: 1.0,
            max_delay: interval,
            jitter_ms: 0,
        }
    }

    /// An exponential policy: `initial`, doubling, capped at `max`.
    pub fn backoff(initial: Duration, max: Duration) -> Self {
        Self {
            initial_delay: initial,
            multiplier: 2.0,
            max_delay: max,
            jitter_ms: 0,
        }
    }

    /// Adds jitter to the policy.
    pub fn with_jitter_ms(mut self, jitter_ms: u64) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`Backoff::new`]. Rules:
    /// - `multiplier` is at least `1.0` (delays never shrink).
    /// - `max_delay` is at least `initial_delay`.
    pub fn validated(mut self) -> Self {
        if self.multiplier < 1.0 {
            warn!(
                multiplier = self.multiplier,
                "retry multiplier below 1.0; clamping"
            );
            self.multiplier = 1.0;
        }
        if self.max_delay < self.initial_delay {
            self.max_delay = self.initial_delay;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Produces the delay sequence for one retry loop.
///
/// One `Backoff` per loop; [`reset`](Self::reset) after a success if the
/// loop keeps running.
pub struct Backoff {
    config: RetryConfig,
    attempt: u32,
}

impl Backoff {
    /// Creates a backoff from config (validated first).
    pub fn new(config: RetryConfig) -> Self {
        let config = config.validated();
        debug!(
            initial_ms = config.initial_delay.as_millis() as u64,
            multiplier = config.multiplier,
            max_ms = config.max_delay.as_millis() as u64,
            "retry backoff created"
        );
        Self { config, attempt: 0 }
    }

    /// The next delay in the sequence, advancing the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.config.initial_delay.as_secs_f64()
            * self.config.multiplier.powi(self.attempt as i32);
        let capped = Duration::from_secs_f64(base)
            .min(self.config.max_delay);
        self.attempt = self.attempt.saturating_add(1);

        if self.config.jitter_ms == 0 {
            return capped;
        }
        let jitter =
            rand::rng().random_range(0..=self.config.jitter_ms);
        capped + Duration::from_millis(jitter)
    }

    /// How many delays have been produced so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Restarts the sequence from the initial delay.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Sleeps for the next delay, waking early on cancellation.
    ///
    /// Returns `true` when the full delay elapsed, `false` when the wait
    /// was cancelled (the loop should exit without another attempt).
    pub async fn wait(&mut self, cancel: &mut CancelToken) -> bool {
        let delay = self.next_delay();
        tokio::select! {
            _ = time::sleep(delay) => true,
            _ = cancel.cancelled() => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Creates a linked cancellation pair.
///
/// The [`CancelHandle`] side lives with whoever owns the loop; the
/// [`CancelToken`] side travels into it. Dropping the handle cancels the
/// token, so a loop can never outlive its owner.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// The owner's side: call [`cancel`](Self::cancel) (or drop) to stop the
/// loop.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// The loop's side: check or await cancellation.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// `true` once the handle cancelled or was dropped.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves when cancellation is signalled (or the handle is gone).
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            // An error means the sender dropped; treat as cancelled.
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_policy_produces_constant_delays() {
        let mut backoff =
            Backoff::new(RetryConfig::fixed(Duration::from_secs(1)));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.attempt(), 3);
    }

    #[test]
    fn test_backoff_doubles_until_cap() {
        let mut backoff = Backoff::new(RetryConfig::backoff(
            Duration::from_secs(1),
            Duration::from_secs(4),
        ));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(), Duration::from_secs(4));
        // Capped from here on.
        assert_eq!(backoff.next_delay(), Duration::from_secs(4));
    }

    #[test]
    fn test_reset_restarts_the_sequence() {
        let mut backoff = Backoff::new(RetryConfig::backoff(
            Duration::from_secs(1),
            Duration::from_secs(8),
        ));
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_validated_clamps_multiplier_and_cap() {
        let config = RetryConfig {
            initial_delay: Duration::from_secs(2),
            multiplier: 0.5,
            max_delay: Duration::from_secs(1),
            jitter_ms: 0,
        }
        .validated();
        assert_eq!(config.multiplier, 1.0);
        assert_eq!(config.max_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_jitter_stays_within_bound() {
        let mut backoff = Backoff::new(
            RetryConfig::fixed(Duration::from_secs(1)).with_jitter_ms(50),
        );
        for _ in 0..20 {
            let d = backoff.next_delay();
            assert!(d >= Duration::from_secs(1));
            assert!(d <= Duration::from_millis(1050));
        }
    }

    #[test]
    fn test_cancel_token_observes_cancel() {
        let (handle, token) = cancel_pair();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_dropping_handle_cancels_token() {
        let (handle, token) = cancel_pair();
        drop(handle);
        assert!(token.is_cancelled());
    }
}
