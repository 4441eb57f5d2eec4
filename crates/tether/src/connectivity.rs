//! Connectivity tracking and the offline probe loop.
//!
//! The client caches the last observed [`ConnectivityLevel`] and treats a
//! status-zero call outcome the same as a platform report of "offline".
//! While offline, one probe task pings the service on the retry policy's
//! cadence; the first successful ping drives the level back online. The
//! probe is cancellable at every suspension point and at most one runs at
//! a time.

use tether_platform::{Dispatcher, Platform, RemoteService};
use tether_protocol::{ConnectivityLevel, Verb};
use tether_retry::{cancel_pair, Backoff, CancelHandle};
use tracing::{debug, info};

use crate::client::ClientInner;
use crate::events::ClientEvent;
use crate::Connector;

/// Guarded by the connectivity mutex: the cached level and the running
/// probe, if any.
pub(crate) struct ConnectivityState {
    pub(crate) level: ConnectivityLevel,
    pub(crate) probe: Option<CancelHandle>,
}

impl ConnectivityState {
    pub(crate) fn new(level: ConnectivityLevel) -> Self {
        Self { level, probe: None }
    }
}

impl<C: Connector, D: Dispatcher, P: Platform> ClientInner<C, D, P> {
    /// Applies a connectivity observation.
    ///
    /// Serialized by the connectivity mutex; a repeat of the cached level
    /// is a no-op, so concurrent failing calls cannot stack up transitions
    /// or probe loops. A real transition emits the change event and, when
    /// going offline, starts the probe.
    pub(crate) async fn on_connectivity_changed(
        &self,
        level: ConnectivityLevel,
    ) {
        let mut state = self.connectivity.lock().await;
        if state.level == level {
            return;
        }
        info!(%level, "connectivity changed");
        state.level = level;

        if level.is_online() {
            if let Some(probe) = state.probe.take() {
                probe.cancel();
            }
        } else if state.probe.is_none() {
            state.probe = Some(self.start_probe());
        }
        drop(state);

        self.emit(ClientEvent::ConnectivityChanged { level });
    }

    /// Spawns the probe task; returns its cancellation handle.
    fn start_probe(&self) -> CancelHandle {
        let (handle, mut cancel) = cancel_pair();
        let Some(inner) = self.weak.upgrade() else {
            return handle;
        };
        let mut backoff = Backoff::new(self.retry.clone());

        tokio::spawn(async move {
            debug!("offline probe started");
            loop {
                if cancel.is_cancelled() {
                    debug!("offline probe cancelled");
                    return;
                }
                if inner.probe_once().await {
                    let level = inner.observed_online_level();
                    debug!(%level, attempts = backoff.attempt(), "probe succeeded");
                    inner.on_connectivity_changed(level).await;
                    return;
                }
                if !backoff.wait(&mut cancel).await {
                    debug!("offline probe cancelled");
                    return;
                }
            }
        });
        handle
    }

    /// One ping against the service, bypassing token acquisition; a
    /// probe must never trigger a device registration.
    async fn probe_once(&self) -> bool {
        let service = self.service().await;
        let outcome =
            service.call(Verb::Get, "/service/ping", None, None).await;
        outcome.is_success()
    }

    /// The level to report after a successful probe. The ping proved a
    /// network path exists, so a platform still reporting offline is
    /// overridden with `Carrier`.
    fn observed_online_level(&self) -> ConnectivityLevel {
        let level = self.platform.connectivity();
        if level.is_online() {
            level
        } else {
            ConnectivityLevel::Carrier
        }
    }
}
