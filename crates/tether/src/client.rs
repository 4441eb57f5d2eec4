//! `Client` builder and shared client state.
//!
//! This is the entry point for embedding Tether. It ties together all the
//! layers: platform capabilities → session state → token provider →
//! request pipeline.

use std::sync::{Arc, Mutex, Weak};

use tether_platform::{Dispatcher, Platform};
use tether_protocol::{
    AuthLevel, ClientError, ConnectivityLevel, GeoLocation,
};
use tether_retry::RetryConfig;
use tether_session::{
    AuthenticatedUser, MemoryStore, RecoveryState, SessionState,
    SessionStore,
};

use crate::connectivity::ConnectivityState;
use crate::events::{ClientEvent, FaultPolicy, RethrowAll, SubscriberSet};
use crate::Connector;

/// The service root used when neither the persisted record nor the
/// platform configuration overrides it.
pub const DEFAULT_SERVICE_ROOT: &str = "https://api.tetherapp.io/";

/// Shared client state, one per application id, passed by `Arc` to every
/// call path and spawned task.
///
/// Lock discipline: `std::sync::Mutex` guards plain data that is mutated
/// and persisted without awaiting (session record, recovery state,
/// subscribers). `tokio::sync::Mutex` guards the three places a critical
/// section genuinely suspends: lazy transport construction, device
/// registration, and connectivity transitions.
pub(crate) struct ClientInner<C: Connector, D: Dispatcher, P: Platform> {
    /// Self-reference for spawned tasks and dispatched closures. Set once
    /// via `Arc::new_cyclic`.
    pub(crate) weak: Weak<ClientInner<C, D, P>>,
    pub(crate) connector: C,
    pub(crate) dispatcher: D,
    pub(crate) platform: P,
    pub(crate) session: Mutex<SessionState>,
    pub(crate) auth_level: Mutex<AuthLevel>,
    pub(crate) current_user: Mutex<Option<AuthenticatedUser>>,
    pub(crate) last_location: Mutex<Option<GeoLocation>>,
    pub(crate) recovery: Arc<Mutex<RecoveryState>>,
    pub(crate) subscribers: SubscriberSet,
    pub(crate) policy: Arc<dyn FaultPolicy>,
    pub(crate) retry: RetryConfig,
    pub(crate) service: tokio::sync::Mutex<Option<Arc<C::Service>>>,
    /// Single-flight guard for device registration. Held across the whole
    /// registration call; waiters re-check the cached token after
    /// acquiring it.
    pub(crate) registration: tokio::sync::Mutex<()>,
    pub(crate) connectivity: tokio::sync::Mutex<ConnectivityState>,
}

impl<C: Connector, D: Dispatcher, P: Platform> ClientInner<C, D, P> {
    /// The transport handle, built on first use.
    ///
    /// Deferring construction means the effective service root reflects
    /// whatever the persisted record carried at first call time:
    /// record override → platform config → [`DEFAULT_SERVICE_ROOT`].
    pub(crate) async fn service(&self) -> Arc<C::Service> {
        let mut slot = self.service.lock().await;
        if let Some(service) = slot.as_ref() {
            return Arc::clone(service);
        }

        let root = {
            let session = self.session.lock().unwrap();
            session.record().service_url.clone()
        }
        .or_else(|| self.platform.config_service_root())
        .unwrap_or_else(|| DEFAULT_SERVICE_ROOT.to_string());

        tracing::debug!(%root, "connecting transport");
        let service = Arc::new(self.connector.connect(&root));
        *slot = Some(Arc::clone(&service));
        service
    }
}

/// Rejects blank caller-supplied strings, returning the trimmed value.
pub(crate) fn required(
    name: &'static str,
    value: &str,
) -> Result<String, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidArgument {
            name,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Client`].
///
/// # Example
///
/// ```rust,ignore
/// let client = Client::builder(app_id, app_key, http, callbacks, platform)
///     .retry(RetryConfig::backoff(
///         Duration::from_secs(1),
///         Duration::from_secs(30),
///     ))
///     .build()?;
/// ```
pub struct ClientBuilder<C: Connector, D: Dispatcher, P: Platform> {
    app_id: String,
    app_key: String,
    app_version: Option<String>,
    connector: C,
    dispatcher: D,
    platform: P,
    store: Arc<dyn SessionStore>,
    retry: RetryConfig,
    policy: Arc<dyn FaultPolicy>,
}

impl<C: Connector, D: Dispatcher, P: Platform> ClientBuilder<C, D, P> {
    /// Creates a builder with in-memory persistence and the default
    /// (rethrow-all) fault policy.
    pub fn new(
        app_id: &str,
        app_key: &str,
        connector: C,
        dispatcher: D,
        platform: P,
    ) -> Self {
        Self {
            app_id: app_id.to_string(),
            app_key: app_key.to_string(),
            app_version: None,
            connector,
            dispatcher,
            platform,
            store: Arc::new(MemoryStore::new()),
            retry: RetryConfig::default(),
            policy: Arc::new(RethrowAll),
        }
    }

    /// Sets the durable session store (defaults to [`MemoryStore`]).
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    /// Overrides the application version reported at registration.
    pub fn app_version(mut self, version: &str) -> Self {
        self.app_version = Some(version.to_string());
        self
    }

    /// Sets the offline probe's retry policy (defaults to a fixed one
    /// second interval).
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Sets the fault notification policy (defaults to [`RethrowAll`]).
    pub fn fault_policy(mut self, policy: impl FaultPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Validates credentials, loads (or initializes) the persisted
    /// session, and constructs the client.
    ///
    /// Credentials are trimmed and must be non-empty; they are immutable
    /// for the life of the client. Build a second client for a second
    /// application id.
    pub fn build(self) -> Result<Client<C, D, P>, ClientError> {
        let app_id = required("app_id", &self.app_id)?;
        let app_key = required("app_key", &self.app_key)?;
        let app_version =
            self.app_version.or_else(|| self.platform.app_version());

        let session =
            SessionState::load(self.store, &app_id, &app_key, app_version);
        let level = session.auth_level();
        let connectivity = self.platform.connectivity();
        tracing::info!(%app_id, %level, "client initialized");

        let inner = Arc::new_cyclic(|weak| ClientInner {
            weak: weak.clone(),
            connector: self.connector,
            dispatcher: self.dispatcher,
            platform: self.platform,
            session: Mutex::new(session),
            auth_level: Mutex::new(level),
            current_user: Mutex::new(None),
            last_location: Mutex::new(None),
            recovery: Arc::new(Mutex::new(RecoveryState::Idle)),
            subscribers: SubscriberSet::default(),
            policy: self.policy,
            retry: self.retry,
            service: tokio::sync::Mutex::new(None),
            registration: tokio::sync::Mutex::new(()),
            connectivity: tokio::sync::Mutex::new(ConnectivityState::new(
                connectivity,
            )),
        });

        Ok(Client { inner })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A session-managed client for the platform service.
///
/// Cheap to clone; all clones share one session. Request methods live in
/// the pipeline module ([`get`](Client::get) and friends), account
/// operations in the users module ([`login_user`](Client::login_user) and
/// friends).
pub struct Client<C: Connector, D: Dispatcher, P: Platform> {
    pub(crate) inner: Arc<ClientInner<C, D, P>>,
}

impl<C: Connector, D: Dispatcher, P: Platform> Clone for Client<C, D, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector, D: Dispatcher, P: Platform> Client<C, D, P> {
    /// Creates a new builder.
    pub fn builder(
        app_id: &str,
        app_key: &str,
        connector: C,
        dispatcher: D,
        platform: P,
    ) -> ClientBuilder<C, D, P> {
        ClientBuilder::new(app_id, app_key, connector, dispatcher, platform)
    }

    /// Registers an event subscriber. Handlers run on the callback
    /// context, in registration order.
    pub fn subscribe(
        &self,
        handler: impl Fn(&ClientEvent) + Send + Sync + 'static,
    ) {
        self.inner.subscribers.add(handler);
    }

    /// The current authentication level.
    pub fn auth_level(&self) -> AuthLevel {
        self.inner.session.lock().unwrap().auth_level()
    }

    /// Remembers the device's location; merged into every outgoing call's
    /// parameters unless the caller supplies its own.
    pub fn set_last_location(&self, location: Option<GeoLocation>) {
        *self.inner.last_location.lock().unwrap() = location;
    }

    /// The last location handed to [`set_last_location`](Self::set_last_location).
    pub fn last_location(&self) -> Option<GeoLocation> {
        *self.inner.last_location.lock().unwrap()
    }

    /// The last observed connectivity level.
    pub async fn connectivity_level(&self) -> ConnectivityLevel {
        self.inner.connectivity.lock().await.level
    }

    /// Reports a connectivity change observed by the platform.
    ///
    /// No-op when the level is unchanged; a transition to offline starts
    /// the probe loop.
    pub async fn notify_connectivity(&self, level: ConnectivityLevel) {
        self.inner.on_connectivity_changed(level).await;
    }

    /// Stops background work (the offline probe, when running). Pending
    /// calls complete normally.
    pub async fn shutdown(&self) {
        let mut state = self.inner.connectivity.lock().await;
        if let Some(probe) = state.probe.take() {
            probe.cancel();
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
    fn test_required_trims_and_accepts() {
        assert_eq!(required("app_id", "  abc  ").unwrap(), "abc");
    }

    #[test]
    fn test_required_rejects_blank() {
        let err = required("app_key", "   ").unwrap_err();
        match err {
            ClientError::InvalidArgument { name, .. } => {
                assert_eq!(name, "app_key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
