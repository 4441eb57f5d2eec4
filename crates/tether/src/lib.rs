//! # Tether
//!
//! Client-side session manager for applications talking to the Tether
//! platform service.
//!
//! Tether keeps the session alive so the application doesn't have to: it
//! acquires and persists bearer credentials (registering the device on
//! first use), classifies every remote failure into one taxonomy, recovers
//! from authorization failures, and probes its way back online after a
//! connectivity loss. The application supplies three capabilities
//! (a transport [`Connector`]/[`RemoteService`], a callback-thread
//! [`Dispatcher`], and a device [`Platform`] descriptor) and gets back a
//! typed request surface plus an event stream.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tether::{CallOptions, Client, CallbackThread, StaticPlatform};
//!
//! # async fn run<C: tether::Connector>(http: C) -> Result<(), tether::ClientError> {
//! let client = Client::builder(
//!     "my-app-id",
//!     "my-app-key",
//!     http,
//!     CallbackThread::spawn(),
//!     StaticPlatform::default(),
//! )
//! .build()?;
//!
//! client.subscribe(|event| println!("{event:?}"));
//!
//! let pong = client.ping(CallOptions::default()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Layers
//!
//! ```text
//! tether            ← client, pipeline, token provider, auth, connectivity
//!     ↕
//! tether-session    ← persisted record, recovery state machine
//! tether-retry      ← cancellable backoff for the offline probe
//!     ↕
//! tether-platform   ← capability traits the application implements
//! tether-protocol   ← shared vocabulary: results, faults, levels
//! ```

mod auth;
mod client;
mod connectivity;
pub mod convert;
mod events;
mod pipeline;
mod token;
mod users;

pub use client::{Client, ClientBuilder, DEFAULT_SERVICE_ROOT};
pub use events::{
    ClientEvent, EventHandler, FaultDecision, FaultPolicy, RethrowAll,
    SuppressAll,
};
pub use pipeline::CallOptions;
pub use users::NewUser;

// The vocabulary types callers interact with, re-exported so most
// applications only depend on `tether` itself.
pub use tether_platform::{
    CallbackThread, Connector, Dispatcher, InlineDispatcher, Platform,
    RemoteService, StaticPlatform,
};
pub use tether_protocol::{
    AuthLevel, CallOutcome, CallResult, ClientError, ConnectivityLevel,
    FaultKind, GeoLocation, ParamMap, ServiceFault, UnauthorizedReason,
    UserId, Verb,
};
pub use tether_retry::RetryConfig;
pub use tether_session::{
    AuthenticatedUser, MemoryStore, SessionStore, UserProfile,
};
