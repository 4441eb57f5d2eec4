//! Shared types for Tether's client/service conversation.
//!
//! This crate defines the "vocabulary" that the rest of the stack speaks:
//!
//! - **Call types** ([`Verb`], [`CallOutcome`]): what goes into and comes
//!   back out of the remote method collaborator.
//! - **Results** ([`CallResult`]): the caller-facing success/failure union.
//! - **Faults** ([`ServiceFault`], [`FaultKind`]): the error taxonomy every
//!   raw outcome is classified into, and [`ClientError`] for the failures
//!   that are raised rather than returned.
//! - **Levels** ([`AuthLevel`], [`ConnectivityLevel`]): the two small state
//!   ladders the session layer reports transitions on.
//! - **Registration** ([`DeviceRegistration`]): the device registration
//!   endpoint contract.
//!
//! # Architecture
//!
//! The protocol layer sits below everything else. It knows nothing about
//! sessions, tokens, or transports; it only defines the data that flows
//! between them.
//!
//! ```text
//! Transport (raw outcome) → Protocol (classified fault) → Client (result)
//! ```

mod fault;
mod outcome;
mod registration;
mod result;
mod types;

pub use fault::{ClientError, FaultKind, ServiceFault, UnauthorizedReason};
pub use outcome::{CallOutcome, ParamMap};
pub use registration::{DeviceRegistration, RegisteredDevice};
pub use result::CallResult;
pub use types::{AuthLevel, ConnectivityLevel, GeoLocation, UserId, Verb};
