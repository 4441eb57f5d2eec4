//! Session state for Tether: what survives a process restart.
//!
//! This crate handles the durable half of the session:
//!
//! 1. **The record** ([`SessionRecord`]): tokens, identity, and overrides,
//!    serialized as one JSON document per application id.
//! 2. **The store** ([`SessionStore`] trait): the key/value capability that
//!    persists the record; [`MemoryStore`] is the in-process implementation.
//! 3. **The state** ([`SessionState`]): load/mutate/persist discipline:
//!    every durable mutation is followed by a save, corrupt stored data is
//!    treated as absent.
//! 4. **Identity** ([`AuthenticatedUser`]): the signed-in user, with
//!    profile fields populated lazily.
//! 5. **Recovery** ([`RecoveryState`], [`RecoveryAction`]): the pure
//!    login-failure state machine the client drives on `Unauthorized`
//!    faults.
//!
//! # How it fits in the stack
//!
//! ```text
//! Client (above)   ← orchestrates calls, events, recovery
//!     ↕
//! Session (this crate)  ← owns durable credentials and identity
//!     ↕
//! Protocol (below) ← provides AuthLevel, UserId, fault kinds
//! ```

mod identity;
mod record;
mod recovery;
mod state;
mod store;

pub use identity::{AuthenticatedUser, UserProfile};
pub use record::SessionRecord;
pub use recovery::{RecoveryAction, RecoveryState};
pub use state::SessionState;
pub use store::{MemoryStore, SessionStore};
