//! Capability interfaces Tether expects the embedding application to supply.
//!
//! The session core deliberately implements no I/O of its own. Three
//! collaborators are injected at client construction:
//!
//! - [`RemoteService`] / [`Connector`]: executes one remote call and
//!   reports a raw [`CallOutcome`](tether_protocol::CallOutcome). The HTTP
//!   (or test) implementation lives in the embedding application.
//! - [`Dispatcher`]: marshals an action onto the single logical callback
//!   context where user-visible events, login prompts, and completion hooks
//!   run. [`CallbackThread`] is the standard tokio-task implementation.
//! - [`Platform`]: the device descriptor: push token, unique id, model,
//!   OS version, connectivity, and optional config settings.
//!
//! # Why traits?
//!
//! The same reason the session layer doesn't hard-code an auth provider:
//! production injects a real HTTP client and a UI-thread dispatcher, tests
//! inject a scripted service and an inline dispatcher, and the core never
//! changes.

#![allow(async_fn_in_trait)]

mod dispatcher;
mod platform;

pub use dispatcher::{Action, CallbackThread, Dispatcher, InlineDispatcher};
pub use platform::{Platform, StaticPlatform};

use tether_protocol::{CallOutcome, ParamMap, Verb};

/// Executes remote calls against a service root.
///
/// # Contract
///
/// - `call` never fails at the Rust level: transport-layer problems are
///   reported *inside* the [`CallOutcome`] (status `0` for no connectivity)
///   so the pipeline classifies every failure through one path.
/// - `set_root` takes effect for subsequent calls; the backend may reassign
///   the root during device registration.
///
/// # Trait bounds
///
/// `Send + Sync + 'static`: the service handle is shared across concurrent
/// call paths and spawned probe tasks for the life of the client. `call`
/// is declared in desugared form so its future carries a `Send` bound;
/// the offline probe awaits calls from a `tokio::spawn`ed task.
pub trait RemoteService: Send + Sync + 'static {
    /// Executes one call: verb + path + optional bearer token + parameters.
    ///
    /// Implementations may still be written as plain `async fn`s; the
    /// compiler checks their futures against the `Send` bound.
    fn call(
        &self,
        verb: Verb,
        path: &str,
        token: Option<&str>,
        parameters: Option<&ParamMap>,
    ) -> impl Future<Output = CallOutcome> + Send;

    /// Replaces the service root used for subsequent calls.
    fn set_root(&self, root: &str);

    /// The service root currently in effect.
    fn root(&self) -> String;
}

/// Builds the [`RemoteService`] handle, exactly once, when the client
/// first needs it.
///
/// Construction is deferred so the effective service root (persisted
/// override → platform config → built-in default) is resolved at first
/// use, not at client construction.
pub trait Connector: Send + Sync + 'static {
    /// The service type this connector produces.
    type Service: RemoteService;

    /// Builds a service handle rooted at `service_root`.
    fn connect(&self, service_root: &str) -> Self::Service;
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct OfflineService {
        root: Mutex<String>,
    }

    impl RemoteService for OfflineService {
        async fn call(
            &self,
            _verb: Verb,
            _path: &str,
            _token: Option<&str>,
            _parameters: Option<&ParamMap>,
        ) -> CallOutcome {
            tokio::task::yield_now().await;
            CallOutcome::no_internet()
        }

        fn set_root(&self, root: &str) {
            *self.root.lock().unwrap() = root.to_string();
        }

        fn root(&self) -> String {
            self.root.lock().unwrap().clone()
        }
    }

    // Generic on purpose: spawning through a bare `S: RemoteService`
    // bound exercises the `Send` bound on the call future, the same shape
    // the offline probe uses.
    async fn spawned_call<S: RemoteService>(service: Arc<S>) -> CallOutcome {
        tokio::spawn(async move {
            service.call(Verb::Get, "/service/ping", None, None).await
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_call_awaits_across_a_spawned_task() {
        let service = Arc::new(OfflineService {
            root: Mutex::new("https://api.example.com/".to_string()),
        });
        let outcome = spawned_call(Arc::clone(&service)).await;
        assert_eq!(outcome.status, 0);
        assert!(!outcome.is_success());
    }
}
