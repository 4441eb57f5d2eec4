//! Client events and the fault notification policy.
//!
//! Every user-visible notification flows through one registry and one
//! dispatcher, so subscribers observe a single ordered stream on the
//! callback context regardless of which internal path produced the event.

use std::sync::{Arc, Mutex};

use tether_platform::{Dispatcher, Platform};
use tether_protocol::{
    AuthLevel, ConnectivityLevel, ServiceFault, UserId,
};
use tokio::sync::oneshot;

use crate::client::ClientInner;
use crate::Connector;

// ---------------------------------------------------------------------------
// ClientEvent
// ---------------------------------------------------------------------------

/// Everything the client reports to its subscribers.
///
/// Events fire only on real transitions: assigning the same connectivity
/// level twice, or recomputing an unchanged auth level, produces nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The authentication level crossed a boundary (e.g. `Device` → `User`).
    AuthLevelChanged { level: AuthLevel },
    /// The signed-in user changed. `previous` is the replaced user's id,
    /// `None` when no user was established before.
    UserChanged {
        user: Option<UserId>,
        previous: Option<UserId>,
    },
    /// The application should present its login flow.
    LoginRequired,
    /// The device's network path to the service changed.
    ConnectivityChanged { level: ConnectivityLevel },
    /// A remote call failed with a service-level fault (not connectivity and
    /// not authorization; those have their own recovery paths).
    ServiceFault { fault: ServiceFault },
}

/// A registered event subscriber.
pub type EventHandler = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// The subscriber registry. Handlers are invoked on the callback context,
/// in registration order, with a snapshot taken at emit time.
#[derive(Default)]
pub(crate) struct SubscriberSet {
    handlers: Mutex<Vec<EventHandler>>,
}

impl SubscriberSet {
    pub(crate) fn add(
        &self,
        handler: impl Fn(&ClientEvent) + Send + Sync + 'static,
    ) {
        self.handlers.lock().unwrap().push(Arc::new(handler));
    }

    pub(crate) fn snapshot(&self) -> Vec<EventHandler> {
        self.handlers.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// FaultPolicy
// ---------------------------------------------------------------------------

/// What to do with a service fault the caller offered to rethrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultDecision {
    /// Deliver the fault as a [`CallResult::Failure`](tether_protocol::CallResult)
    /// even though the caller passed `allow_throw`.
    Suppress,
    /// Raise the fault as an error when the caller passed `allow_throw`.
    Rethrow,
}

/// Decides, per fault, whether an `allow_throw` call raises.
///
/// The decision runs on the callback context, the same place events are
/// delivered, so an application can centralize its fault handling (log,
/// display, swallow) in one component. Connectivity and authorization
/// faults never reach the policy; they have dedicated recovery paths.
pub trait FaultPolicy: Send + Sync + 'static {
    fn decide(&self, fault: &ServiceFault) -> FaultDecision;
}

/// The default policy: honor every `allow_throw` request.
pub struct RethrowAll;

impl FaultPolicy for RethrowAll {
    fn decide(&self, _fault: &ServiceFault) -> FaultDecision {
        FaultDecision::Rethrow
    }
}

/// Never raise; every fault is delivered as result data.
pub struct SuppressAll;

impl FaultPolicy for SuppressAll {
    fn decide(&self, _fault: &ServiceFault) -> FaultDecision {
        FaultDecision::Suppress
    }
}

impl<F> FaultPolicy for F
where
    F: Fn(&ServiceFault) -> FaultDecision + Send + Sync + 'static,
{
    fn decide(&self, fault: &ServiceFault) -> FaultDecision {
        self(fault)
    }
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

impl<C: Connector, D: Dispatcher, P: Platform> ClientInner<C, D, P> {
    /// Delivers `event` to every subscriber on the callback context.
    pub(crate) fn emit(&self, event: ClientEvent) {
        let subscribers = self.subscribers.snapshot();
        if subscribers.is_empty() {
            return;
        }
        self.dispatcher.dispatch(Box::new(move || {
            for handler in &subscribers {
                handler(&event);
            }
        }));
    }

    /// Runs the fault policy on the callback context and awaits its
    /// decision. A dropped response (dispatcher shut down) suppresses.
    pub(crate) async fn policy_decision(
        &self,
        fault: &ServiceFault,
    ) -> FaultDecision {
        let (tx, rx) = oneshot::channel();
        let policy = Arc::clone(&self.policy);
        let fault = fault.clone();
        self.dispatcher.dispatch(Box::new(move || {
            let _ = tx.send(policy.decide(&fault));
        }));
        rx.await.unwrap_or(FaultDecision::Suppress)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tether_protocol::{CallOutcome, FaultKind};

    fn service_fault() -> ServiceFault {
        ServiceFault::classify(&CallOutcome::failure(500, "ServiceError"))
            .unwrap()
    }

    #[test]
    fn test_builtin_policies() {
        let fault = service_fault();
        assert_eq!(RethrowAll.decide(&fault), FaultDecision::Rethrow);
        assert_eq!(SuppressAll.decide(&fault), FaultDecision::Suppress);
    }

    #[test]
    fn test_closure_implements_fault_policy() {
        let policy = |fault: &ServiceFault| {
            if fault.kind == FaultKind::Service {
                FaultDecision::Suppress
            } else {
                FaultDecision::Rethrow
            }
        };
        assert_eq!(policy.decide(&service_fault()), FaultDecision::Suppress);
    }

    #[test]
    fn test_subscriber_set_snapshot_preserves_order() {
        let set = SubscriberSet::default();
        set.add(|_| {});
        set.add(|_| {});
        assert_eq!(set.snapshot().len(), 2);
    }
}
