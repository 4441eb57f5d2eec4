//! The request pipeline: every remote call flows through here.
//!
//! One path handles token acquisition, the location merge, the transport
//! call, fault classification, and fault side effects, so a `get` on a
//! fresh client and a `delete` on a long-lived session behave identically:
//!
//! ```text
//! verb + path + params
//!   → transport handle (built lazily)
//!   → location merge
//!   → bearer token (may register the device)
//!   → RemoteService::call → raw outcome
//!   → classify → side effects → CallResult<T>
//! ```
//!
//! Remote failures are data by default: the pipeline returns
//! [`CallResult::Failure`] and raises only when the caller passed
//! `allow_throw` *and* the fault policy said [`FaultDecision::Rethrow`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use tether_platform::{Dispatcher, Platform, RemoteService};
use tether_protocol::{
    CallResult, ClientError, ConnectivityLevel, FaultKind, ParamMap,
    ServiceFault, Verb,
};
use tracing::debug;

use crate::client::ClientInner;
use crate::events::{ClientEvent, FaultDecision};
use crate::{Client, Connector};

/// Per-call options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Offer to raise a fault as an error instead of returning it as
    /// data. The fault policy has the final say.
    pub allow_throw: bool,
}

impl CallOptions {
    /// Options with `allow_throw` set.
    pub fn throwing() -> Self {
        Self { allow_throw: true }
    }
}

/// The fault produced when a successful response doesn't decode into the
/// caller's type.
pub(crate) fn decode_fault(
    status: u16,
    error: &serde_json::Error,
) -> ServiceFault {
    ServiceFault {
        kind: FaultKind::Service,
        error: "UnexpectedResponseFormat".to_string(),
        message: Some(error.to_string()),
        error_number: None,
        status,
    }
}

impl<C: Connector, D: Dispatcher, P: Platform> ClientInner<C, D, P> {
    /// Runs the full pipeline. Never raises; the returned decision tells
    /// the caller-facing wrapper whether an `allow_throw` call may.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        verb: Verb,
        path: &str,
        parameters: Option<ParamMap>,
    ) -> (CallResult<T>, FaultDecision) {
        let service = self.service().await;
        let parameters = self.merge_location(parameters);

        let token = match self.access_token().await {
            Ok(token) => token,
            Err(fault) => {
                let decision = self.fault_side_effects(&fault).await;
                return (CallResult::Failure(fault), decision);
            }
        };

        debug!(%verb, path, "service call");
        let outcome = service
            .call(verb, path, Some(&token), parameters.as_ref())
            .await;

        match ServiceFault::classify(&outcome) {
            None => {
                let value = outcome.value.unwrap_or(Value::Null);
                match serde_json::from_value::<T>(value) {
                    Ok(decoded) => (
                        CallResult::success(decoded, outcome.request_id),
                        FaultDecision::Suppress,
                    ),
                    Err(e) => {
                        debug!(%verb, path, error = %e, "response decode failed");
                        let fault = decode_fault(outcome.status, &e);
                        let decision =
                            self.fault_side_effects(&fault).await;
                        (CallResult::Failure(fault), decision)
                    }
                }
            }
            Some(fault) => {
                debug!(
                    %verb,
                    path,
                    error = %fault.error,
                    status = fault.status,
                    "service call failed"
                );
                let decision = self.fault_side_effects(&fault).await;
                (CallResult::Failure(fault), decision)
            }
        }
    }

    /// The pipeline with the raise step: errors only for `allow_throw`
    /// calls whose fault the policy approved for rethrow.
    pub(crate) async fn call_service<T: DeserializeOwned>(
        &self,
        verb: Verb,
        path: &str,
        parameters: Option<ParamMap>,
        options: CallOptions,
    ) -> Result<CallResult<T>, ClientError> {
        let (result, decision) = self.execute(verb, path, parameters).await;
        match result {
            CallResult::Failure(fault)
                if options.allow_throw
                    && decision == FaultDecision::Rethrow =>
            {
                Err(ClientError::Fault(fault))
            }
            result => Ok(result),
        }
    }

    /// Fault side effects fire regardless of `allow_throw`:
    /// connectivity and authorization faults feed their recovery paths and
    /// never rethrow; service faults are announced and put to the policy.
    async fn fault_side_effects(
        &self,
        fault: &ServiceFault,
    ) -> FaultDecision {
        match fault.kind {
            FaultKind::NoInternet => {
                self.on_connectivity_changed(ConnectivityLevel::None).await;
                FaultDecision::Suppress
            }
            FaultKind::Unauthorized(_) => {
                self.on_authorization_failure(Some(fault)).await;
                FaultDecision::Suppress
            }
            FaultKind::Service => {
                self.emit(ClientEvent::ServiceFault {
                    fault: fault.clone(),
                });
                self.policy_decision(fault).await
            }
        }
    }

    /// Adds the remembered location to the parameters unless the caller
    /// already supplied one.
    fn merge_location(
        &self,
        parameters: Option<ParamMap>,
    ) -> Option<ParamMap> {
        let location = *self.last_location.lock().unwrap();
        let Some(location) = location else {
            return parameters;
        };
        let mut parameters = parameters.unwrap_or_default();
        parameters
            .entry("location".to_string())
            .or_insert_with(|| Value::String(location.to_string()));
        Some(parameters)
    }
}

// ---------------------------------------------------------------------------
// Caller-facing verbs
// ---------------------------------------------------------------------------

impl<C: Connector, D: Dispatcher, P: Platform> Client<C, D, P> {
    /// Executes an arbitrary call through the pipeline.
    pub async fn call_service<T: DeserializeOwned>(
        &self,
        verb: Verb,
        path: &str,
        parameters: Option<ParamMap>,
        options: CallOptions,
    ) -> Result<CallResult<T>, ClientError> {
        self.inner.call_service(verb, path, parameters, options).await
    }

    /// `GET path`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        parameters: Option<ParamMap>,
        options: CallOptions,
    ) -> Result<CallResult<T>, ClientError> {
        self.call_service(Verb::Get, path, parameters, options).await
    }

    /// `POST path`.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        parameters: Option<ParamMap>,
        options: CallOptions,
    ) -> Result<CallResult<T>, ClientError> {
        self.call_service(Verb::Post, path, parameters, options).await
    }

    /// `PUT path`.
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        parameters: Option<ParamMap>,
        options: CallOptions,
    ) -> Result<CallResult<T>, ClientError> {
        self.call_service(Verb::Put, path, parameters, options).await
    }

    /// `PATCH path`.
    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        parameters: Option<ParamMap>,
        options: CallOptions,
    ) -> Result<CallResult<T>, ClientError> {
        self.call_service(Verb::Patch, path, parameters, options).await
    }

    /// `DELETE path`.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        parameters: Option<ParamMap>,
        options: CallOptions,
    ) -> Result<CallResult<T>, ClientError> {
        self.call_service(Verb::Delete, path, parameters, options).await
    }
}
