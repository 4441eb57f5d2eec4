//! The fault taxonomy: every failed remote call is classified exactly once.
//!
//! Classification happens in the request pipeline, immediately after the
//! transport returns. Everything downstream (recovery, events, the
//! caller-facing result) branches on the classified [`FaultKind`], never
//! on raw status codes.

use crate::CallOutcome;

// ---------------------------------------------------------------------------
// UnauthorizedReason
// ---------------------------------------------------------------------------

/// Why the service rejected the caller's credentials.
///
/// Subtypes a 401/403 by the service's error code string. The recovery
/// state machine treats each reason differently: invalid device credentials
/// are silently re-registered, while a missing user token prompts for login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnauthorizedReason {
    /// The application id/key pair itself was rejected.
    AppCredentialsInvalid,
    /// The bearer token (device or user) is no longer valid.
    AccessTokenInvalid,
    /// The operation requires a signed-in user, but the call carried a
    /// device token.
    UserAccessTokenRequired,
    /// A 401/403 with an error code we don't recognize.
    Unspecified,
}

impl UnauthorizedReason {
    /// Maps the service's error code string to a reason.
    pub fn from_error_code(code: &str) -> Self {
        match code {
            "AuthAppCredentialsInvalid" => Self::AppCredentialsInvalid,
            "AuthAccessTokenInvalid" => Self::AccessTokenInvalid,
            "AuthUserAccessTokenRequired" => Self::UserAccessTokenRequired,
            _ => Self::Unspecified,
        }
    }
}

// ---------------------------------------------------------------------------
// FaultKind
// ---------------------------------------------------------------------------

/// The three classes of remote failure, by transport status:
///
/// | Status | Kind | Side effect |
/// |---|---|---|
/// | `0` | `NoInternet` | connectivity monitor driven offline |
/// | `401`/`403` | `Unauthorized` | auth failure recovery |
/// | anything else | `Service` | fault policy notification only |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The call never reached the service.
    NoInternet,
    /// The service rejected the caller's credentials.
    Unauthorized(UnauthorizedReason),
    /// Any other service-reported failure.
    Service,
}

// ---------------------------------------------------------------------------
// ServiceFault
// ---------------------------------------------------------------------------

/// A classified remote failure.
///
/// Carries everything the subscriber and the caller might want: the kind,
/// the service's error code and message, the numeric error number, and the
/// transport status. Implements `std::error::Error` so it can be raised
/// through `?` when the caller opts into throwing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error} (status {status})")]
pub struct ServiceFault {
    /// Which class of failure this is.
    pub kind: FaultKind,
    /// The service's error code string.
    pub error: String,
    /// Human-readable message, when the service supplied one.
    pub message: Option<String>,
    /// The service's numeric error number, when supplied.
    pub error_number: Option<i64>,
    /// Transport status code of the failed call.
    pub status: u16,
}

impl ServiceFault {
    /// Classifies a raw outcome into a fault.
    ///
    /// Returns `None` for successful outcomes; classification is the only
    /// place the success/failure split happens, so the pipeline calls this
    /// exactly once per response.
    pub fn classify(outcome: &CallOutcome) -> Option<Self> {
        let error = outcome.error.as_deref()?;

        let kind = match outcome.status {
            0 => FaultKind::NoInternet,
            401 | 403 => FaultKind::Unauthorized(
                UnauthorizedReason::from_error_code(error),
            ),
            _ => FaultKind::Service,
        };

        Some(Self {
            kind,
            error: error.to_string(),
            message: outcome.message.clone(),
            error_number: outcome.error_number,
            status: outcome.status,
        })
    }
}

// ---------------------------------------------------------------------------
// ClientError
// ---------------------------------------------------------------------------

/// Failures that are *raised* to the caller rather than returned as data.
///
/// Only two things ever raise: local validation (which never enters the
/// pipeline at all) and a classified fault the caller explicitly asked to
/// have rethrown. Everything else surfaces inside
/// [`CallResult::Failure`](crate::CallResult).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Malformed caller input, rejected before any network activity.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// The offending parameter name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A classified remote fault, raised because the caller passed
    /// `allow_throw` and the fault policy approved.
    #[error(transparent)]
    Fault(#[from] ServiceFault),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: u16, error: &str) -> CallOutcome {
        CallOutcome::failure(status, error)
    }

    #[test]
    fn test_classify_success_returns_none() {
        let ok = CallOutcome::success(serde_json::json!(true), None);
        assert!(ServiceFault::classify(&ok).is_none());
    }

    #[test]
    fn test_classify_status_zero_is_no_internet() {
        let fault = ServiceFault::classify(&CallOutcome::no_internet())
            .expect("should classify");
        assert_eq!(fault.kind, FaultKind::NoInternet);
        assert_eq!(fault.status, 0);
    }

    #[test]
    fn test_classify_401_subtypes_by_error_code() {
        let fault =
            ServiceFault::classify(&outcome(401, "AuthUserAccessTokenRequired"))
                .unwrap();
        assert_eq!(
            fault.kind,
            FaultKind::Unauthorized(
                UnauthorizedReason::UserAccessTokenRequired
            )
        );

        let fault =
            ServiceFault::classify(&outcome(401, "AuthAccessTokenInvalid"))
                .unwrap();
        assert_eq!(
            fault.kind,
            FaultKind::Unauthorized(UnauthorizedReason::AccessTokenInvalid)
        );

        let fault =
            ServiceFault::classify(&outcome(403, "AuthAppCredentialsInvalid"))
                .unwrap();
        assert_eq!(
            fault.kind,
            FaultKind::Unauthorized(
                UnauthorizedReason::AppCredentialsInvalid
            )
        );
    }

    #[test]
    fn test_classify_401_unknown_code_is_unspecified() {
        let fault =
            ServiceFault::classify(&outcome(401, "SomethingElse")).unwrap();
        assert_eq!(
            fault.kind,
            FaultKind::Unauthorized(UnauthorizedReason::Unspecified)
        );
    }

    #[test]
    fn test_classify_other_status_is_service_fault() {
        let fault = ServiceFault::classify(&outcome(500, "ItemNotFound"))
            .unwrap();
        assert_eq!(fault.kind, FaultKind::Service);
        assert_eq!(fault.error, "ItemNotFound");
    }

    #[test]
    fn test_fault_preserves_message_and_error_number() {
        let mut raw = outcome(500, "ServiceError");
        raw.message = Some("boom".into());
        raw.error_number = Some(1234);
        let fault = ServiceFault::classify(&raw).unwrap();
        assert_eq!(fault.message.as_deref(), Some("boom"));
        assert_eq!(fault.error_number, Some(1234));
    }

    #[test]
    fn test_client_error_from_fault_is_transparent() {
        let fault = ServiceFault::classify(&outcome(500, "ServiceError"))
            .unwrap();
        let err: ClientError = fault.into();
        assert!(err.to_string().contains("ServiceError"));
    }
}
