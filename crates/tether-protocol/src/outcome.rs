//! The raw outcome of one remote call, before classification.
//!
//! The transport collaborator returns a [`CallOutcome`] for every call it
//! executes, including the ones that never reached the network (status 0).
//! The pipeline then classifies it into the fault taxonomy; nothing above
//! the transport ever inspects raw status codes directly.

use serde_json::Value;

/// Parameters for a remote call: a JSON object, key → value.
///
/// A type alias rather than a newtype: call sites build these with
/// `serde_json::json!` or by serializing a typed request struct, and the
/// map flows through to the transport untouched apart from the location
/// merge.
pub type ParamMap = serde_json::Map<String, Value>;

/// What the remote method collaborator reports back for one call.
///
/// Mirrors the service's response envelope: a value *or* an error code,
/// plus the transport status and a request id for correlation. A `status`
/// of `0` means the call never reached the service (no connectivity).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallOutcome {
    /// The decoded result value, when the call succeeded.
    pub value: Option<Value>,
    /// Transport status code. `0` = no connectivity, `2xx` = success.
    pub status: u16,
    /// The service's error code string (e.g. `"AuthUserAccessTokenRequired"`).
    /// `None` means the call succeeded; this field, not the status code,
    /// is what classification keys off.
    pub error: Option<String>,
    /// The service's numeric error number, when one was supplied.
    pub error_number: Option<i64>,
    /// Human-readable error message from the service.
    pub message: Option<String>,
    /// Server-assigned id for this request, for support correlation.
    pub request_id: Option<String>,
}

impl CallOutcome {
    /// A successful outcome carrying a value.
    pub fn success(value: Value, request_id: impl Into<Option<String>>) -> Self {
        Self {
            value: Some(value),
            status: 200,
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// A failed outcome with a status and service error code.
    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// The outcome a transport reports when the network is unreachable.
    pub fn no_internet() -> Self {
        Self {
            status: 0,
            error: Some("NoInternetConnection".to_string()),
            ..Self::default()
        }
    }

    /// `true` when the service reported no error for this call.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_outcome_has_no_error() {
        let outcome = CallOutcome::success(json!({"id": "u1"}), None);
        assert!(outcome.is_success());
        assert_eq!(outcome.status, 200);
    }

    #[test]
    fn test_failure_outcome_is_not_success() {
        let outcome = CallOutcome::failure(500, "ServiceError");
        assert!(!outcome.is_success());
        assert_eq!(outcome.error.as_deref(), Some("ServiceError"));
    }

    #[test]
    fn test_no_internet_outcome_has_status_zero() {
        let outcome = CallOutcome::no_internet();
        assert_eq!(outcome.status, 0);
        assert!(!outcome.is_success());
    }
}
