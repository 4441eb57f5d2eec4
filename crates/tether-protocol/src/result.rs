//! The caller-facing result of one remote call.

use crate::ServiceFault;

/// Success-or-failure for a typed remote call.
///
/// This is a "tagged union": success carries the decoded value and the
/// server's request id, failure carries the classified fault. By default
/// the client never raises remote failures as errors; callers inspect the
/// result as data, and only opt into raising via `allow_throw`.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult<T> {
    /// The call succeeded.
    Success {
        /// The decoded response value.
        value: T,
        /// Server-assigned request id, for correlation.
        request_id: Option<String>,
    },
    /// The call failed with a classified fault.
    Failure(ServiceFault),
}

impl<T> CallResult<T> {
    /// Builds a success result.
    pub fn success(value: T, request_id: Option<String>) -> Self {
        Self::Success { value, request_id }
    }

    /// `true` for [`Success`](Self::Success).
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The value, when successful.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Consumes the result, yielding the value when successful.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// The fault, when failed.
    pub fn fault(&self) -> Option<&ServiceFault> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(fault) => Some(fault),
        }
    }

    /// The request id, when the call reached the service successfully.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Success { request_id, .. } => request_id.as_deref(),
            Self::Failure(_) => None,
        }
    }

    /// Maps the success value, preserving the request id; failures pass
    /// through untouched. This is the primitive the result converter is
    /// built on.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CallResult<U> {
        match self {
            Self::Success { value, request_id } => CallResult::Success {
                value: f(value),
                request_id,
            },
            Self::Failure(fault) => CallResult::Failure(fault),
        }
    }

    /// Converts into a plain `Result`, discarding the request id.
    pub fn into_result(self) -> Result<T, ServiceFault> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Failure(fault) => Err(fault),
        }
    }
}
