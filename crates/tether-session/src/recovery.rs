//! The login-failure recovery state machine.
//!
//! When a call comes back `Unauthorized`, the client must decide what to
//! clear and whether to prompt for login, without ever running two
//! recovery flows at once, and without a login dispatch re-triggering the
//! flow it is part of. The decision itself is pure and lives here; the
//! client owns the mutex and the callback-thread dispatch.

use tether_protocol::{FaultKind, ServiceFault, UnauthorizedReason};

// ---------------------------------------------------------------------------
// RecoveryState
// ---------------------------------------------------------------------------

/// Where the recovery flow currently is.
///
/// ```text
/// Idle ──(unauthorized fault)──→ ClearingCredentials ──┬──→ AwaitingLogin
///   ↑                                                  │         │
///   └──────────────(no prompt needed)──────────────────┘         │
///   └───────────────(login dispatch ran)─────────────────────────┘
/// ```
///
/// Any trigger that arrives while the state is not `Idle` is ignored;
/// that is the guarantee that at most one recovery flow is active, and
/// that a login dispatch cannot recursively restart the flow it belongs
/// to. The state must return to `Idle` on *every* exit path, including a
/// failed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryState {
    /// No recovery in progress.
    #[default]
    Idle,
    /// Credentials are being cleared for an unauthorized fault.
    ClearingCredentials,
    /// A login prompt has been dispatched and has not yet run.
    AwaitingLogin,
}

// ---------------------------------------------------------------------------
// RecoveryAction
// ---------------------------------------------------------------------------

/// What an unauthorized fault (or the absence of any user) calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// No user was ever established; ask for login, clear nothing.
    RequestLogin,
    /// The device credentials are bad. Clear them so the next call
    /// re-registers; no prompt.
    ClearDevice,
    /// The operation needs a signed-in user. Clear everything and ask for
    /// login.
    ClearAllAndLogin,
    /// Not an auth problem this flow handles.
    Ignore,
}

impl RecoveryAction {
    /// Decides the action for a classified fault.
    ///
    /// `None` means no fault occurred but no user is established (the
    /// "accessing the current user with no identity" path); that always
    /// requests login.
    pub fn for_fault(fault: Option<&ServiceFault>) -> Self {
        let Some(fault) = fault else {
            return Self::RequestLogin;
        };
        match fault.kind {
            FaultKind::Unauthorized(reason) => match reason {
                UnauthorizedReason::AppCredentialsInvalid
                | UnauthorizedReason::AccessTokenInvalid => Self::ClearDevice,
                UnauthorizedReason::UserAccessTokenRequired => {
                    Self::ClearAllAndLogin
                }
                UnauthorizedReason::Unspecified => Self::Ignore,
            },
            _ => Self::Ignore,
        }
    }

    /// `true` when this action ends with a login prompt.
    pub fn requests_login(&self) -> bool {
        matches!(self, Self::RequestLogin | Self::ClearAllAndLogin)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tether_protocol::CallOutcome;

    fn unauthorized(code: &str) -> ServiceFault {
        ServiceFault::classify(&CallOutcome::failure(401, code)).unwrap()
    }

    #[test]
    fn test_no_fault_requests_login() {
        let action = RecoveryAction::for_fault(None);
        assert_eq!(action, RecoveryAction::RequestLogin);
        assert!(action.requests_login());
    }

    #[test]
    fn test_invalid_app_credentials_clears_device_without_prompt() {
        let fault = unauthorized("AuthAppCredentialsInvalid");
        let action = RecoveryAction::for_fault(Some(&fault));
        assert_eq!(action, RecoveryAction::ClearDevice);
        assert!(!action.requests_login());
    }

    #[test]
    fn test_invalid_access_token_clears_device_without_prompt() {
        let fault = unauthorized("AuthAccessTokenInvalid");
        let action = RecoveryAction::for_fault(Some(&fault));
        assert_eq!(action, RecoveryAction::ClearDevice);
        assert!(!action.requests_login());
    }

    #[test]
    fn test_user_token_required_clears_all_and_prompts() {
        let fault = unauthorized("AuthUserAccessTokenRequired");
        let action = RecoveryAction::for_fault(Some(&fault));
        assert_eq!(action, RecoveryAction::ClearAllAndLogin);
        assert!(action.requests_login());
    }

    #[test]
    fn test_unknown_unauthorized_code_is_ignored() {
        let fault = unauthorized("SomethingNew");
        assert_eq!(
            RecoveryAction::for_fault(Some(&fault)),
            RecoveryAction::Ignore
        );
    }

    #[test]
    fn test_non_auth_faults_are_ignored() {
        let fault =
            ServiceFault::classify(&CallOutcome::failure(500, "ServiceError"))
                .unwrap();
        assert_eq!(
            RecoveryAction::for_fault(Some(&fault)),
            RecoveryAction::Ignore
        );

        let fault = ServiceFault::classify(&CallOutcome::no_internet())
            .unwrap();
        assert_eq!(
            RecoveryAction::for_fault(Some(&fault)),
            RecoveryAction::Ignore
        );
    }

    #[test]
    fn test_recovery_state_default_is_idle() {
        assert_eq!(RecoveryState::default(), RecoveryState::Idle);
    }
}
