//! Authentication level tracking, user transitions, and failure recovery.

use std::sync::{Arc, Mutex};

use tether_platform::{Dispatcher, Platform};
use tether_protocol::{ServiceFault, UserId};
use tether_session::{AuthenticatedUser, RecoveryAction, RecoveryState};
use tracing::{info, warn};

use crate::client::ClientInner;
use crate::events::ClientEvent;
use crate::Connector;

/// Restores the recovery state to `Idle` when dropped.
///
/// Captured by the dispatched login prompt: whether the closure runs or is
/// dropped unexecuted (dispatcher shutdown), the state machine returns to
/// `Idle` and can accept the next failure.
struct IdleOnDrop(Arc<Mutex<RecoveryState>>);

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        *self.0.lock().unwrap() = RecoveryState::Idle;
    }
}

impl<C: Connector, D: Dispatcher, P: Platform> ClientInner<C, D, P> {
    /// Recomputes the auth level from the record and emits a change event
    /// if it crossed a boundary. Call after every token mutation.
    pub(crate) fn refresh_auth_level(&self) {
        let level = self.session.lock().unwrap().auth_level();
        {
            let mut last = self.auth_level.lock().unwrap();
            if *last == level {
                return;
            }
            info!(%level, "auth level changed");
            *last = level;
        }
        self.emit(ClientEvent::AuthLevelChanged { level });
    }

    /// Installs (or clears) the signed-in user.
    ///
    /// Persists the user token and ids, emits exactly one user-changed
    /// event carrying the replaced user's id, then recomputes the level.
    /// Clearing when no user is established is a no-op; user-changed
    /// events fire only on real transitions.
    pub(crate) fn install_user(&self, user: Option<AuthenticatedUser>) {
        if user.is_none()
            && self.current_user.lock().unwrap().is_none()
            && self.session.lock().unwrap().record().user_id.is_none()
        {
            return;
        }
        let previous = {
            let mut session = self.session.lock().unwrap();
            let prior = session.record().user_id.clone();
            match &user {
                Some(u) => session.update(|r| {
                    r.user_token = Some(u.access_token.clone());
                    r.user_id = Some(u.id.as_str().to_string());
                    r.last_user_id = Some(u.id.as_str().to_string());
                }),
                None => session.clear_user(),
            }
            prior
        };
        *self.current_user.lock().unwrap() = user.clone();

        let user_id = user.map(|u| u.id);
        info!(
            user = user_id.as_ref().map(UserId::as_str),
            previous = previous.as_deref(),
            "user changed"
        );
        self.emit(ClientEvent::UserChanged {
            user: user_id,
            previous: previous.map(UserId::new),
        });
        self.refresh_auth_level();
    }

    /// The signed-in user, restoring the persisted identity on first
    /// access. With no persisted identity this triggers the login-required
    /// flow and returns `None`.
    pub(crate) async fn current_user(&self) -> Option<AuthenticatedUser> {
        if let Some(user) = self.current_user.lock().unwrap().clone() {
            return Some(user);
        }

        let restored = {
            let session = self.session.lock().unwrap();
            let record = session.record();
            match (&record.user_id, &record.user_token) {
                (Some(id), Some(token)) => Some(AuthenticatedUser::new(
                    UserId::new(id.clone()),
                    token.clone(),
                )),
                _ => None,
            }
        };

        match restored {
            Some(user) => {
                info!(user = user.id.as_str(), "restored persisted user");
                *self.current_user.lock().unwrap() = Some(user.clone());
                self.emit(ClientEvent::UserChanged {
                    user: Some(user.id.clone()),
                    previous: None,
                });
                Some(user)
            }
            None => {
                self.on_authorization_failure(None).await;
                None
            }
        }
    }

    /// The authorization failure recovery flow.
    ///
    /// `fault` is the classified unauthorized fault, or `None` when an
    /// operation needed a signed-in user and none exists. At most one flow
    /// runs at a time: a trigger arriving while the state is not `Idle` is
    /// dropped, which also stops a login prompt's own activity from
    /// re-triggering the flow it belongs to.
    pub(crate) async fn on_authorization_failure(
        &self,
        fault: Option<&ServiceFault>,
    ) {
        let action = RecoveryAction::for_fault(fault);
        if action == RecoveryAction::Ignore {
            return;
        }
        {
            let mut recovery = self.recovery.lock().unwrap();
            if *recovery != RecoveryState::Idle {
                return;
            }
            *recovery = RecoveryState::ClearingCredentials;
        }

        match action {
            RecoveryAction::ClearDevice => {
                warn!("device credentials rejected; cleared for re-registration");
                {
                    let mut session = self.session.lock().unwrap();
                    session.clear_device();
                }
                self.refresh_auth_level();
                *self.recovery.lock().unwrap() = RecoveryState::Idle;
            }
            RecoveryAction::ClearAllAndLogin => {
                warn!("operation requires a signed-in user; clearing credentials");
                self.install_user(None);
                {
                    let mut session = self.session.lock().unwrap();
                    session.clear();
                }
                self.refresh_auth_level();
                self.prompt_login();
            }
            RecoveryAction::RequestLogin => {
                self.prompt_login();
            }
            // Filtered by the early return above.
            RecoveryAction::Ignore => {}
        }
    }

    /// Dispatches the login-required notification. The state machine sits
    /// in `AwaitingLogin` until the prompt has actually run on the
    /// callback context.
    fn prompt_login(&self) {
        *self.recovery.lock().unwrap() = RecoveryState::AwaitingLogin;
        info!("login required");

        let reset = IdleOnDrop(Arc::clone(&self.recovery));
        let subscribers = self.subscribers.snapshot();
        self.dispatcher.dispatch(Box::new(move || {
            for handler in &subscribers {
                handler(&ClientEvent::LoginRequired);
            }
            drop(reset);
        }));
    }
}
