//! Account operations: users, passwords, devices, crash reports.
//!
//! These are the service endpoints the session manager itself owns:
//! everything whose response feeds back into session state. Per-resource
//! CRUD beyond this lives in the embedding application, built on the
//! generic verb methods.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use serde_json::Value;
use tether_platform::{Dispatcher, Platform};
use tether_protocol::{
    CallResult, ClientError, ParamMap, UserId, Verb,
};
use tether_session::{AuthenticatedUser, UserProfile};

use crate::client::{required, ClientInner};
use crate::convert;
use crate::pipeline::CallOptions;
use crate::{Client, Connector};

/// What the login and registration endpoints return.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    id: UserId,
    access_token: String,
    #[serde(flatten)]
    profile: UserProfile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogoutResponse {
    /// A replacement device token; logging out invalidates the user token
    /// and may rotate the device's.
    #[serde(default)]
    access_token: Option<String>,
}

/// Parameters for [`Client::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Birth date as unix epoch seconds; must not be in the future.
    pub date_of_birth: Option<u64>,
}

impl NewUser {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            email: None,
            first_name: None,
            last_name: None,
            date_of_birth: None,
        }
    }
}

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl<C: Connector, D: Dispatcher, P: Platform> ClientInner<C, D, P> {
    /// Shared login path: call, convert the response into an
    /// [`AuthenticatedUser`], and install it through the completion hook
    /// so the session reflects the login before the caller sees the
    /// result.
    async fn login_core(
        &self,
        verb: Verb,
        path: &str,
        parameters: ParamMap,
        options: CallOptions,
    ) -> Result<CallResult<AuthenticatedUser>, ClientError> {
        let result: CallResult<LoginResponse> = self
            .call_service(verb, path, Some(parameters), options)
            .await?;

        let weak = self.weak.clone();
        let converted = convert::convert_with(
            &self.dispatcher,
            result,
            |response| {
                let mut user = AuthenticatedUser::new(
                    response.id.clone(),
                    response.access_token.clone(),
                );
                user.profile = Some(response.profile.clone());
                user
            },
            move |_original, converted| {
                if let (Some(inner), Some(user)) =
                    (weak.upgrade(), converted.value())
                {
                    inner.install_user(Some(user.clone()));
                }
            },
        )
        .await;

        Ok(converted)
    }
}

impl<C: Connector, D: Dispatcher, P: Platform> Client<C, D, P> {
    /// The signed-in user, restored from the persisted session on first
    /// access. Returns `None`, after requesting login, when no identity
    /// exists.
    pub async fn current_user(&self) -> Option<AuthenticatedUser> {
        self.inner.current_user().await
    }

    /// `GET /service/ping`.
    pub async fn ping(
        &self,
        options: CallOptions,
    ) -> Result<CallResult<Value>, ClientError> {
        self.get("/service/ping", None, options).await
    }

    /// Creates an account and signs it in.
    pub async fn create_user(
        &self,
        new_user: NewUser,
        options: CallOptions,
    ) -> Result<CallResult<AuthenticatedUser>, ClientError> {
        let username = required("username", &new_user.username)?;
        let password = required("password", &new_user.password)?;
        if let Some(born) = new_user.date_of_birth {
            if born > epoch_now() {
                return Err(ClientError::InvalidArgument {
                    name: "date_of_birth",
                    reason: "must not be in the future".to_string(),
                });
            }
        }

        let mut parameters = ParamMap::new();
        parameters.insert("username".to_string(), username.into());
        parameters.insert("password".to_string(), password.into());
        if let Some(email) = new_user.email {
            parameters.insert("email".to_string(), email.into());
        }
        if let Some(first_name) = new_user.first_name {
            parameters.insert("firstName".to_string(), first_name.into());
        }
        if let Some(last_name) = new_user.last_name {
            parameters.insert("lastName".to_string(), last_name.into());
        }
        if let Some(born) = new_user.date_of_birth {
            parameters.insert("dateOfBirth".to_string(), born.into());
        }

        self.inner
            .login_core(Verb::Post, "/users", parameters, options)
            .await
    }

    /// Signs in with a username and password.
    pub async fn login_user(
        &self,
        username: &str,
        password: &str,
        options: CallOptions,
    ) -> Result<CallResult<AuthenticatedUser>, ClientError> {
        let username = required("username", username)?;
        let password = required("password", password)?;

        let mut parameters = ParamMap::new();
        parameters.insert("username".to_string(), username.into());
        parameters.insert("password".to_string(), password.into());

        self.inner
            .login_core(Verb::Post, "/users/login", parameters, options)
            .await
    }

    /// Signs in through a third-party identity provider.
    pub async fn social_login_user(
        &self,
        provider: &str,
        provider_id: &str,
        access_token: &str,
        options: CallOptions,
    ) -> Result<CallResult<AuthenticatedUser>, ClientError> {
        let provider = required("provider", provider)?;
        let provider_id = required("provider_id", provider_id)?;
        let access_token = required("access_token", access_token)?;

        let mut parameters = ParamMap::new();
        parameters
            .insert("identityProviderName".to_string(), provider.into());
        parameters.insert("identityID".to_string(), provider_id.into());
        parameters
            .insert("identityAccessToken".to_string(), access_token.into());

        self.inner
            .login_core(
                Verb::Post,
                "/users/login/social",
                parameters,
                options,
            )
            .await
    }

    /// Signs the current user out.
    ///
    /// On success the user identity is cleared; a replacement device
    /// token returned by the service is installed so the session stays at
    /// device level without re-registering.
    pub async fn logout_user(
        &self,
        options: CallOptions,
    ) -> Result<CallResult<()>, ClientError> {
        let result: CallResult<LogoutResponse> = self
            .inner
            .call_service(Verb::Post, "/users/me/logout", None, options)
            .await?;

        let weak = self.inner.weak.clone();
        let result = convert::complete(
            &self.inner.dispatcher,
            result,
            move |result| {
                let (Some(inner), CallResult::Success { value, .. }) =
                    (weak.upgrade(), result)
                else {
                    return;
                };
                inner.install_user(None);
                if let Some(token) = value.access_token.clone() {
                    {
                        let mut session = inner.session.lock().unwrap();
                        session.update(|r| r.device_token = Some(token));
                    }
                    inner.refresh_auth_level();
                }
            },
        )
        .await;

        Ok(result.map(|_| ()))
    }

    /// Asks the service to email a password reset code.
    pub async fn request_password_reset(
        &self,
        username: &str,
        options: CallOptions,
    ) -> Result<CallResult<bool>, ClientError> {
        let username = required("username", username)?;
        let mut parameters = ParamMap::new();
        parameters.insert("userName".to_string(), username.into());

        let result: CallResult<Value> = self
            .inner
            .call_service(
                Verb::Post,
                "/users/password",
                Some(parameters),
                options,
            )
            .await?;
        Ok(result.map(|_| true))
    }

    /// Completes a password reset with the emailed code.
    pub async fn reset_password(
        &self,
        username: &str,
        reset_code: &str,
        new_password: &str,
        options: CallOptions,
    ) -> Result<CallResult<bool>, ClientError> {
        let username = required("username", username)?;
        let reset_code = required("reset_code", reset_code)?;
        let new_password = required("new_password", new_password)?;

        let mut parameters = ParamMap::new();
        parameters.insert("userName".to_string(), username.into());
        parameters.insert("resetCode".to_string(), reset_code.into());
        parameters.insert("newPassword".to_string(), new_password.into());

        let result: CallResult<Value> = self
            .inner
            .call_service(
                Verb::Patch,
                "/users/password",
                Some(parameters),
                options,
            )
            .await?;
        Ok(result.map(|_| true))
    }

    /// Updates the registered device. Returns `false` without a network
    /// call when there is nothing to send.
    pub async fn update_device(
        &self,
        push_token: Option<&str>,
        is_production: Option<bool>,
        options: CallOptions,
    ) -> Result<CallResult<bool>, ClientError> {
        if push_token.is_none() && is_production.is_none() {
            return Ok(CallResult::success(false, None));
        }

        let mut parameters = ParamMap::new();
        if let Some(token) = push_token {
            parameters.insert("pushToken".to_string(), token.into());
        }
        if let Some(production) = is_production {
            parameters.insert("isProduction".to_string(), production.into());
        }

        let result: CallResult<Value> = self
            .inner
            .call_service(
                Verb::Patch,
                "/devices/current",
                Some(parameters),
                options,
            )
            .await?;
        Ok(result.map(|_| true))
    }

    /// Persists the push token and, when the device is registered, pushes
    /// it to the backend. Returns `false` when only persisted locally;
    /// the token still travels with the next registration.
    pub async fn set_push_token(
        &self,
        push_token: &str,
        options: CallOptions,
    ) -> Result<CallResult<bool>, ClientError> {
        let push_token = required("push_token", push_token)?;

        let registered = {
            let mut session = self.inner.session.lock().unwrap();
            session
                .update(|r| r.device_push_token = Some(push_token.clone()));
            session.record().device_token.is_some()
        };
        if !registered {
            return Ok(CallResult::success(false, None));
        }
        self.update_device(Some(&push_token), None, options).await
    }

    /// Reports a crash. Never raises: a crash reporter must not be a
    /// second source of failures.
    pub async fn add_crash_report(
        &self,
        stack_trace: &str,
        message: Option<&str>,
    ) -> CallResult<()> {
        let mut parameters = ParamMap::new();
        parameters.insert(
            "stackTrace".to_string(),
            Value::String(stack_trace.to_string()),
        );
        if let Some(message) = message {
            parameters.insert("message".to_string(), message.into());
        }

        let (result, _decision) = self
            .inner
            .execute::<Value>(
                Verb::Post,
                "/devices/current/crashreports",
                Some(parameters),
            )
            .await;
        result.map(|_| ())
    }
}
