//! Token acquisition and device registration.
//!
//! Every authenticated call asks the token provider for a bearer token:
//! the user token when a user is signed in, else the device token, else a
//! fresh device registration. Registration is the one place credentials
//! are created from nothing, so it is single-flight: a concurrent burst of
//! token requests issues exactly one `POST /devices`, and every waiter
//! receives the token it produced.

use serde_json::Value;
use tether_platform::{Dispatcher, Platform, RemoteService};
use tether_protocol::{
    DeviceRegistration, ParamMap, RegisteredDevice, ServiceFault, Verb,
};
use tracing::{debug, info, warn};

use crate::client::ClientInner;
use crate::pipeline::decode_fault;
use crate::Connector;

impl<C: Connector, D: Dispatcher, P: Platform> ClientInner<C, D, P> {
    /// The bearer token for the next call: user token, else device token,
    /// else the result of registering this device.
    ///
    /// Callers that lose the registration race wait on the in-flight
    /// registration and receive its token; the re-check after acquiring
    /// the lock is what turns the lock into single-flight.
    pub(crate) async fn access_token(&self) -> Result<String, ServiceFault> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let _guard = self.registration.lock().await;
        if let Some(token) = self.cached_token() {
            // Another caller registered while we waited.
            return Ok(token);
        }
        self.register_device().await
    }

    fn cached_token(&self) -> Option<String> {
        let session = self.session.lock().unwrap();
        let record = session.record();
        record
            .user_token
            .clone()
            .or_else(|| record.device_token.clone())
    }

    /// Registers this installation: `POST /devices` with the device
    /// descriptor, carrying no bearer token.
    ///
    /// On success the device token (and any reassigned service root) is
    /// persisted and applied to the live transport. On failure every
    /// credential is cleared. This is safe because registration only runs when
    /// no token exists.
    ///
    /// Must be called with the registration lock held.
    async fn register_device(&self) -> Result<String, ServiceFault> {
        let service = self.service().await;
        let registration = self.device_registration().await;
        debug!(
            unique_id = %registration.unique_id,
            platform = %registration.platform,
            "registering device"
        );

        let params = match serde_json::to_value(&registration) {
            Ok(Value::Object(map)) => map,
            _ => ParamMap::new(),
        };
        let outcome = service
            .call(Verb::Post, "/devices", None, Some(&params))
            .await;

        if let Some(fault) = ServiceFault::classify(&outcome) {
            warn!(
                error = %fault.error,
                status = fault.status,
                "device registration failed; clearing credentials"
            );
            {
                let mut session = self.session.lock().unwrap();
                session.clear();
            }
            self.refresh_auth_level();
            return Err(fault);
        }

        let value = outcome.value.unwrap_or(Value::Null);
        let device: RegisteredDevice = serde_json::from_value(value)
            .map_err(|e| decode_fault(outcome.status, &e))?;

        if let Some(root) = device.service_root.as_deref() {
            info!(root, "service root reassigned by registration");
            service.set_root(root);
        }
        {
            let mut session = self.session.lock().unwrap();
            session.update(|r| {
                r.device_token = Some(device.access_token.clone());
                if device.service_root.is_some() {
                    r.service_url = device.service_root.clone();
                }
            });
        }
        self.refresh_auth_level();
        info!("device registered");

        Ok(device.access_token)
    }

    /// Builds the registration descriptor from the session record and the
    /// platform. A push token already persisted in the record wins over
    /// asking the platform again.
    async fn device_registration(&self) -> DeviceRegistration {
        let (app_id, app_key, push_token, app_version) = {
            let session = self.session.lock().unwrap();
            let record = session.record();
            (
                record.app_id.clone().unwrap_or_default(),
                record.app_key.clone().unwrap_or_default(),
                record.device_push_token.clone(),
                record.app_version.clone(),
            )
        };
        let push_token = match push_token {
            Some(token) => Some(token),
            None => self.platform.push_token().await,
        };

        DeviceRegistration {
            app_id,
            app_key,
            application_id: self.platform.application_id(),
            platform: self.platform.platform_name(),
            unique_id: self.platform.unique_id(),
            model: self.platform.model(),
            os_version: self.platform.os_version(),
            push_token,
            app_version: app_version.or_else(|| self.platform.app_version()),
        }
    }
}
