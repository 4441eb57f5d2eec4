//! The persisted session record.

use serde::{Deserialize, Serialize};
use tether_protocol::AuthLevel;

/// Everything the session persists, one record per application id.
///
/// Serialized field names are part of the storage contract (existing
/// installations carry records written with these exact names), so each
/// field pins its name explicitly rather than relying on a rename rule.
///
/// Expiry timestamps are unix epoch seconds. The record never *enforces*
/// expiry (the service rejects a stale token with `AuthAccessTokenInvalid`
/// and recovery takes it from there), but the values are kept so an
/// embedding application can inspect them.
///
/// `#[serde(default)]` on the struct means a record written by an older
/// version (missing fields) still loads; missing fields become `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    /// The application id this record belongs to.
    #[serde(rename = "AppID")]
    pub app_id: Option<String>,

    /// The application secret key.
    #[serde(rename = "AppKey")]
    pub app_key: Option<String>,

    /// Service-root override assigned by the backend, when any.
    #[serde(rename = "ServiceUrl")]
    pub service_url: Option<String>,

    /// Bearer token for this anonymous installation.
    #[serde(rename = "DeviceToken")]
    pub device_token: Option<String>,

    /// When the device token expires (epoch seconds).
    #[serde(rename = "DeviceTokenExpires")]
    pub device_token_expires: Option<u64>,

    /// Bearer token for the signed-in user, when any.
    #[serde(rename = "UserToken")]
    pub user_token: Option<String>,

    /// When the user token expires (epoch seconds).
    #[serde(rename = "UserTokenExpires")]
    pub user_token_expires: Option<u64>,

    /// Id of the signed-in user, when any.
    #[serde(rename = "UserID")]
    pub user_id: Option<String>,

    /// Id of the most recent signed-in user, kept across logout so a user
    /// switch can report who was replaced.
    #[serde(rename = "LastUserID")]
    pub last_user_id: Option<String>,

    /// The device's push notification token, when any.
    #[serde(rename = "DevicePushToken")]
    pub device_push_token: Option<String>,

    /// Application version recorded at registration time.
    #[serde(rename = "AppVersion")]
    pub app_version: Option<String>,
}

impl SessionRecord {
    /// The authentication level implied by the tokens currently present.
    ///
    /// A pure function of token presence: user token → `User`, else device
    /// token → `Device`, else `None`. Call sites recompute this after every
    /// token mutation and compare against the previous value before
    /// emitting a level-changed event.
    pub fn auth_level(&self) -> AuthLevel {
        if self.user_token.is_some() {
            AuthLevel::User
        } else if self.device_token.is_some() {
            AuthLevel::Device
        } else {
            AuthLevel::None
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
