//! The device registration endpoint contract.
//!
//! Registration is how an installation without any credentials obtains its
//! first (device) token: a POST of the device descriptor to `/devices`.
//! The response may also reassign the service root, redirecting all
//! subsequent calls to a different base address.

use serde::{Deserialize, Serialize};

/// The device descriptor posted to the registration endpoint.
///
/// Field names serialize in camelCase to match the wire contract, e.g.
/// `unique_id` → `"uniqueId"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistration {
    /// The application id.
    pub app_id: String,
    /// The application secret key.
    pub app_key: String,
    /// The platform-level application identifier (bundle id, package name).
    pub application_id: String,
    /// Platform name, e.g. `"ios"` or `"android"`.
    pub platform: String,
    /// A stable unique id for this installation.
    pub unique_id: String,
    /// Device model.
    pub model: String,
    /// OS version string.
    pub os_version: String,
    /// Push notification token, when the platform has one.
    pub push_token: Option<String>,
    /// Application version string.
    pub app_version: Option<String>,
}

/// What the registration endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredDevice {
    /// The device bearer token for this installation.
    pub access_token: String,
    /// A replacement service root, when the backend reassigns one.
    #[serde(default)]
    pub service_root: Option<String>,
}
