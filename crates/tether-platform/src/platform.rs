//! The platform descriptor: what the host device tells the service.

use tether_protocol::ConnectivityLevel;

/// Supplies device and application facts the session core cannot know
/// itself.
///
/// Everything here is read-only from the core's point of view. The push
/// token is async because some platforms hand it out through a callback
/// that may not have fired yet.
pub trait Platform: Send + Sync + 'static {
    /// The platform-level application identifier (bundle id, package name).
    fn application_id(&self) -> String;

    /// Platform name as the registration endpoint expects it.
    fn platform_name(&self) -> String;

    /// A stable unique id for this installation.
    fn unique_id(&self) -> String;

    /// Device model string.
    fn model(&self) -> String;

    /// OS version string.
    fn os_version(&self) -> String;

    /// Application version, when the platform can determine one.
    fn app_version(&self) -> Option<String>;

    /// The current push notification token, when available.
    async fn push_token(&self) -> Option<String>;

    /// The connectivity level the platform currently observes.
    fn connectivity(&self) -> ConnectivityLevel;

    /// A service-root override from platform configuration, when present.
    /// Takes effect only if the persisted session record has none.
    fn config_service_root(&self) -> Option<String>;
}

/// A fixed-value [`Platform`] for tests, tools, and headless embeddings.
#[derive(Debug, Clone)]
pub struct StaticPlatform {
    pub application_id: String,
    pub platform_name: String,
    pub unique_id: String,
    pub model: String,
    pub os_version: String,
    pub app_version: Option<String>,
    pub push_token: Option<String>,
    pub connectivity: ConnectivityLevel,
    pub config_service_root: Option<String>,
}

impl Default for StaticPlatform {
    fn default() -> Self {
        Self {
            application_id: "com.example.app".to_string(),
            platform_name: "test".to_string(),
            unique_id: "unique-0".to_string(),
            model: "model-0".to_string(),
            os_version: "0.0".to_string(),
            app_version: None,
            push_token: None,
            connectivity: ConnectivityLevel::WiFi,
            config_service_root: None,
        }
    }
}

impl Platform for StaticPlatform {
    fn application_id(&self) -> String {
        self.application_id.clone()
    }

    fn platform_name(&self) -> String {
        self.platform_name.clone()
    }

    fn unique_id(&self) -> String {
        self.unique_id.clone()
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn os_version(&self) -> String {
        self.os_version.clone()
    }

    fn app_version(&self) -> Option<String> {
        self.app_version.clone()
    }

    async fn push_token(&self) -> Option<String> {
        self.push_token.clone()
    }

    fn connectivity(&self) -> ConnectivityLevel {
        self.connectivity
    }

    fn config_service_root(&self) -> Option<String> {
        self.config_service_root.clone()
    }
}
