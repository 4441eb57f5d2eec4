//! Core value types shared across the Tether stack.
//!
//! These are small, copyable (or cheaply clonable) types that appear in
//! public signatures everywhere: which HTTP-style verb to use, who the
//! current user is, how authenticated the session is, and whether the
//! device currently has a network path to the service.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Verb
// ---------------------------------------------------------------------------

/// The HTTP-style verb for a remote call.
///
/// The pipeline never builds requests itself; it hands the verb to the
/// [`RemoteService`](../tether-platform) collaborator together with a path
/// and parameters. An enum (rather than a raw string) keeps typos out of
/// call sites and lets the transport `match` exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    /// The canonical wire spelling, e.g. `"GET"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// A unique identifier for an end user, as issued by the backend.
///
/// This is a "newtype wrapper" around `String`: you can't accidentally pass
/// an app id where a user id is expected, even though both are strings
/// underneath. `#[serde(transparent)]` keeps the JSON representation a plain
/// string rather than `{ "0": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// AuthLevel
// ---------------------------------------------------------------------------

/// How authenticated the session currently is.
///
/// This is a pure function of token presence, never stored independently:
/// a user token means [`User`](Self::User), else a device token means
/// [`Device`](Self::Device), else [`None`](Self::None). The ordering derive
/// makes `level >= AuthLevel::Device` read the way the invariant is stated:
/// a present user token always implies at least device-level auth.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub enum AuthLevel {
    /// No credentials at all. Every call will trigger device registration.
    #[default]
    None,
    /// An anonymous installation: a device token, but no signed-in user.
    Device,
    /// A signed-in end user.
    User,
}

impl fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Device => write!(f, "Device"),
            Self::User => write!(f, "User"),
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectivityLevel
// ---------------------------------------------------------------------------

/// The device's last known network path to the service.
///
/// `None` means offline. The distinction between carrier and WiFi comes
/// from the platform descriptor; the session core only ever branches on
/// [`is_online`](Self::is_online).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectivityLevel {
    /// No connectivity. Triggers the offline probe loop.
    #[default]
    None,
    /// Cellular data connection.
    Carrier,
    /// WiFi connection.
    WiFi,
}

impl ConnectivityLevel {
    /// `true` for any level other than [`None`](Self::None).
    pub fn is_online(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for ConnectivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Carrier => write!(f, "Carrier"),
            Self::WiFi => write!(f, "WiFi"),
        }
    }
}

// ---------------------------------------------------------------------------
// GeoLocation
// ---------------------------------------------------------------------------

/// A latitude/longitude pair.
///
/// The client remembers the last location it was given and merges it into
/// outgoing call parameters (unless the caller already supplied one). On
/// the wire it travels as the `"lat,lng"` string produced by `Display`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_as_str_matches_wire_spelling() {
        assert_eq!(Verb::Get.as_str(), "GET");
        assert_eq!(Verb::Post.as_str(), "POST");
        assert_eq!(Verb::Put.as_str(), "PUT");
        assert_eq!(Verb::Patch.as_str(), "PATCH");
        assert_eq!(Verb::Delete.as_str(), "DELETE");
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        // `#[serde(transparent)]` means UserId("u1") → `"u1"`.
        let json = serde_json::to_string(&UserId::new("u1")).unwrap();
        assert_eq!(json, "\"u1\"");
    }

    #[test]
    fn test_user_id_deserializes_from_plain_string() {
        let id: UserId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id, UserId::new("abc"));
    }

    #[test]
    fn test_auth_level_ordering_reflects_privilege() {
        // User > Device > None; the invariant "a user token implies at
        // least device level" relies on this ordering.
        assert!(AuthLevel::User > AuthLevel::Device);
        assert!(AuthLevel::Device > AuthLevel::None);
        assert_eq!(AuthLevel::default(), AuthLevel::None);
    }

    #[test]
    fn test_connectivity_is_online() {
        assert!(!ConnectivityLevel::None.is_online());
        assert!(ConnectivityLevel::Carrier.is_online());
        assert!(ConnectivityLevel::WiFi.is_online());
    }

    #[test]
    fn test_geo_location_display_is_comma_separated() {
        let loc = GeoLocation::new(47.61, -122.33);
        assert_eq!(loc.to_string(), "47.61,-122.33");
    }
}
