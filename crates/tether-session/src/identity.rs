//! The signed-in user's identity.

use serde::Deserialize;
use tether_protocol::UserId;

/// Profile fields for a user, fetched lazily from the service.
///
/// Everything here is optional: the login and registration responses only
/// guarantee an id and a token, and the profile is filled in by a later
/// fetch when something actually needs it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// An authenticated end user: id, bearer token, and (lazily) a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    /// The user's id as issued by the backend.
    pub id: UserId,
    /// The user bearer token for this session.
    pub access_token: String,
    /// Profile fields, present only after a fetch has populated them.
    pub profile: Option<UserProfile>,
}

impl AuthenticatedUser {
    /// A freshly authenticated user: id and token, profile not yet
    /// fetched.
    pub fn new(id: UserId, access_token: impl Into<String>) -> Self {
        Self {
            id,
            access_token: access_token.into(),
            profile: None,
        }
    }

    /// `true` once the profile has been fetched.
    pub fn is_populated(&self) -> bool {
        self.profile.is_some()
    }
}
