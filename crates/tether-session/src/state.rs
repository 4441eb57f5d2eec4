//! Load/mutate/persist discipline for the session record.

use std::sync::Arc;

use tether_protocol::AuthLevel;

use crate::{SessionRecord, SessionStore};

/// The live session record plus the store that persists it.
///
/// `SessionState` is NOT thread-safe by itself; it is plain data behind
/// whatever lock the client chooses (a `std::sync::Mutex`, since nothing
/// here ever awaits). Keeping it synchronous means a mutate-then-persist
/// sequence is one uninterruptible critical section under that lock.
///
/// Every method that mutates the record persists before returning; there
/// is no "dirty" state a crash could lose.
pub struct SessionState {
    record: SessionRecord,
    store: Arc<dyn SessionStore>,
}

impl SessionState {
    /// Loads the record for `app_id`, or starts from a zeroed default.
    ///
    /// Any deserialization failure is swallowed: a corrupt record must
    /// never prevent the application from starting, so it is logged and
    /// treated as absent.
    pub fn load(
        store: Arc<dyn SessionStore>,
        app_id: &str,
        app_key: &str,
        app_version: Option<String>,
    ) -> Self {
        let mut record = match store.load(app_id) {
            Some(contents) => {
                serde_json::from_str::<SessionRecord>(&contents)
                    .unwrap_or_else(|e| {
                        tracing::debug!(
                            app_id,
                            error = %e,
                            "stored session record unreadable; starting fresh"
                        );
                        SessionRecord::default()
                    })
            }
            None => SessionRecord::default(),
        };

        // The caller's credentials always win over whatever was stored.
        record.app_id = Some(app_id.to_string());
        record.app_key = Some(app_key.to_string());
        if app_version.is_some() {
            record.app_version = app_version;
        }

        Self { record, store }
    }

    /// Read access to the record.
    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    /// The current authentication level (pure function of the record).
    pub fn auth_level(&self) -> AuthLevel {
        self.record.auth_level()
    }

    /// Persists the current record synchronously.
    pub fn save(&self) {
        let Some(app_id) = self.record.app_id.as_deref() else {
            return;
        };
        match serde_json::to_string(&self.record) {
            Ok(contents) => self.store.save(app_id, &contents),
            Err(e) => {
                tracing::debug!(error = %e, "session record not serializable")
            }
        }
    }

    /// Mutates the record and persists in one step.
    ///
    /// The closure runs under the caller's lock, so composite mutations
    /// (e.g. user token + user id + last-user id) persist atomically with
    /// respect to other call paths.
    pub fn update(&mut self, f: impl FnOnce(&mut SessionRecord)) {
        f(&mut self.record);
        self.save();
    }

    /// Zeroes the user token, user token expiry, and user id; persists.
    pub fn clear_user(&mut self) {
        self.update(|r| {
            r.user_token = None;
            r.user_token_expires = None;
            r.user_id = None;
        });
    }

    /// Zeroes the device token, its expiry, and the service-root override;
    /// persists. The user fields are left alone; this is the recovery arm
    /// for invalid *device* credentials.
    pub fn clear_device(&mut self) {
        self.update(|r| {
            r.device_token = None;
            r.device_token_expires = None;
            r.service_url = None;
        });
    }

    /// Zeroes everything: device fields, service-root override, last-user
    /// id, then the user fields. The stored record is removed first so a
    /// crash mid-clear cannot resurrect stale credentials.
    pub fn clear(&mut self) {
        if let Some(app_id) = self.record.app_id.as_deref() {
            self.store.remove(app_id);
        }
        self.update(|r| {
            r.service_url = None;
            r.device_token = None;
            r.device_token_expires = None;
            r.last_user_id = None;
        });
        self.clear_user();
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn state_with(store: Arc<dyn SessionStore>) -> SessionState {
        SessionState::load(store, "app", "key", Some("1.0".into()))
    }

    #[test]
    fn test_load_without_stored_record_yields_defaults() {
        let state = state_with(Arc::new(MemoryStore::new()));
        assert_eq!(state.record().app_id.as_deref(), Some("app"));
        assert_eq!(state.record().app_key.as_deref(), Some("key"));
        assert!(state.record().device_token.is_none());
        assert_eq!(state.auth_level(), AuthLevel::None);
    }

    #[test]
    fn test_save_then_load_round_trips_every_field() {
        let store = Arc::new(MemoryStore::new());
        let mut state = state_with(Arc::clone(&store) as Arc<dyn SessionStore>);
        state.update(|r| {
            r.service_url = Some("https://eu.example.com/".into());
            r.device_token = Some("dev".into());
            r.device_token_expires = Some(1_700_000_000);
            r.user_token = Some("usr".into());
            r.user_token_expires = Some(1_700_000_100);
            r.user_id = Some("u1".into());
            r.last_user_id = Some("u0".into());
            r.device_push_token = Some("push".into());
        });

        let reloaded = state_with(store);
        assert_eq!(reloaded.record(), state.record());
    }

    #[test]
    fn test_load_swallows_corrupt_record() {
        let store = Arc::new(MemoryStore::new());
        store.save("app", "this is not json {{");

        let state = state_with(store);
        assert!(state.record().device_token.is_none());
        assert_eq!(state.record().app_id.as_deref(), Some("app"));
    }

    #[test]
    fn test_clear_user_zeroes_only_user_fields() {
        let store = Arc::new(MemoryStore::new());
        let mut state = state_with(Arc::clone(&store) as Arc<dyn SessionStore>);
        state.update(|r| {
            r.device_token = Some("dev".into());
            r.user_token = Some("usr".into());
            r.user_token_expires = Some(1);
            r.user_id = Some("u1".into());
            r.last_user_id = Some("u1".into());
        });

        state.clear_user();

        assert!(state.record().user_token.is_none());
        assert!(state.record().user_token_expires.is_none());
        assert!(state.record().user_id.is_none());
        // Device token and last-user id survive a user clear.
        assert_eq!(state.record().device_token.as_deref(), Some("dev"));
        assert_eq!(state.record().last_user_id.as_deref(), Some("u1"));

        // And the cleared state was persisted.
        let reloaded = state_with(store);
        assert!(reloaded.record().user_token.is_none());
    }

    #[test]
    fn test_clear_device_keeps_user_fields() {
        let mut state = state_with(Arc::new(MemoryStore::new()));
        state.update(|r| {
            r.device_token = Some("dev".into());
            r.service_url = Some("https://eu.example.com/".into());
            r.user_token = Some("usr".into());
        });

        state.clear_device();

        assert!(state.record().device_token.is_none());
        assert!(state.record().service_url.is_none());
        assert_eq!(state.record().user_token.as_deref(), Some("usr"));
    }

    #[test]
    fn test_clear_zeroes_everything() {
        let store = Arc::new(MemoryStore::new());
        let mut state = state_with(Arc::clone(&store) as Arc<dyn SessionStore>);
        state.update(|r| {
            r.device_token = Some("dev".into());
            r.service_url = Some("https://eu.example.com/".into());
            r.user_token = Some("usr".into());
            r.user_id = Some("u1".into());
            r.last_user_id = Some("u1".into());
        });

        state.clear();

        assert!(state.record().device_token.is_none());
        assert!(state.record().service_url.is_none());
        assert!(state.record().user_token.is_none());
        assert!(state.record().user_id.is_none());
        assert!(state.record().last_user_id.is_none());
        assert_eq!(state.auth_level(), AuthLevel::None);
    }

    #[test]
    fn test_auth_level_tracks_token_mutations() {
        let mut state = state_with(Arc::new(MemoryStore::new()));
        assert_eq!(state.auth_level(), AuthLevel::None);

        state.update(|r| r.device_token = Some("dev".into()));
        assert_eq!(state.auth_level(), AuthLevel::Device);

        state.update(|r| r.user_token = Some("usr".into()));
        assert_eq!(state.auth_level(), AuthLevel::User);

        state.clear_user();
        assert_eq!(state.auth_level(), AuthLevel::Device);
    }
}
