//! The persisted key/value capability.
//!
//! The platform supplies durable storage (user defaults, shared
//! preferences, a file); the session layer only needs string-in/string-out
//! keyed by application id. Storage is deliberately infallible at this
//! seam: an implementation that can fail should log and degrade, because
//! losing a cached token is recoverable (the client re-registers) while a
//! failing save must never break a call path.

use std::collections::HashMap;
use std::sync::Mutex;

/// Durable string storage keyed by application id.
pub trait SessionStore: Send + Sync + 'static {
    /// The stored contents for `app_id`, when any.
    fn load(&self, app_id: &str) -> Option<String>;

    /// Stores `contents` under `app_id`, replacing any previous value.
    fn save(&self, app_id: &str, contents: &str);

    /// Removes the stored value for `app_id`.
    fn remove(&self, app_id: &str);
}

/// An in-process [`SessionStore`].
///
/// The default for tests and for embeddings that don't want persistence
/// across restarts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, app_id: &str) -> Option<String> {
        self.entries.lock().unwrap().get(app_id).cloned()
    }

    fn save(&self, app_id: &str, contents: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(app_id.to_string(), contents.to_string());
    }

    fn remove(&self, app_id: &str) {
        self.entries.lock().unwrap().remove(app_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load("app").is_none());

        store.save("app", "{\"AppID\":\"app\"}");
        assert_eq!(
            store.load("app").as_deref(),
            Some("{\"AppID\":\"app\"}")
        );
    }

    #[test]
    fn test_memory_store_save_replaces() {
        let store = MemoryStore::new();
        store.save("app", "one");
        store.save("app", "two");
        assert_eq!(store.load("app").as_deref(), Some("two"));
    }

    #[test]
    fn test_memory_store_remove() {
        let store = MemoryStore::new();
        store.save("app", "one");
        store.remove("app");
        assert!(store.load("app").is_none());
    }

    #[test]
    fn test_memory_store_keys_are_independent() {
        let store = MemoryStore::new();
        store.save("a", "one");
        store.save("b", "two");
        store.remove("a");
        assert_eq!(store.load("b").as_deref(), Some("two"));
    }
}
