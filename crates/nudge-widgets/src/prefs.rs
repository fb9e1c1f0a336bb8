// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default preferences storage and the session identity wrapper.
//!
//! [`JsonFileStore`] keeps all SDK preferences in a single JSON object on
//! disk, the durable backing for the widget queue and the session id.
//! Host applications with their own storage supply a custom
//! [`PreferencesStore`] instead.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use nudge_core::{NudgeError, PreferencesStore, UserIdentity};
use serde_json::{Map, Value};
use tracing::warn;

/// Store key holding the backend session id.
const SESSION_KEY: &str = "session_id";
/// Store key holding the contact identity snapshot.
const USER_KEY: &str = "user_identity";

fn storage_error(source: impl std::error::Error + Send + Sync + 'static) -> NudgeError {
    NudgeError::Storage {
        source: Box::new(source),
    }
}

/// A [`PreferencesStore`] backed by one JSON file.
///
/// Every operation reads and rewrites the full object under an internal
/// lock. The stored values are small (a session id and a short id list),
/// so contention and file size are not a concern.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Creates a store at the platform data directory
    /// (`<data_dir>/nudge/prefs.json`).
    pub fn at_default_location() -> Result<Self, NudgeError> {
        let base = dirs::data_dir()
            .ok_or_else(|| NudgeError::Config("no platform data directory available".into()))?;
        Ok(Self::new(base.join("nudge").join("prefs.json")))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, NudgeError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(storage_error(e)),
        };
        serde_json::from_str(&contents).map_err(storage_error)
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), NudgeError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(storage_error)?;
        }
        let contents = serde_json::to_string_pretty(&Value::Object(map.clone()))
            .map_err(storage_error)?;
        fs::write(&self.path, contents).map_err(storage_error)
    }
}

impl PreferencesStore for JsonFileStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, NudgeError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let map = self.read_map()?;
        Ok(map.get(key).and_then(Value::as_str).map(String::from))
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), NudgeError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_map(&map)
    }

    fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>, NudgeError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let map = self.read_map()?;
        Ok(map.get(key).and_then(Value::as_array).map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        }))
    }

    fn set_string_list(&self, key: &str, value: &[String]) -> Result<(), NudgeError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut map = self.read_map()?;
        map.insert(
            key.to_string(),
            Value::Array(value.iter().cloned().map(Value::String).collect()),
        );
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), NudgeError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), NudgeError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(e)),
        }
    }
}

fn poisoned() -> NudgeError {
    NudgeError::Internal("preferences lock poisoned".into())
}

/// Read/write access to the persisted backend session id.
///
/// Failures are logged and degrade to "no session": the backend mints a
/// fresh session id on the next widgets request.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn PreferencesStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn PreferencesStore>) -> Self {
        Self { store }
    }

    pub fn session(&self) -> Option<String> {
        match self.store.get_string(SESSION_KEY) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "failed to read session id");
                None
            }
        }
    }

    pub fn set_session(&self, session_id: &str) {
        if let Err(e) = self.store.set_string(SESSION_KEY, session_id) {
            warn!(error = %e, "failed to persist session id");
        }
    }

    /// The persisted contact identity, empty when unset or unreadable.
    pub fn user(&self) -> UserIdentity {
        let json = match self.store.get_string(USER_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return UserIdentity::default(),
            Err(e) => {
                warn!(error = %e, "failed to read contact identity");
                return UserIdentity::default();
            }
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            warn!(error = %e, "discarding undecodable contact identity");
            UserIdentity::default()
        })
    }

    pub fn set_user(&self, user: &UserIdentity) {
        let json = match serde_json::to_string(user) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to encode contact identity");
                return;
            }
        };
        if let Err(e) = self.store.set_string(USER_KEY, &json) {
            warn!(error = %e, "failed to persist contact identity");
        }
    }

    pub fn clear_user(&self) {
        if let Err(e) = self.store.remove(USER_KEY) {
            warn!(error = %e, "failed to clear contact identity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("prefs.json"))
    }

    #[test]
    fn string_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_string("session_id", "sess-1").unwrap();

        // A new instance over the same path sees the persisted value.
        let reopened = store_in(&dir);
        assert_eq!(
            reopened.get_string("session_id").unwrap().as_deref(),
            Some("sess-1")
        );
    }

    #[test]
    fn list_roundtrip_and_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.get_string_list("widget_queue").unwrap().is_none());

        store
            .set_string_list("widget_queue", &["w2".into(), "w1".into()])
            .unwrap();
        assert_eq!(
            store.get_string_list("widget_queue").unwrap(),
            Some(vec!["w2".to_string(), "w1".to_string()])
        );
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.get_string("anything").unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(
            store.get_string("k"),
            Err(NudgeError::Storage { .. })
        ));
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_string("k", "v").unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        // Clearing again is a no-op.
        store.clear().unwrap();
    }

    #[test]
    fn remove_only_touches_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_string("a", "1").unwrap();
        store.set_string("b", "2").unwrap();
        store.remove("a").unwrap();
        assert!(store.get_string("a").unwrap().is_none());
        assert_eq!(store.get_string("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn user_identity_roundtrip_and_clear() {
        let store = Arc::new(nudge_test_utils::MemoryStore::new());
        let sessions = SessionStore::new(store.clone());
        assert!(sessions.user().is_empty());

        let identity = UserIdentity {
            contact_id: Some("c-7".into()),
            email_address: Some("a@example.com".into()),
            phone_number: None,
        };
        sessions.set_user(&identity);
        assert_eq!(sessions.user(), identity);

        sessions.clear_user();
        assert!(sessions.user().is_empty());
    }

    #[test]
    fn undecodable_user_identity_degrades_to_empty() {
        let store = Arc::new(nudge_test_utils::MemoryStore::new());
        store.set_string("user_identity", "not json").unwrap();
        let sessions = SessionStore::new(store);
        assert!(sessions.user().is_empty());
    }

    #[test]
    fn session_store_degrades_on_failure() {
        let failing = Arc::new(nudge_test_utils::MemoryStore::new());
        let sessions = SessionStore::new(failing.clone());

        sessions.set_session("sess-1");
        assert_eq!(sessions.session().as_deref(), Some("sess-1"));

        failing.fail_all();
        assert!(sessions.session().is_none());
        sessions.set_session("sess-2");

        failing.recover();
        assert_eq!(sessions.session().as_deref(), Some("sess-1"));
    }
}
