//! Durable anonymous session identity.
//!
//! The client correlates all requests with one opaque session id, persisted
//! under `~/.walletchat/session`. The id is created once per profile and
//! reused until explicitly cleared; the backend keys its conversational and
//! wallet context off it.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::error::SessionError;

/// Length of the random alphanumeric suffix appended to new session ids.
const SUFFIX_LEN: usize = 8;

/// Storage seam for the session id, so tests can run without a filesystem.
pub trait SessionStore: Send + Sync {
    /// Read the stored id, `None` when absent.
    fn load(&self) -> Result<Option<String>, SessionError>;
    /// Persist the id durably before it is handed out.
    fn persist(&self, id: &str) -> Result<(), SessionError>;
    /// Remove the stored id; the next `get_or_create` synthesizes a new one.
    fn clear(&self) -> Result<(), SessionError>;
}

/// File-backed session store holding the id as a single plain-text line.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let id = raw.trim().to_string();
                Ok((!id.is_empty()).then_some(id))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::ReadFailed {
                path: self.display_path(),
                reason: e.to_string(),
            }),
        }
    }

    fn persist(&self, id: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::PersistFailed {
                path: self.display_path(),
                reason: e.to_string(),
            })?;
        }
        std::fs::write(&self.path, format!("{id}\n")).map_err(|e| {
            SessionError::PersistFailed {
                path: self.display_path(),
                reason: e.to_string(),
            }
        })
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::ClearFailed {
                path: self.display_path(),
                reason: e.to_string(),
            }),
        }
    }
}

/// In-memory session store for tests.
#[derive(Default)]
pub struct MemorySessionStore {
    id: std::sync::Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.id.lock().expect("session lock poisoned").clone())
    }

    fn persist(&self, id: &str) -> Result<(), SessionError> {
        *self.id.lock().expect("session lock poisoned") = Some(id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.id.lock().expect("session lock poisoned") = None;
        Ok(())
    }
}

/// Session identity provider over a [`SessionStore`].
pub struct SessionIdentity<S: SessionStore> {
    store: S,
}

impl SessionIdentity<FileSessionStore> {
    /// Identity provider backed by the given session file path.
    pub fn file_backed(path: impl AsRef<Path>) -> Self {
        Self::new(FileSessionStore::new(path.as_ref()))
    }
}

impl<S: SessionStore> SessionIdentity<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Return the persisted session id, synthesizing and persisting a fresh
    /// one when absent. Idempotent: repeated calls return the same value
    /// until [`clear`](Self::clear) is invoked.
    pub fn get_or_create(&self) -> Result<String, SessionError> {
        if let Some(existing) = self.store.load()? {
            return Ok(existing);
        }
        let id = synthesize_session_id();
        // Persist before returning so a second caller observes the same id.
        self.store.persist(&id)?;
        tracing::info!(session_id = %id, "created new session identity");
        Ok(id)
    }

    /// Drop the stored id. The next `get_or_create` yields an unrelated one.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.clear()
    }
}

/// Build a new opaque id: `session_<epoch_millis>_<random alphanumerics>`.
///
/// Collisions are astronomically unlikely and not defended against.
fn synthesize_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_ids_follow_the_wire_shape() {
        let id = synthesize_session_id();
        let mut parts = id.splitn(3, '_');

        assert_eq!(parts.next(), Some("session"));
        let millis = parts.next().expect("timestamp part");
        assert!(millis.parse::<i64>().is_ok());
        let suffix = parts.next().expect("suffix part");
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let identity = SessionIdentity::new(MemorySessionStore::new());
        let first = identity.get_or_create().expect("first id");
        let second = identity.get_or_create().expect("second id");

        assert_eq!(first, second);
    }

    #[test]
    fn clear_yields_a_fresh_unrelated_id() {
        let identity = SessionIdentity::new(MemorySessionStore::new());
        let first = identity.get_or_create().expect("first id");
        identity.clear().expect("clear");
        let second = identity.get_or_create().expect("second id");

        assert_ne!(first, second);
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("session");
        let store = FileSessionStore::new(&path);

        assert_eq!(store.load().expect("empty load"), None);
        store.persist("session_1700000000000_abcd1234").expect("persist");
        assert_eq!(
            store.load().expect("load").as_deref(),
            Some("session_1700000000000_abcd1234")
        );
        store.clear().expect("clear");
        assert_eq!(store.load().expect("cleared load"), None);
        // Clearing an already-absent file is not an error.
        store.clear().expect("idempotent clear");
    }
}
