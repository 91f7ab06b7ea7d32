//! Authenticated-user state with pluggable persistence.
//!
//! # Design
//! `SessionStore` is one slot holding the current principal, or nothing. It
//! is shared by `Arc` between the application and the interceptors that clear
//! it on auth failure. Every mutation is written through to a
//! `SessionPersistence`; `SessionStore::load` restores the slot at startup.
//! Persistence failures are logged and do not undo the in-memory change.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage medium for the session slot.
pub trait SessionPersistence<P>: Send + Sync {
    fn load(&self) -> Result<Option<P>, SessionError>;
    fn save(&self, principal: Option<&P>) -> Result<(), SessionError>;
}

/// Keeps the saved value in memory. Useful for tests and for hosts that have
/// no durable storage.
#[derive(Debug)]
pub struct MemoryPersistence<P> {
    saved: Mutex<Option<P>>,
}

impl<P> Default for MemoryPersistence<P> {
    fn default() -> Self {
        Self {
            saved: Mutex::new(None),
        }
    }
}

impl<P: Clone> MemoryPersistence<P> {
    pub fn with_value(principal: P) -> Self {
        Self {
            saved: Mutex::new(Some(principal)),
        }
    }

    pub fn saved(&self) -> Option<P> {
        self.saved.lock().clone()
    }
}

impl<P: Clone + Send + Sync> SessionPersistence<P> for MemoryPersistence<P> {
    fn load(&self) -> Result<Option<P>, SessionError> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, principal: Option<&P>) -> Result<(), SessionError> {
        *self.saved.lock() = principal.cloned();
        Ok(())
    }
}

/// Stores the principal as a JSON file. An absent file means "no session";
/// clearing the session removes the file.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<P> SessionPersistence<P> for JsonFilePersistence
where
    P: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Option<P>, SessionError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, principal: Option<&P>) -> Result<(), SessionError> {
        match principal {
            Some(p) => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.path, serde_json::to_vec_pretty(p)?)?;
            }
            None => match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}

pub struct SessionStore<P> {
    current: RwLock<Option<P>>,
    persistence: Box<dyn SessionPersistence<P>>,
}

impl<P: Clone> SessionStore<P> {
    /// Start empty; nothing is read from persistence.
    pub fn new(persistence: impl SessionPersistence<P> + 'static) -> Self {
        Self {
            current: RwLock::new(None),
            persistence: Box::new(persistence),
        }
    }

    /// Restore the slot from persistence.
    pub fn load(persistence: impl SessionPersistence<P> + 'static) -> Result<Self, SessionError> {
        let current = persistence.load()?;
        info!(restored = current.is_some(), "session loaded");
        Ok(Self {
            current: RwLock::new(current),
            persistence: Box::new(persistence),
        })
    }

    pub fn get(&self) -> Option<P> {
        self.current.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn set(&self, principal: P) {
        let mut slot = self.current.write();
        *slot = Some(principal);
        self.persist(slot.as_ref());
        info!("session established");
    }

    pub fn clear(&self) {
        let mut slot = self.current.write();
        if slot.take().is_some() {
            info!("session cleared");
        }
        self.persist(None);
    }

    fn persist(&self, principal: Option<&P>) {
        if let Err(e) = self.persistence.save(principal) {
            warn!(error = %e, "failed to persist session");
        }
    }
}

/// Type-erased "clear the session" handle, so interceptors need not be
/// generic over the principal type.
pub trait SessionClear: Send + Sync {
    fn clear_session(&self);
}

impl<P: Clone + Send + Sync> SessionClear for SessionStore<P> {
    fn clear_session(&self) {
        self.clear();
    }
}

/// A principal that carries a credential to send with each request.
pub trait HasToken {
    fn token(&self) -> &str;
}

/// Type-erased read access to the current credential.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<P: HasToken + Clone + Send + Sync> TokenSource for SessionStore<P> {
    fn token(&self) -> Option<String> {
        self.current.read().as_ref().map(|p| p.token().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Principal {
        id: i64,
        name: String,
    }

    fn alice() -> Principal {
        Principal {
            id: 1,
            name: "alice".to_string(),
        }
    }

    #[test]
    fn set_and_clear_write_through() {
        let persistence = Arc::new(MemoryPersistence::default());
        let store = SessionStore::new(SharedMemory(persistence.clone()));
        assert!(!store.is_authenticated());

        store.set(alice());
        assert_eq!(store.get(), Some(alice()));
        assert_eq!(persistence.saved(), Some(alice()));

        store.clear();
        assert!(store.get().is_none());
        assert!(persistence.saved().is_none());
    }

    #[test]
    fn load_restores_saved_principal() {
        let store = SessionStore::load(MemoryPersistence::with_value(alice())).unwrap();
        assert_eq!(store.get(), Some(alice()));
    }

    #[test]
    fn json_file_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("session.json");

        let store: SessionStore<Principal> =
            SessionStore::load(JsonFilePersistence::new(&path)).unwrap();
        assert!(store.get().is_none());
        store.set(alice());
        drop(store);

        let restored: SessionStore<Principal> =
            SessionStore::load(JsonFilePersistence::new(&path)).unwrap();
        assert_eq!(restored.get(), Some(alice()));

        restored.clear();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"{not json").unwrap();
        let result: Result<SessionStore<Principal>, _> =
            SessionStore::load(JsonFilePersistence::new(&path));
        assert!(matches!(result, Err(SessionError::Json(_))));
    }

    struct SharedMemory(Arc<MemoryPersistence<Principal>>);

    impl SessionPersistence<Principal> for SharedMemory {
        fn load(&self) -> Result<Option<Principal>, SessionError> {
            self.0.load()
        }

        fn save(&self, principal: Option<&Principal>) -> Result<(), SessionError> {
            self.0.save(principal)
        }
    }
}
