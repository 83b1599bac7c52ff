use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{Session, SessionError};

const SESSION_FILE: &str = "session.json";

/// Durable backing for the session. Survives process restarts.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Session, SessionError>;
    fn save(&self, session: &Session) -> Result<(), SessionError>;
    fn remove(&self) -> Result<(), SessionError>;
}

/// Plain JSON file in the config directory. Not encrypted.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn ensure_dir(dir: &Path) -> Result<(), SessionError> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Session, SessionError> {
        let path = self.path();
        if !path.exists() {
            return Ok(Session::default());
        }

        let content = fs::read_to_string(path)?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(session)
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        Self::ensure_dir(&self.dir)?;
        let content = serde_json::to_string_pretty(session)?;
        fs::write(self.path(), content)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Process-local storage. Clones share the same slot, so a second
/// `SessionStore` opened on a clone behaves like a reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<Session>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persisted(&self) -> Option<Session> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Session, SessionError> {
        Ok(self.persisted().unwrap_or_default())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
