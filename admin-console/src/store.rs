use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use common_auth::Role;
use thiserror::Error;
use tracing::warn;

use crate::models::User;

/// The three persisted session entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    User,
}

impl StorageKey {
    pub const ALL: [StorageKey; 3] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AccessToken => "access_token",
            StorageKey::RefreshToken => "refresh_token",
            StorageKey::User => "user",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session storage holds invalid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key/value persistence for the session.
///
/// Writes are last-write-wins per key; there is no expiry tracking.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: StorageKey) -> StoreResult<Option<String>>;
    fn set(&self, key: StorageKey, value: &str) -> StoreResult<()>;
    fn remove(&self, key: StorageKey) -> StoreResult<()>;

    fn clear(&self) -> StoreResult<()> {
        for key in StorageKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Typed helpers layered over any [`SessionStore`].
pub trait SessionStoreExt {
    /// Reads a key, logging and swallowing storage failures.
    fn read(&self, key: StorageKey) -> Option<String>;
    fn load_user(&self) -> Option<User>;
    fn save_user(&self, user: &User) -> StoreResult<()>;
    fn save_tokens(&self, access: &str, refresh: &str) -> StoreResult<()>;
    fn current_role(&self) -> Option<Role>;
}

impl<S: SessionStore + ?Sized> SessionStoreExt for S {
    fn read(&self, key: StorageKey) -> Option<String> {
        match self.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                warn!(key = key.as_str(), error = %err, "session storage read failed");
                None
            }
        }
    }

    fn load_user(&self) -> Option<User> {
        let raw = self.read(StorageKey::User)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(error = %err, "cached user profile is unreadable");
                None
            }
        }
    }

    fn save_user(&self, user: &User) -> StoreResult<()> {
        let raw = serde_json::to_string(user)?;
        self.set(StorageKey::User, &raw)
    }

    fn save_tokens(&self, access: &str, refresh: &str) -> StoreResult<()> {
        self.set(StorageKey::AccessToken, access)?;
        self.set(StorageKey::RefreshToken, refresh)
    }

    fn current_role(&self) -> Option<Role> {
        self.load_user().map(|user| user.role)
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<StorageKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("rwlock poisoned").is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: StorageKey) -> StoreResult<Option<String>> {
        let guard = self.inner.read().expect("rwlock poisoned");
        Ok(guard.get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> StoreResult<()> {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> StoreResult<()> {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.remove(&key);
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        self.inner.write().expect("rwlock poisoned").clear();
        Ok(())
    }
}

/// JSON file persistence; a missing file reads as an empty session.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, mutate: F) -> StoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().expect("mutex poisoned");
        let mut entries = match self.load() {
            Err(StoreError::Corrupt(err)) => {
                warn!(path = %self.path.display(), error = %err, "discarding unreadable session file");
                BTreeMap::new()
            }
            other => other?,
        };
        mutate(&mut entries);
        self.write(&entries)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: StorageKey) -> StoreResult<Option<String>> {
        let _guard = self.lock.lock().expect("mutex poisoned");
        Ok(self.load()?.remove(key.as_str()))
    }

    fn set(&self, key: StorageKey, value: &str) -> StoreResult<()> {
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn remove(&self, key: StorageKey) -> StoreResult<()> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
    }

    /// Removes the file outright, so a corrupt file can still be cleared.
    fn clear(&self) -> StoreResult<()> {
        let _guard = self.lock.lock().expect("mutex poisoned");
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}
