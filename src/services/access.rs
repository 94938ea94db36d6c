use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key under which the access flag is persisted.
pub const ACCESS_KEY: &str = "clippyio_access";

/// Minimal persistent key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store, used in tests and when nothing should be persisted.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object in a single file. A missing file is empty.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Early-access gate. Once unlocked the flag stays set; nothing here clears it.
pub struct AccessGate {
    store: Box<dyn KeyValueStore>,
    secret: Option<String>,
}

impl AccessGate {
    pub fn new(store: Box<dyn KeyValueStore>, secret: Option<String>) -> Self {
        Self { store, secret }
    }

    pub fn is_granted(&self) -> Result<bool, AccessError> {
        Ok(self
            .store
            .get(ACCESS_KEY)?
            .is_some_and(|value| !value.is_empty()))
    }

    /// Compare `code` with the configured secret and persist the flag on a match.
    pub fn unlock(&self, code: &str) -> Result<(), AccessError> {
        let secret = self.secret.as_deref().ok_or(AccessError::NotConfigured)?;
        if code != secret {
            tracing::warn!("Rejected invalid access code");
            return Err(AccessError::InvalidCode);
        }

        self.store.set(ACCESS_KEY, "true")?;
        tracing::info!("Access granted");
        Ok(())
    }

    /// Fail with [`AccessError::Locked`] unless the flag is set.
    pub fn require(&self) -> Result<(), AccessError> {
        if self.is_granted()? {
            Ok(())
        } else {
            Err(AccessError::Locked)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store contents are not valid JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Invalid access code")]
    InvalidCode,

    #[error("No access code is configured")]
    NotConfigured,

    #[error("Access has not been granted; run `clippyio unlock <code>` first")]
    Locked,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_with_correct_code() {
        let gate = AccessGate::new(Box::new(MemoryStore::new()), Some("sesame".to_string()));
        assert!(!gate.is_granted().unwrap());
        assert!(matches!(gate.require(), Err(AccessError::Locked)));

        gate.unlock("sesame").unwrap();
        assert!(gate.is_granted().unwrap());
        assert!(gate.require().is_ok());
    }

    #[test]
    fn test_wrong_code_leaves_gate_locked() {
        let gate = AccessGate::new(Box::new(MemoryStore::new()), Some("sesame".to_string()));
        assert!(matches!(gate.unlock("nope"), Err(AccessError::InvalidCode)));
        assert!(!gate.is_granted().unwrap());
    }

    #[test]
    fn test_unconfigured_secret_never_unlocks() {
        let gate = AccessGate::new(Box::new(MemoryStore::new()), None);
        assert!(matches!(gate.unlock(""), Err(AccessError::NotConfigured)));
        assert!(!gate.is_granted().unwrap());
    }

    #[test]
    fn test_memory_store_clear() {
        let store = MemoryStore::new();
        store.set(ACCESS_KEY, "true").unwrap();
        assert_eq!(store.get(ACCESS_KEY).unwrap().as_deref(), Some("true"));
        store.clear(ACCESS_KEY).unwrap();
        assert_eq!(store.get(ACCESS_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.json");

        let gate = AccessGate::new(Box::new(FileStore::new(&path)), Some("sesame".to_string()));
        gate.unlock("sesame").unwrap();

        let reopened = AccessGate::new(Box::new(FileStore::new(&path)), None);
        assert!(reopened.is_granted().unwrap());

        let store = FileStore::new(&path);
        store.clear(ACCESS_KEY).unwrap();
        assert_eq!(store.get(ACCESS_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get(ACCESS_KEY).unwrap(), None);
        store.clear(ACCESS_KEY).unwrap();
        assert!(!store.path().exists());
    }
}
