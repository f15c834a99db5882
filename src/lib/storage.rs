//! Key-value storage that survives restarts, the client-side equivalent of
//! browser local storage. Writes are batched so related keys (`authToken` and
//! `user`) are always stored and removed together.

use super::errors::AppError;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::debug;

/// Storage backend used to persist session state.
pub trait KeyValueStore: Send + Sync {
    /// Reads a single key.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Writes every entry in one batch.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the batch cannot be written.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), AppError>;

    /// Removes every key in one batch. Missing keys are ignored.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the batch cannot be written.
    fn remove_many(&self, keys: &[&str]) -> Result<(), AppError>;
}

/// In-memory store, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(&self, apply: impl FnOnce(&mut HashMap<String, String>) -> R) -> Result<R, AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Storage("memory store lock poisoned".to_string()))?;
        Ok(apply(&mut entries))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn set_many(&self, batch: &[(&str, String)]) -> Result<(), AppError> {
        self.with_entries(|entries| {
            for (key, value) in batch {
                entries.insert((*key).to_string(), value.clone());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), AppError> {
        self.with_entries(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

/// JSON file store. The whole map is rewritten through a temporary file and
/// renamed into place so readers never observe a half-written batch.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Storage(format!("Corrupt state file {}: {err}", self.path.display()))
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(AppError::Storage(format!(
                "Failed to read {}: {err}",
                self.path.display()
            ))),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                AppError::Storage(format!("Failed to create {}: {err}", parent.display()))
            })?;
        }

        let contents = serde_json::to_string_pretty(map)
            .map_err(|err| AppError::Storage(format!("Failed to encode state: {err}")))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .map_err(|err| AppError::Storage(format!("Failed to write {}: {err}", tmp.display())))?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path).map_err(|err| {
            AppError::Storage(format!("Failed to replace {}: {err}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), keys = map.len(), "state file written");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), AppError> {
        let mut map = self.read_map()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        self.write_map(&map)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), AppError> {
        let mut map = match self.read_map() {
            Ok(map) => map,
            // A corrupt file is replaced rather than blocking logout.
            Err(AppError::Storage(_)) => BTreeMap::new(),
            Err(err) => return Err(err),
        };
        for key in keys {
            map.remove(*key);
        }
        self.write_map(&map)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), AppError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|err| AppError::Storage(format!("Failed to set permissions: {err}")))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), AppError> {
    Ok(())
}
