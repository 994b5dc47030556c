use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PlayauthError;

/// Key/value JSON files under one directory, one file per key.
///
/// Each item is read and written whole; two writers racing on the same key
/// resolve to whichever wrote last.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.playauth`, or `./.playauth` when no home directory is known.
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".playauth")
    }

    pub fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Missing or unreadable items read as `None`. Unreadable ones are logged.
    pub fn get_item<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get_item(key) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(key, "ignoring stored item: {e}");
                None
            }
        }
    }

    /// `Ok(None)` when the item was never written; an error when it exists but
    /// cannot be read or parsed.
    pub fn try_get_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PlayauthError> {
        let path = self.item_path(key);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| PlayauthError::ConfigError {
                path,
                detail: format!("Invalid JSON: {e}"),
            })
    }

    pub fn set_item<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PlayauthError> {
        let path = self.item_path(key);
        std::fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_string_pretty(value).map_err(|e| PlayauthError::ConfigError {
            path: path.clone(),
            detail: format!("Failed to serialize {key}: {e}"),
        })?;
        std::fs::write(&path, data)?;
        Ok(())
    }
}
