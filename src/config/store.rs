use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::PlayauthError;

use super::types::{ClientCredentials, Settings};

/// The server's settings file, held in memory and rewritten wholesale on
/// every change.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    port: u16,
    current: Mutex<Settings>,
}

impl SettingsStore {
    /// Load settings from `path`, creating the file with defaults when it does
    /// not exist. An empty redirect URI is backfilled with the local default
    /// for `port`.
    pub fn load_or_init(path: impl Into<PathBuf>, port: u16) -> Result<Self, PlayauthError> {
        let path = path.into();
        let (mut settings, exists) = if path.exists() {
            (load_settings_file(&path)?, true)
        } else {
            (Settings::default(), false)
        };

        let backfilled = settings.backfill_redirect_uri(port);
        if !exists || backfilled {
            write_settings_file(&path, &settings)?;
            tracing::info!(path = %path.display(), "wrote settings file");
        }

        Ok(Self {
            path,
            port,
            current: Mutex::new(settings),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Settings {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn credentials(&self) -> ClientCredentials {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .credentials()
    }

    /// Shallow-merge `patch` into the stored settings and persist the result.
    /// An emptied redirect URI is backfilled like on load. Blocks on file I/O.
    pub fn merge(&self, patch: serde_json::Value) -> Result<Settings, PlayauthError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let mut merged = current.merged(patch)?;
        merged.backfill_redirect_uri(self.port);
        write_settings_file(&self.path, &merged)?;
        *current = merged.clone();
        Ok(merged)
    }
}

fn load_settings_file(path: &Path) -> Result<Settings, PlayauthError> {
    let content = std::fs::read_to_string(path).map_err(|e| PlayauthError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Cannot read file: {}", e),
    })?;

    serde_json::from_str::<Settings>(&content).map_err(|e| PlayauthError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Invalid JSON: {}", e),
    })
}

fn write_settings_file(path: &Path, settings: &Settings) -> Result<(), PlayauthError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let data = serde_json::to_string_pretty(settings).map_err(|e| PlayauthError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Failed to serialize settings: {e}"),
    })?;
    std::fs::write(path, data)?;
    Ok(())
}
