//! Persistent user settings
//!
//! This module stores small pieces of state that should survive between
//! runs, such as the last media directory that was loaded. Settings are
//! serialized to JSON in the system's standard config directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the settings file inside the settings directory
const SETTINGS_FILE: &str = "settings.json";

/// Errors that can occur during settings operations
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to determine config directory location
    #[error("Failed to determine config directory location")]
    ConfigDirectoryNotFound,

    /// Failed to create or access config directory
    #[error("Failed to create config directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read settings file
    #[error("Failed to read settings file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write settings file
    #[error("Failed to write settings file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to deserialize settings
    #[error("Failed to deserialize settings file {path}: {source}")]
    DeserializationFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize settings
    #[error("Failed to serialize settings: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Settings remembered between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory of the last successful load
    #[serde(default)]
    pub last_directory: Option<PathBuf>,
}

/// Location of the settings file
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    /// Opens the settings store in the system's standard config directory
    ///
    /// The directory is created if it does not exist yet.
    pub fn open() -> Result<Self, SettingsError> {
        let proj_dirs = directories::ProjectDirs::from("de", "westhoffswelt", "mediarental")
            .ok_or(SettingsError::ConfigDirectoryNotFound)?;

        Self::with_directory(proj_dirs.config_dir())
    }

    /// Opens a settings store rooted at the given directory
    pub fn with_directory(dir: &Path) -> Result<Self, SettingsError> {
        // Create the directory if it doesn't exist
        fs::create_dir_all(dir).map_err(|e| SettingsError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Loads the stored settings
    ///
    /// Returns default settings if nothing has been stored yet. Returns an
    /// error if the file exists but cannot be read or deserialized.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let file_path = self.file_path();

        // Nothing stored yet
        if !file_path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&file_path).map_err(|e| SettingsError::ReadFailed {
            path: file_path.clone(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| SettingsError::DeserializationFailed {
            path: file_path,
            source: e,
        })
    }

    /// Stores the given settings, replacing previous ones
    pub fn store(&self, settings: &Settings) -> Result<(), SettingsError> {
        let file_path = self.file_path();
        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&file_path, content).map_err(|e| SettingsError::WriteFailed {
            path: file_path,
            source: e,
        })
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }
}
