//! Settings file holding the persisted API key.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::engine::Credential;

/// Key under which the API key is stored.
pub const CREDENTIAL_KEY: &str = "echovocal_api_key";

/// Errors that can occur while reading or writing settings.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("Settings file is not a JSON object: {0}")]
    Malformed(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Persists the API key in a JSON settings file.
///
/// The key is stored in plain text without expiry.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store at `~/.echovocal/settings.json`.
    pub fn new() -> Result<Self, StoreError> {
        let path = dirs::home_dir()
            .ok_or(StoreError::NoHomeDir)?
            .join(".echovocal")
            .join("settings.json");

        Ok(Self { path })
    }

    /// Create a store backed by a custom file.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_settings(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let json = std::fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&json)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Malformed(self.path.clone())),
        }
    }

    fn write_settings(&self, settings: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json)?;

        Ok(())
    }

    /// Load the stored API key, if any.
    pub fn load(&self) -> Result<Option<Credential>, StoreError> {
        let settings = self.read_settings()?;

        Ok(settings
            .get(CREDENTIAL_KEY)
            .and_then(Value::as_str)
            .and_then(Credential::new))
    }

    /// Store the API key, keeping any other settings.
    pub fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let mut settings = self.read_settings()?;
        settings.insert(
            CREDENTIAL_KEY.to_string(),
            Value::String(credential.expose().to_string()),
        );
        self.write_settings(&settings)?;

        debug!(path = %self.path.display(), "API key saved");
        Ok(())
    }

    /// Remove the stored API key.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut settings = self.read_settings()?;
        if settings.remove(CREDENTIAL_KEY).is_some() {
            self.write_settings(&settings)?;
        }

        Ok(())
    }
}
