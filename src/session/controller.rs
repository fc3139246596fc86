//! Session state: current settings, generation history and playback.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::playback::{AudioOutput, PlaybackError, PlaybackHandle};
use crate::backend::Backend;
use crate::engine::{
    Credential, GeneratedAudio, ReferenceAudio, SpeechClient, SynthesisConfig, SynthesisError,
};
use crate::store::{CredentialStore, StoreError};

/// Number of characters kept in a history preview.
pub const PREVIEW_CHARS: usize = 100;

/// Errors that can occur during session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A generation is already in progress")]
    Busy,

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("No history entry with id {0}")]
    UnknownEntry(Uuid),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Settings error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SessionError {
    /// Whether the user should be asked for a new API key.
    pub fn needs_credential_prompt(&self) -> bool {
        matches!(self, SessionError::Synthesis(e) if e.needs_credential_prompt())
    }
}

/// A generated clip kept in the session history.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub preview: String,
    pub config: SynthesisConfig,
    pub audio: GeneratedAudio,
    pub handle: PlaybackHandle,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// First eight characters of the id.
    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }

    /// File name used when exporting this clip.
    pub fn file_name(&self) -> String {
        format!("echovocal-{}.wav", self.short_id())
    }
}

/// Shorten `text` to [`PREVIEW_CHARS`] characters, marking truncation.
pub fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Interactive session driving the speech client.
///
/// Only one generation may run at a time. History is ordered most recent
/// first and entries are only dropped by [`Session::clear_history`].
pub struct Session<B: Backend, O: AudioOutput> {
    client: SpeechClient<B>,
    output: O,
    store: CredentialStore,
    config: SynthesisConfig,
    history: Vec<HistoryEntry>,
    active: Option<Uuid>,
    busy: bool,
    last_error: Option<String>,
    needs_credential: bool,
}

impl<B: Backend, O: AudioOutput> Session<B, O> {
    /// Start a session.
    ///
    /// A key persisted in `store` takes precedence over `fallback`.
    pub fn new(backend: B, output: O, store: CredentialStore, fallback: Option<Credential>) -> Self {
        let stored = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "could not read stored API key");
            None
        });

        let mut client = SpeechClient::new(backend);
        client.set_credential(stored.or(fallback));

        Self {
            client,
            output,
            store,
            config: SynthesisConfig::default(),
            history: Vec::new(),
            active: None,
            busy: false,
            last_error: None,
            needs_credential: false,
        }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SynthesisConfig {
        &mut self.config
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.client.credential()
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// History, most recent first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The entry currently loaded in the player.
    pub fn active(&self) -> Option<&HistoryEntry> {
        let id = self.active?;
        self.entry(id)
    }

    pub fn entry(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.history.iter().find(|e| e.id == id)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Hold the session mid-generation, as a second caller would see it.
    #[cfg(test)]
    pub(crate) fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Message of the most recent failure, cleared by the next attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Set after a failure that calls for a new API key.
    pub fn needs_credential(&self) -> bool {
        self.needs_credential
    }

    /// Persist and use a new API key. Blank input is ignored.
    pub fn save_credential(&mut self, raw: &str) -> Result<bool, SessionError> {
        let Some(credential) = Credential::new(raw) else {
            return Ok(false);
        };

        self.store.save(&credential)?;
        self.client.set_credential(Some(credential));
        self.last_error = None;
        self.needs_credential = false;

        info!("API key updated");
        Ok(true)
    }

    /// Keep the current key after a credential prompt was declined.
    pub fn dismiss_credential_prompt(&mut self) {
        self.needs_credential = false;
    }

    /// Load a reference clip for voice mimicry.
    ///
    /// On failure the current reference is left as it was.
    pub fn attach_reference(&mut self, path: &Path) -> Result<(), SessionError> {
        match ReferenceAudio::from_file(path) {
            Ok(reference) => {
                info!(file = %reference.file_name, bytes = reference.data.len(), "reference audio attached");
                self.config.reference = Some(reference);
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn remove_reference(&mut self) {
        self.config.reference = None;
    }

    fn fail(&mut self, error: SynthesisError) -> SessionError {
        self.last_error = Some(error.to_string());
        if error.needs_credential_prompt() {
            self.needs_credential = true;
        }
        error.into()
    }

    /// Generate speech for `text` with the current settings.
    ///
    /// The new entry is put at the front of the history, made active and
    /// played. Playback failures are logged and do not fail the generation.
    pub fn generate(&mut self, text: &str) -> Result<&HistoryEntry, SessionError> {
        if self.busy {
            return Err(SessionError::Busy);
        }

        if text.trim().is_empty() {
            return Err(self.fail(SynthesisError::EmptyInput));
        }

        if let Err(e) = self.config.validate() {
            return Err(self.fail(e));
        }

        self.busy = true;
        self.last_error = None;
        let result = self.client.generate_speech(text, &self.config);
        self.busy = false;

        let audio = result.map_err(|e| self.fail(e))?;
        let handle = match self.output.register(&audio.wav) {
            Ok(handle) => handle,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            preview: preview(text),
            config: self.config.clone(),
            audio,
            handle,
            created_at: Utc::now(),
        };
        info!(id = %entry.id, duration = entry.audio.duration_secs(), "clip added to history");

        if let Err(e) = self.output.play(&entry.handle, entry.config.speed) {
            warn!(error = %e, "autoplay failed");
        }

        self.active = Some(entry.id);
        self.history.insert(0, entry);
        Ok(&self.history[0])
    }

    /// Play a history entry and make it active.
    pub fn play(&mut self, id: Uuid) -> Result<(), SessionError> {
        let entry = self
            .history
            .iter()
            .find(|e| e.id == id)
            .ok_or(SessionError::UnknownEntry(id))?;

        self.output.play(&entry.handle, entry.config.speed)?;
        self.active = Some(id);
        Ok(())
    }

    /// Write a history entry as a WAV file.
    ///
    /// If `dest` is a directory the file is named after the entry id.
    pub fn export(&self, id: Uuid, dest: &Path) -> Result<PathBuf, SessionError> {
        let entry = self.entry(id).ok_or(SessionError::UnknownEntry(id))?;

        let path = if dest.is_dir() {
            dest.join(entry.file_name())
        } else {
            dest.to_path_buf()
        };
        std::fs::write(&path, &entry.audio.wav)?;

        info!(path = %path.display(), "clip exported");
        Ok(path)
    }

    /// Drop every history entry and release its playback handle.
    pub fn clear_history(&mut self) {
        for entry in self.history.drain(..) {
            self.output.release(&entry.handle);
        }
        self.active = None;
    }
}

