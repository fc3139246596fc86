//! Synthesis error taxonomy.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::audio::DecodeError;
use crate::backend::BackendError;

/// Errors that can occur while generating speech.
///
/// None of these are fatal; each is meant to be shown to the user, who may
/// retry after fixing the cause.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("API key is not set. Enter your Gemini API key first.")]
    MissingCredential,

    #[error("API key is invalid. Check your key settings.")]
    InvalidCredential,

    #[error("API key quota exhausted (429). Switch to another API key.")]
    QuotaExceeded,

    #[error(
        "Model not found or access denied (404). Use an API key with access to the Gemini 2.5 preview models."
    )]
    ModelUnavailable,

    #[error("This input combination is not supported by the model.")]
    UnsupportedModality,

    #[error("Text is empty")]
    EmptyInput,

    #[error("No audio data received. The API response was empty.")]
    EmptyResponse,

    #[error("Custom voice needs a description or a reference audio clip")]
    CustomVoiceUnspecified,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Reference audio is too large ({size} bytes). Maximum is {limit} bytes.")]
    OversizedFile { size: u64, limit: u64 },

    #[error("Cannot read reference audio {path}: {source}")]
    ReferenceUnreadable { path: PathBuf, source: io::Error },

    #[error("Audio decoding failed: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SynthesisError {
    /// Whether the user should be asked for a new API key.
    pub fn needs_credential_prompt(&self) -> bool {
        matches!(
            self,
            SynthesisError::MissingCredential
                | SynthesisError::InvalidCredential
                | SynthesisError::QuotaExceeded
                | SynthesisError::ModelUnavailable
        )
    }
}

/// Map a backend failure to a user-facing category by its message text.
///
/// Unrecognized failures are passed through unchanged.
pub fn classify(error: BackendError) -> SynthesisError {
    let message = error.to_string();
    let mentions = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

    if mentions(&["404", "NOT_FOUND", "PERMISSION_DENIED"]) {
        SynthesisError::ModelUnavailable
    } else if mentions(&["429", "Quota", "RESOURCE_EXHAUSTED"]) {
        SynthesisError::QuotaExceeded
    } else if mentions(&["API key"]) {
        SynthesisError::InvalidCredential
    } else if mentions(&["modality"]) {
        SynthesisError::UnsupportedModality
    } else {
        SynthesisError::Backend(error)
    }
}
