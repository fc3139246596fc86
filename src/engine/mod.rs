//! Speech synthesis engine.
//!
//! This module shapes requests for the remote speech API from text and
//! voice settings, dispatches them through a [`Backend`](crate::backend::Backend)
//! and decodes the returned audio into WAV.

mod config;
mod credential;
mod error;
mod tts;

pub use config::{
    CUSTOM_FALLBACK_VOICE, Emotion, MAX_REFERENCE_BYTES, PITCH_RANGE, ParseNameError, PresetVoice,
    ReferenceAudio, SPEED_RANGE, SynthesisConfig, VoiceSelector, mime_type_for, pitch_phrase,
    speed_phrase,
};
pub use credential::Credential;
pub use error::{SynthesisError, classify};
pub use tts::{GeneratedAudio, SpeechClient};
