//! Speech client implementation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{error, info};

use super::config::SynthesisConfig;
use super::credential::Credential;
use super::error::{SynthesisError, classify};
use crate::audio::{self, GEMINI_CHANNELS, GEMINI_SAMPLE_RATE};
use crate::backend::{Backend, GenerateContentRequest, Part};

/// A generated clip, encoded as WAV.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAudio {
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: usize,
}

impl GeneratedAudio {
    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.frames as f32 / self.sample_rate as f32
    }
}

/// Client that turns text and voice settings into speech.
///
/// The credential is injected by the caller and only ever sent to the
/// backend as the request's API key.
pub struct SpeechClient<B: Backend> {
    backend: B,
    credential: Option<Credential>,
}

impl<B: Backend> SpeechClient<B> {
    /// Create a client without a credential.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            credential: None,
        }
    }

    /// Create a client with an initial credential.
    pub fn with_credential(backend: B, credential: Credential) -> Self {
        Self {
            backend,
            credential: Some(credential),
        }
    }

    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Build the `generateContent` request for `text`.
    pub fn build_request(&self, text: &str, config: &SynthesisConfig) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(reference) = &config.reference {
            parts.push(Part::inline(
                reference.mime_type.clone(),
                STANDARD.encode(&reference.data),
            ));
        }
        parts.push(Part::text(config.prompt(text)));

        GenerateContentRequest::audio(parts, config.base_voice().name())
    }

    /// Generate speech for `text`.
    ///
    /// Checks run in order: credential, text, then configuration. Nothing is
    /// sent to the backend unless all of them pass.
    pub fn generate_speech(
        &self,
        text: &str,
        config: &SynthesisConfig,
    ) -> Result<GeneratedAudio, SynthesisError> {
        let credential = self
            .credential
            .as_ref()
            .ok_or(SynthesisError::MissingCredential)?;

        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyInput);
        }

        config.validate()?;

        let model = config.model();
        let request = self.build_request(text, config);
        info!(
            model = model.id(),
            voice = %config.voice,
            emotion = %config.emotion,
            reference = config.reference.is_some(),
            "generating speech"
        );

        let response = self
            .backend
            .generate_content(model.id(), credential.expose(), &request)
            .map_err(|e| {
                error!(error = %e, "speech generation failed");
                classify(e)
            })?;

        let payload = response
            .first_audio()
            .ok_or(SynthesisError::EmptyResponse)?;

        let pcm = audio::decode_base64(payload)?;
        let buffer = audio::decode_pcm(&pcm, GEMINI_SAMPLE_RATE, GEMINI_CHANNELS)?;
        let wav = audio::encode_wav(&buffer)?;

        info!(
            frames = buffer.frames(),
            duration = buffer.duration_secs(),
            "speech generated"
        );

        Ok(GeneratedAudio {
            wav,
            sample_rate: buffer.sample_rate(),
            channels: buffer.channels(),
            frames: buffer.frames(),
        })
    }
}
