//! Voice and style parameters of a synthesis request.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use super::error::SynthesisError;
use crate::backend::SpeechModel;

/// Largest accepted reference audio file (10 MiB).
pub const MAX_REFERENCE_BYTES: u64 = 10 * 1024 * 1024;

/// Preset voice used when the selector is [`VoiceSelector::Custom`].
///
/// The API's voice parameter only accepts presets; the custom description
/// travels in the instruction text instead.
pub const CUSTOM_FALLBACK_VOICE: PresetVoice = PresetVoice::Kore;

pub const SPEED_RANGE: std::ops::RangeInclusive<f32> = 0.5..=2.0;
pub const PITCH_RANGE: std::ops::RangeInclusive<i8> = -10..=10;

/// Error returned when parsing a voice or emotion name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} '{value}'. Expected one of: {expected}")]
pub struct ParseNameError {
    kind: &'static str,
    value: String,
    expected: String,
}

/// Built-in voices understood by the speech API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresetVoice {
    #[default]
    Kore,
    Puck,
    Charon,
    Fenrir,
    Zephyr,
}

impl PresetVoice {
    pub const ALL: [PresetVoice; 5] = [
        PresetVoice::Kore,
        PresetVoice::Puck,
        PresetVoice::Charon,
        PresetVoice::Fenrir,
        PresetVoice::Zephyr,
    ];

    /// Returns the API voice name.
    pub fn name(&self) -> &'static str {
        match self {
            PresetVoice::Kore => "Kore",
            PresetVoice::Puck => "Puck",
            PresetVoice::Charon => "Charon",
            PresetVoice::Fenrir => "Fenrir",
            PresetVoice::Zephyr => "Zephyr",
        }
    }
}

/// Voice choice: a preset, or a custom voice described by text and/or
/// reference audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceSelector {
    Preset(PresetVoice),
    Custom,
}

impl Default for VoiceSelector {
    fn default() -> Self {
        VoiceSelector::Preset(PresetVoice::default())
    }
}

impl fmt::Display for VoiceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceSelector::Preset(voice) => f.write_str(voice.name()),
            VoiceSelector::Custom => f.write_str("Custom"),
        }
    }
}

impl FromStr for VoiceSelector {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("custom") {
            return Ok(VoiceSelector::Custom);
        }

        PresetVoice::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(wanted))
            .map(VoiceSelector::Preset)
            .ok_or_else(|| ParseNameError {
                kind: "voice",
                value: wanted.to_string(),
                expected: "kore, puck, charon, fenrir, zephyr, custom".to_string(),
            })
    }
}

/// Emotional tone of the generated speech.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Emotion {
    #[default]
    Neutral,
    Cheerful,
    Serious,
    Calm,
    Excited,
    Whispering,
    Sad,
    Angry,
    Friendly,
}

impl Emotion {
    pub const ALL: [Emotion; 9] = [
        Emotion::Neutral,
        Emotion::Cheerful,
        Emotion::Serious,
        Emotion::Calm,
        Emotion::Excited,
        Emotion::Whispering,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Friendly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Cheerful => "cheerful",
            Emotion::Serious => "serious",
            Emotion::Calm => "calm",
            Emotion::Excited => "excited",
            Emotion::Whispering => "whispering",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Friendly => "friendly",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseNameError {
                kind: "emotion",
                value: wanted.to_string(),
                expected: Emotion::ALL.map(|e| e.as_str()).join(", "),
            })
    }
}

/// Reference audio clip used for voice mimicry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAudio {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl ReferenceAudio {
    /// Load a reference clip from disk.
    ///
    /// The size limit is checked against file metadata before any read.
    pub fn from_file(path: &Path) -> Result<Self, SynthesisError> {
        let unreadable = |source| SynthesisError::ReferenceUnreadable {
            path: path.to_path_buf(),
            source,
        };

        let size = std::fs::metadata(path).map_err(unreadable)?.len();
        if size > MAX_REFERENCE_BYTES {
            return Err(SynthesisError::OversizedFile {
                size,
                limit: MAX_REFERENCE_BYTES,
            });
        }

        let data = std::fs::read(path).map_err(unreadable)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("reference")
            .to_string();

        Ok(Self {
            data,
            mime_type: mime_type_for(path).to_string(),
            file_name,
        })
    }
}

/// Guess an audio media type from the file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("ogg" | "oga" | "opus") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("m4a" | "mp4") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("webm") => "audio/webm",
        Some("aif" | "aiff") => "audio/aiff",
        _ => "audio/mpeg",
    }
}

/// Parameters controlling how the text is spoken.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    pub voice: VoiceSelector,
    pub emotion: Emotion,
    /// Speed multiplier, 0.5 to 2.0
    pub speed: f32,
    /// Pitch offset, -10 to +10
    pub pitch: i8,
    pub description: String,
    pub reference: Option<ReferenceAudio>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            voice: VoiceSelector::default(),
            emotion: Emotion::default(),
            speed: 1.0,
            pitch: 0,
            description: String::new(),
            reference: None,
        }
    }
}

impl SynthesisConfig {
    /// Check parameter ranges and the custom-voice requirement.
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if !SPEED_RANGE.contains(&self.speed) {
            return Err(SynthesisError::InvalidParameter(format!(
                "speed {} is outside 0.5..=2.0",
                self.speed
            )));
        }

        if !PITCH_RANGE.contains(&self.pitch) {
            return Err(SynthesisError::InvalidParameter(format!(
                "pitch {} is outside -10..=10",
                self.pitch
            )));
        }

        if self.voice == VoiceSelector::Custom
            && self.description.trim().is_empty()
            && self.reference.is_none()
        {
            return Err(SynthesisError::CustomVoiceUnspecified);
        }

        Ok(())
    }

    /// Remote model for this configuration.
    pub fn model(&self) -> SpeechModel {
        SpeechModel::for_reference(self.reference.is_some())
    }

    /// Preset voice sent to the API.
    pub fn base_voice(&self) -> PresetVoice {
        match self.voice {
            VoiceSelector::Preset(voice) => voice,
            VoiceSelector::Custom => CUSTOM_FALLBACK_VOICE,
        }
    }

    /// Style instruction describing how to speak.
    pub fn instruction(&self) -> String {
        let emotion = self.emotion.as_str();
        let speed = speed_phrase(self.speed);
        let pitch = pitch_phrase(self.pitch);
        let description = self.description.trim();

        if self.reference.is_some() {
            format!(
                "MIMICRY MODE: Listen to the provided audio reference carefully. \
                 Analyze the speaker's timbre, pitch, and prosody. \
                 Generate speech for the provided text by strictly mimicking the voice in the audio reference. \
                 Apply these modifiers if possible: {emotion}, {speed}, {pitch}. \
                 Additional context: {description}"
            )
        } else if self.voice == VoiceSelector::Custom {
            format!("Adopt this vocal profile: [{description}, {emotion}, {speed}, {pitch}].")
        } else {
            format!("Speak in a {emotion} tone with {speed} {pitch} modifiers. {description}")
        }
    }

    /// Full text part sent to the model: instruction followed by the text.
    pub fn prompt(&self, text: &str) -> String {
        format!("{}\n\nTEXT TO SPEAK: {text}", self.instruction())
    }
}

/// Qualifier for a speed multiplier; empty at exactly 1.0.
pub fn speed_phrase(speed: f32) -> &'static str {
    if speed == 1.0 {
        ""
    } else if speed > 1.0 {
        "fast-paced"
    } else {
        "slow-paced"
    }
}

/// Qualifier for a pitch offset; empty at 0.
pub fn pitch_phrase(pitch: i8) -> &'static str {
    match pitch {
        0 => "",
        p if p > 0 => "high-pitched",
        _ => "deep/low-pitched",
    }
}
