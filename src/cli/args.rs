//! CLI argument definitions and parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::backend::DEFAULT_ENDPOINT;
use crate::engine::{Emotion, PITCH_RANGE, SPEED_RANGE, SynthesisConfig, VoiceSelector};

/// Voice cloning and text-to-speech with the Gemini speech API.
#[derive(Parser, Debug)]
#[command(name = "echovocal")]
#[command(about = "Voice cloning and text-to-speech with the Gemini speech API")]
#[command(version)]
pub struct Args {
    /// Text to generate speech from
    #[arg(short, long)]
    pub generate: Option<String>,

    /// Voice: kore, puck, charon, fenrir, zephyr or custom
    #[arg(long, default_value = "kore")]
    pub voice: VoiceSelector,

    /// Emotional tone (neutral, cheerful, serious, calm, excited, whispering, sad, angry, friendly)
    #[arg(short, long, default_value = "neutral")]
    pub emotion: Emotion,

    /// Speech speed multiplier (0.5 to 2.0)
    #[arg(short, long, default_value = "1.0", value_parser = parse_speed)]
    pub speed: f32,

    /// Pitch offset (-10 to 10)
    #[arg(
        short,
        long,
        default_value = "0",
        allow_hyphen_values = true,
        value_parser = parse_pitch
    )]
    pub pitch: i8,

    /// Free-text voice description (required for custom voice without reference)
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Reference audio to mimic (max 10 MiB)
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Output audio file or directory (default: echovocal-<id>.wav)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Gemini API key, used when none is stored
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Store a new API key and use it from now on
    #[arg(long, value_name = "KEY")]
    pub set_key: Option<String>,

    /// API endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Player command, e.g. "mpv --speed={rate}"
    #[arg(long, env = "ECHOVOCAL_PLAYER")]
    pub player: Option<String>,

    /// Do not play generated audio
    #[arg(long)]
    pub no_play: bool,

    /// Start an interactive session
    #[arg(short, long)]
    pub interactive: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Settings file (default: ~/.echovocal/settings.json)
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

impl Args {
    /// Voice settings from the command line, without reference audio.
    pub fn synthesis_config(&self) -> SynthesisConfig {
        SynthesisConfig {
            voice: self.voice,
            emotion: self.emotion,
            speed: self.speed,
            pitch: self.pitch,
            description: self.description.clone(),
            reference: None,
        }
    }

    /// Player command to use, unless playback is disabled.
    pub fn player_command(&self) -> Option<&str> {
        if self.no_play {
            None
        } else {
            self.player.as_deref()
        }
    }
}

/// Parse a speed multiplier in the range 0.5 to 2.0.
pub fn parse_speed(input: &str) -> Result<f32, String> {
    let speed: f32 = input
        .trim()
        .parse()
        .map_err(|_| format!("'{input}' is not a number"))?;

    if !SPEED_RANGE.contains(&speed) {
        return Err(format!("speed must be between 0.5 and 2.0, got {speed}"));
    }

    Ok(speed)
}

/// Parse a pitch offset in the range -10 to 10.
pub fn parse_pitch(input: &str) -> Result<i8, String> {
    let pitch: i8 = input
        .trim()
        .parse()
        .map_err(|_| format!("'{input}' is not a whole number"))?;

    if !PITCH_RANGE.contains(&pitch) {
        return Err(format!("pitch must be between -10 and 10, got {pitch}"));
    }

    Ok(pitch)
}
