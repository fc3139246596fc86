//! Playback handles for generated clips.

use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while storing or playing audio.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid player command: {0}")]
    InvalidPlayer(String),
}

/// Reference to a playable clip, valid for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaybackHandle(PathBuf);

impl PlaybackHandle {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    /// Location of the WAV file behind this handle.
    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Where generated clips are kept and played.
#[cfg_attr(test, mockall::automock)]
pub trait AudioOutput {
    /// Store a WAV clip and return a handle to it.
    fn register(&mut self, wav: &[u8]) -> Result<PlaybackHandle, PlaybackError>;

    /// Start playing a clip at the given rate, replacing any current playback.
    fn play(&mut self, handle: &PlaybackHandle, rate: f32) -> Result<(), PlaybackError>;

    /// Free the resources behind a handle.
    fn release(&mut self, handle: &PlaybackHandle);
}

/// Session-scoped clip storage backed by a temporary directory.
///
/// Clips are played by an optional external command such as
/// `"mpv --speed={rate}"`. `{path}` and `{rate}` placeholders are
/// substituted; without `{path}` the clip path is appended.
pub struct SessionAudio {
    dir: TempDir,
    player: Option<Vec<String>>,
    current: Option<Child>,
    next_clip: u64,
}

impl SessionAudio {
    /// Create the session directory and parse the player command.
    pub fn new(player: Option<&str>) -> Result<Self, PlaybackError> {
        let player = match player {
            Some(command) => {
                let words = shell_words::split(command)
                    .map_err(|e| PlaybackError::InvalidPlayer(e.to_string()))?;
                if words.is_empty() {
                    None
                } else {
                    Some(words)
                }
            }
            None => None,
        };

        let dir = tempfile::Builder::new().prefix("echovocal-").tempdir()?;
        debug!(dir = %dir.path().display(), "session audio directory created");

        Ok(Self {
            dir,
            player,
            current: None,
            next_clip: 0,
        })
    }

    /// Directory holding this session's clips.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    /// Block until the current playback, if any, finishes.
    pub fn wait(&mut self) -> Result<(), PlaybackError> {
        if let Some(mut child) = self.current.take() {
            let status = child.wait()?;
            if !status.success() {
                warn!(%status, "player exited with failure");
            }
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.current.take() {
            // the player may already have exited
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Build the player argument list for a clip.
pub fn player_args(template: &[String], path: &Path, rate: f32) -> Vec<String> {
    let path = path.display().to_string();
    let rate = rate.to_string();

    let mut args: Vec<String> = template
        .iter()
        .map(|word| word.replace("{path}", &path).replace("{rate}", &rate))
        .collect();

    if !template.iter().any(|word| word.contains("{path}")) {
        args.push(path);
    }

    args
}

impl AudioOutput for SessionAudio {
    fn register(&mut self, wav: &[u8]) -> Result<PlaybackHandle, PlaybackError> {
        self.next_clip += 1;
        let path = self.dir.path().join(format!("clip-{:04}.wav", self.next_clip));
        std::fs::write(&path, wav)?;

        Ok(PlaybackHandle::new(path))
    }

    fn play(&mut self, handle: &PlaybackHandle, rate: f32) -> Result<(), PlaybackError> {
        let Some(template) = &self.player else {
            debug!(path = %handle.path().display(), "no player configured");
            return Ok(());
        };

        let args = player_args(template, handle.path(), rate);
        self.stop();

        debug!(?args, "starting player");
        let child = Command::new(&args[0]).args(&args[1..]).spawn()?;
        self.current = Some(child);

        Ok(())
    }

    fn release(&mut self, handle: &PlaybackHandle) {
        if let Err(e) = std::fs::remove_file(handle.path()) {
            warn!(path = %handle.path().display(), error = %e, "failed to release clip");
        }
    }
}

impl Drop for SessionAudio {
    fn drop(&mut self) {
        self.stop();
    }
}
