//! Line-based interactive session.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::args::{parse_pitch, parse_speed};
use crate::backend::Backend;
use crate::engine::{Emotion, VoiceSelector};
use crate::session::{AudioOutput, Session};

const HELP: &str = "\
Type text to speak it, or one of:
  /voice <name>      kore, puck, charon, fenrir, zephyr or custom
  /emotion <name>    neutral, cheerful, serious, calm, excited, whispering, sad, angry, friendly
  /speed <x>         speed multiplier, 0.5 to 2.0
  /pitch <n>         pitch offset, -10 to 10
  /describe [text]   describe the voice (empty clears)
  /ref <file>        attach reference audio to mimic (max 10 MiB)
  /unref             remove reference audio
  /history           list generated clips
  /play <n>          play clip n
  /save <n> [path]   save clip n as WAV
  /clear             clear history
  /key <key>         store a new API key
  /config            show current settings
  /quit              leave";

/// A parsed REPL input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Say(String),
    Voice(VoiceSelector),
    Emotion(Emotion),
    Speed(f32),
    Pitch(i8),
    Describe(String),
    Reference(PathBuf),
    Unreference,
    History,
    Play(usize),
    Save(usize, Option<PathBuf>),
    Clear,
    Key(String),
    Config,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    ///
    /// Lines not starting with `/` are text to speak. History indices are
    /// 1-based, as listed by `/history`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let Some(command) = line.strip_prefix('/') else {
            return Ok(Some(Command::Say(line.to_string())));
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        let parsed = match name.to_ascii_lowercase().as_str() {
            "voice" => Command::Voice(rest.parse::<VoiceSelector>().map_err(|e| e.to_string())?),
            "emotion" => Command::Emotion(rest.parse::<Emotion>().map_err(|e| e.to_string())?),
            "speed" => Command::Speed(parse_speed(rest)?),
            "pitch" => Command::Pitch(parse_pitch(rest)?),
            "describe" => Command::Describe(rest.to_string()),
            "ref" => {
                if rest.is_empty() {
                    return Err("Usage: /ref <file>".to_string());
                }
                Command::Reference(PathBuf::from(rest))
            }
            "unref" => Command::Unreference,
            "history" => Command::History,
            "play" => Command::Play(parse_index(rest)?),
            "save" => {
                let (index, path) = match rest.split_once(char::is_whitespace) {
                    Some((index, path)) => (index, Some(PathBuf::from(path.trim()))),
                    None => (rest, None),
                };
                Command::Save(parse_index(index)?, path)
            }
            "clear" => Command::Clear,
            "key" => {
                if rest.is_empty() {
                    return Err("Usage: /key <api key>".to_string());
                }
                Command::Key(rest.to_string())
            }
            "config" => Command::Config,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(format!(
                    "Unknown command '/{other}'. Type /help for a list."
                ));
            }
        };

        Ok(Some(parsed))
    }
}

fn parse_index(input: &str) -> Result<usize, String> {
    match input.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("'{input}' is not a clip number")),
    }
}

fn entry_id<B: Backend, O: AudioOutput>(session: &Session<B, O>, index: usize) -> Option<Uuid> {
    session.history().get(index - 1).map(|e| e.id)
}

/// Run the interactive loop until `/quit` or end of input.
///
/// Clips saved without an explicit path go to `save_dir`.
pub fn run<B, O, R, W>(
    session: &mut Session<B, O>,
    input: R,
    out: &mut W,
    save_dir: &Path,
) -> io::Result<()>
where
    B: Backend,
    O: AudioOutput,
    R: BufRead,
    W: Write,
{
    writeln!(out, "echovocal interactive session. Type /help for commands.")?;
    if session.credential().is_none() {
        writeln!(out, "No API key set. Use /key <key> to store one.")?;
    }

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        match Command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => execute(session, command, out, save_dir)?,
            Err(message) => writeln!(out, "{message}")?,
        }

        if session.needs_credential() {
            writeln!(out, "Enter a new API key (blank keeps the current one):")?;
            write!(out, "key> ")?;
            out.flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            match session.save_credential(&line?) {
                Ok(true) => writeln!(out, "API key saved.")?,
                Ok(false) => session.dismiss_credential_prompt(),
                Err(e) => writeln!(out, "Error: {e}")?,
            }
        }
    }

    Ok(())
}

fn execute<B, O, W>(
    session: &mut Session<B, O>,
    command: Command,
    out: &mut W,
    save_dir: &Path,
) -> io::Result<()>
where
    B: Backend,
    O: AudioOutput,
    W: Write,
{
    match command {
        Command::Say(text) => {
            writeln!(out, "Generating speech...")?;
            match session.generate(&text) {
                Ok(entry) => writeln!(
                    out,
                    "[1] {} ({:.1}s) {}",
                    entry.short_id(),
                    entry.audio.duration_secs(),
                    entry.preview
                )?,
                Err(e) => writeln!(out, "Error: {e}")?,
            }
        }
        Command::Voice(voice) => {
            session.config_mut().voice = voice;
            writeln!(out, "Voice: {voice}")?;
            let config = session.config();
            if voice == VoiceSelector::Custom
                && config.description.trim().is_empty()
                && config.reference.is_none()
            {
                writeln!(out, "Describe the voice with /describe or attach a clip with /ref.")?;
            }
        }
        Command::Emotion(emotion) => {
            session.config_mut().emotion = emotion;
            writeln!(out, "Emotion: {emotion}")?;
        }
        Command::Speed(speed) => {
            session.config_mut().speed = speed;
            writeln!(out, "Speed: {speed:.1}x")?;
        }
        Command::Pitch(pitch) => {
            session.config_mut().pitch = pitch;
            writeln!(out, "Pitch: {pitch:+}")?;
        }
        Command::Describe(description) => {
            session.config_mut().description = description;
            writeln!(out, "Description updated.")?;
        }
        Command::Reference(path) => match session.attach_reference(&path) {
            Ok(()) => writeln!(out, "Reference audio: {}", path.display())?,
            Err(e) => writeln!(out, "Error: {e}")?,
        },
        Command::Unreference => {
            session.remove_reference();
            writeln!(out, "Reference audio removed.")?;
        }
        Command::History => {
            if session.history().is_empty() {
                writeln!(out, "History is empty.")?;
            }
            let active = session.active().map(|e| e.id);
            for (i, entry) in session.history().iter().enumerate() {
                let marker = if Some(entry.id) == active { '*' } else { ' ' };
                writeln!(
                    out,
                    "{marker}[{}] {} {} {} ({:.1}s) {}",
                    i + 1,
                    entry.short_id(),
                    entry.created_at.format("%H:%M:%S"),
                    entry.config.voice,
                    entry.audio.duration_secs(),
                    entry.preview
                )?;
            }
        }
        Command::Play(index) => match entry_id(session, index) {
            Some(id) => {
                if let Err(e) = session.play(id) {
                    writeln!(out, "Error: {e}")?;
                }
            }
            None => writeln!(out, "No clip {index}.")?,
        },
        Command::Save(index, path) => match entry_id(session, index) {
            Some(id) => {
                let dest = path.as_deref().unwrap_or(save_dir);
                match session.export(id, dest) {
                    Ok(saved) => writeln!(out, "Audio saved to: {}", saved.display())?,
                    Err(e) => writeln!(out, "Error: {e}")?,
                }
            }
            None => writeln!(out, "No clip {index}.")?,
        },
        Command::Clear => {
            session.clear_history();
            writeln!(out, "History cleared.")?;
        }
        Command::Key(key) => match session.save_credential(&key) {
            Ok(_) => writeln!(out, "API key saved.")?,
            Err(e) => writeln!(out, "Error: {e}")?,
        },
        Command::Config => {
            let config = session.config();
            writeln!(out, "  Voice: {}", config.voice)?;
            writeln!(out, "  Emotion: {}", config.emotion)?;
            writeln!(out, "  Speed: {:.1}x", config.speed)?;
            writeln!(out, "  Pitch: {:+}", config.pitch)?;
            writeln!(out, "  Description: {}", config.description)?;
            match &config.reference {
                Some(reference) => writeln!(
                    out,
                    "  Reference: {} ({}, {} bytes)",
                    reference.file_name,
                    reference.mime_type,
                    reference.data.len()
                )?,
                None => writeln!(out, "  Reference: none")?,
            }
            let key = if session.credential().is_some() { "set" } else { "not set" };
            writeln!(out, "  API key: {key}")?;
        }
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Quit => {}
    }

    Ok(())
}
