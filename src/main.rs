//! echovocal CLI entry point.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use echovocal::backend::{Backend, create_backend};
use echovocal::cli::{Args, repl};
use echovocal::engine::Credential;
use echovocal::session::{Session, SessionAudio};
use echovocal::store::CredentialStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(args.verbose);

    let store = match &args.settings {
        Some(path) => CredentialStore::with_path(path.clone()),
        None => CredentialStore::new().context("Failed to locate settings file")?,
    };

    // Handle key storage first
    if let Some(key) = &args.set_key {
        let credential = Credential::new(key).context("API key cannot be empty")?;
        store
            .save(&credential)
            .with_context(|| format!("Failed to save API key to {}", store.path().display()))?;
        println!("API key saved to: {}", store.path().display());

        if args.generate.is_none() && !args.interactive {
            return Ok(());
        }
    }

    let backend = create_backend(&args.endpoint).context("Failed to create API client")?;
    let output = SessionAudio::new(args.player_command()).context("Failed to set up playback")?;
    let fallback = args.api_key.as_deref().and_then(Credential::new);

    let mut session = Session::new(backend, output, store, fallback);
    *session.config_mut() = args.synthesis_config();

    if let Some(path) = &args.reference {
        session
            .attach_reference(path)
            .with_context(|| format!("Failed to load reference audio: {}", path.display()))?;
    }

    if args.interactive {
        let save_dir = match &args.output {
            Some(dir) if dir.is_dir() => dir.clone(),
            _ => PathBuf::from("."),
        };
        let stdin = io::stdin();
        repl::run(&mut session, stdin.lock(), &mut io::stdout(), &save_dir)
            .context("Interactive session failed")?;
        return Ok(());
    }

    if let Some(text) = &args.generate {
        return generate_speech(&mut session, text, args.output.as_deref());
    }

    eprintln!("No action specified. Use -g to generate speech or -i for an interactive session.");
    eprintln!("Run with --help for usage information.");

    Ok(())
}

fn setup_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn generate_speech<B: Backend>(
    session: &mut Session<B, SessionAudio>,
    text: &str,
    output: Option<&Path>,
) -> Result<()> {
    let config = session.config();
    println!("Generating speech...");
    println!("  Voice: {}", config.voice);
    println!("  Emotion: {}", config.emotion);
    println!("  Speed: {:.1}x", config.speed);
    println!("  Pitch: {:+}", config.pitch);
    if let Some(reference) = &config.reference {
        println!("  Reference: {}", reference.file_name);
    }

    let (id, duration, size) = match session.generate(text) {
        Ok(entry) => (entry.id, entry.audio.duration_secs(), entry.audio.wav.len()),
        Err(e) => {
            if e.needs_credential_prompt() {
                eprintln!("Store a working API key with: echovocal --set-key <KEY>");
            }
            bail!("Failed to synthesize speech: {e}");
        }
    };

    let dest = output.unwrap_or(Path::new("."));
    let path = session
        .export(id, dest)
        .with_context(|| format!("Failed to write audio to: {}", dest.display()))?;

    println!("Audio saved to: {}", path.display());
    println!("  Size: {size} bytes");
    println!("  Duration: {duration:.2}s");

    // Let autoplay finish before the session directory goes away
    if session.output().has_player() {
        session
            .output_mut()
            .wait()
            .context("Audio playback failed")?;
    }

    Ok(())
}
