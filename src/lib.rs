//! echovocal: voice cloning and text-to-speech CLI.
//!
//! This crate provides a command-line front-end for the Gemini speech
//! models: it shapes synthesis requests from text and voice settings,
//! decodes the returned PCM audio into WAV files and keeps a history of
//! generated clips for the session.

pub mod audio;
pub mod backend;
pub mod cli;
pub mod engine;
pub mod session;
pub mod store;
