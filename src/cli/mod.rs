//! CLI argument parsing and the interactive session loop.

mod args;
pub mod repl;

pub use args::{Args, parse_pitch, parse_speed};
pub use repl::Command;
