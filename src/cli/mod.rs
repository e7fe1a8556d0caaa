//! Command-line interface for prompt-golf.
//!
//! Provides challenge validation and catalog inspection commands.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
