//! cli
//!
//! Command-line interface layer for ghcommit.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Merge flags, environment and config file into engine options
//! - Delegate to command handlers and print the outcome
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] orchestrators. All remote changes flow through the
//! engine's pipeline.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;

use crate::ui::output::{self, Verbosity};

/// Run the CLI application with parsed arguments.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    output::init_logging(verbosity);

    commands::dispatch(cli, verbosity)
}
