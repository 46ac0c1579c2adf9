//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity, log subscriber setup and result lines
//!
//! # Design
//!
//! All terminal output goes through this module so that `--quiet` and
//! `--debug` behave the same in every command.

pub mod output;
