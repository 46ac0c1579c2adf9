//! ghcommit - Commit local files to a GitHub branch through the Git Data API
//!
//! ghcommit builds a commit entirely through the remote object API (blobs,
//! trees, commits and refs) without cloning the repository or running Git.
//! Given local files and a target branch, it layers the files onto an
//! existing tree, creates one commit and points the branch at it.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Resolve -> plan -> synthesize -> mutate pipeline
//! - [`core`] - Domain types and configuration
//! - [`files`] - Local file discovery and content access
//! - [`forge`] - Remote Git service abstraction (GitHub, in-memory mock)
//! - [`ui`] - Log setup and output
//!
//! # Guarantees
//!
//! 1. Each invocation creates at most one commit and mutates at most one ref
//! 2. Refusals happen before any object is uploaded
//! 3. A commit that changes nothing never moves a branch
//! 4. Fast-forward updates are never forced

pub mod cli;
pub mod core;
pub mod engine;
pub mod files;
pub mod forge;
pub mod ui;
