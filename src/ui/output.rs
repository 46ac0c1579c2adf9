//! ui::output
//!
//! Output formatting, display and log setup.
//!
//! # Design
//!
//! Progress is reported through `tracing` events on stderr, filtered by the
//! verbosity flags (or `RUST_LOG` when set). Final results go to stdout
//! through [`success`], errors to stderr through [`error`].

use std::fmt::Display;

use tracing_subscriber::EnvFilter;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - warnings and errors only
    Quiet,
    /// Normal mode - progress lines
    Normal,
    /// Debug mode - request and decision detail
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Default log filter directive for this level.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "ghcommit=info,warn",
            Verbosity::Debug => "ghcommit=debug,info",
        }
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` overrides the verbosity-derived filter. Calling this twice is
/// harmless; the second call leaves the first subscriber in place.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity == Verbosity::Debug)
        .without_time()
        .try_init();
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}
