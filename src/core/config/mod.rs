//! core::config
//!
//! Configuration file loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment (`GITHUB_API`, handled with the CLI flags)
//! 4. CLI flags (not handled here)
//!
//! The token is only ever taken from `--token` or `GITHUB_TOKEN`.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$GHCOMMIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ghcommit/config.toml`
//! 3. `~/.ghcommit/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use ghcommit::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("uploads in flight: {}", config.upload_concurrency());
//! if let Some(path) = config.loaded_from() {
//!     println!("loaded from {}", path.display());
//! }
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::engine::DEFAULT_UPLOAD_CONCURRENCY;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GHCOMMIT_CONFIG";

/// Request timeout when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: FileConfig,
    /// Path the file was loaded from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated. A missing file is not an error (defaults are used).
    pub fn load() -> Result<Self, ConfigError> {
        let found = find_config_file(
            std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            dirs::home_dir(),
        );
        match found {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn api_url(&self) -> Option<&str> {
        self.file.api_url.as_deref()
    }

    pub fn upload_concurrency(&self) -> usize {
        self.file
            .upload_concurrency
            .unwrap_or(DEFAULT_UPLOAD_CONCURRENCY)
    }

    pub fn request_timeout(&self) -> Duration {
        self.file
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn no_file_mode(&self) -> bool {
        self.file.no_file_mode.unwrap_or(false)
    }

    /// Path the configuration was loaded from, if a file was found.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Pick the first existing config file among the standard locations.
fn find_config_file(
    explicit: Option<PathBuf>,
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    [
        explicit,
        xdg_config_home.map(|dir| dir.join("ghcommit/config.toml")),
        home.map(|dir| dir.join(".ghcommit/config.toml")),
    ]
    .into_iter()
    .flatten()
    .find(|path| path.exists())
}
