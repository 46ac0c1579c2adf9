//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Validation
//!
//! Values are validated after parsing: the API URL must be an http(s) URL,
//! the upload concurrency must lie in `1..=32` and the request timeout must
//! be positive. Unknown keys are rejected, which also keeps a `token` key
//! out of the file.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::engine::MAX_UPLOAD_CONCURRENCY;

/// Contents of `config.toml`.
///
/// # Example
///
/// ```toml
/// api_url = "https://github.example.com/api/v3"
/// upload_concurrency = 8
/// request_timeout_secs = 30
/// no_file_mode = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// REST API base URL (GitHub Enterprise)
    pub api_url: Option<String>,

    /// Blob uploads in flight at once
    pub upload_concurrency: Option<usize>,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: Option<u64>,

    /// Ignore executable bits of local files
    pub no_file_mode: Option<bool>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.api_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "api_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }

        if let Some(n) = self.upload_concurrency {
            if !(1..=MAX_UPLOAD_CONCURRENCY).contains(&n) {
                return Err(ConfigError::InvalidValue(format!(
                    "upload_concurrency must be between 1 and {}, got {}",
                    MAX_UPLOAD_CONCURRENCY, n
                )));
            }
        }

        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "request_timeout_secs must be positive".into(),
            ));
        }

        Ok(())
    }
}
