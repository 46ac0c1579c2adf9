//! forge::factory
//!
//! Service creation from resolved connection settings.
//!
//! # Design
//!
//! Commands call [`create_service`] instead of constructing a client
//! directly, so the orchestrators only ever see `dyn GitService`.
//!
//! # Example
//!
//! ```ignore
//! use ghcommit::forge::{create_service, ServiceOptions};
//!
//! let service = create_service(&ServiceOptions {
//!     token: "ghp_token".into(),
//!     api_base: None,
//!     timeout: None,
//! })?;
//! ```

use std::time::Duration;

use super::github::{GitHubService, DEFAULT_API_BASE};
use super::traits::{ForgeError, GitService};

/// Connection settings for the remote service.
#[derive(Clone, Default)]
pub struct ServiceOptions {
    /// API token; never logged.
    pub token: String,
    /// REST base URL; `None` means github.com.
    pub api_base: Option<String>,
    /// Per-request timeout; `None` leaves the HTTP client default.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ServiceOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceOptions")
            .field("has_token", &!self.token.is_empty())
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Create the remote Git service.
///
/// # Errors
///
/// - `AuthRequired` if the token is empty
/// - `NetworkError` if the HTTP client cannot be built
pub fn create_service(options: &ServiceOptions) -> Result<Box<dyn GitService>, ForgeError> {
    if options.token.trim().is_empty() {
        return Err(ForgeError::AuthRequired);
    }

    let api_base = options.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
    let mut service = GitHubService::with_api_base(options.token.trim(), api_base);
    if let Some(timeout) = options.timeout {
        service = service.with_timeout(timeout)?;
    }
    tracing::debug!(?service, "created git service");
    Ok(Box::new(service))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        let result = create_service(&ServiceOptions {
            token: "  ".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ForgeError::AuthRequired)));
    }

    #[test]
    fn creates_github_service() {
        let service = create_service(&ServiceOptions {
            token: "ghp_test".into(),
            api_base: Some("https://github.example.com/api/v3".into()),
            timeout: Some(Duration::from_secs(10)),
        })
        .unwrap();
        assert_eq!(service.name(), "github");
    }

    #[test]
    fn debug_hides_token() {
        let options = ServiceOptions {
            token: "ghp_secret".into(),
            ..Default::default()
        };
        assert!(!format!("{:?}", options).contains("ghp_secret"));
    }
}
