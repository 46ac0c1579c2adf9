//! forge
//!
//! Abstraction for the remote Git service (GitHub).
//!
//! # Architecture
//!
//! The `GitService` trait defines every remote call the commit pipeline
//! makes. Commands obtain a service through [`create_service`] rather than
//! importing the GitHub client directly, and tests substitute
//! [`mock::MockGitService`].
//!
//! - Every call is a single attempt; no retries happen at this layer
//! - Absence of a branch or ref is reported as data, not as an error
//!
//! # Modules
//!
//! - `traits`: Core `GitService` trait and request/response types
//! - [`github`]: GitHub implementation using REST and GraphQL APIs
//! - [`mock`]: In-memory implementation for deterministic testing
//! - `factory`: Service creation from connection settings
//!
//! # Example
//!
//! ```ignore
//! use ghcommit::forge::{create_service, GitService, RepositoryQuery, ServiceOptions};
//!
//! let service = create_service(&ServiceOptions {
//!     token,
//!     ..Default::default()
//! })?;
//! let state = service
//!     .query_repository(RepositoryQuery {
//!         repository: "octocat/hello-world".parse()?,
//!         parent_repository: None,
//!         branch: None,
//!         parent_ref: None,
//!     })
//!     .await?;
//! println!("default branch: {:?}", state.default_branch);
//! ```

mod factory;
pub mod github;
pub mod mock;
mod traits;

pub use factory::{create_service, ServiceOptions};
pub use traits::*;
