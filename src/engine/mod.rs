//! engine
//!
//! The commit pipeline: resolve -> plan -> synthesize -> mutate.
//!
//! # Architecture
//!
//! - [`resolve`]: one round trip for the acting user, the default branch,
//!   the target branch and the parent ref, across a fork and its upstream
//!   when committing to a fork
//! - [`policy`]: pure decision of parent commit and ref mutation
//! - [`synthesize`]: blob uploads, tree, commit and change count
//! - [`orchestrate`]: the public operations tying the stages together
//!
//! # Invariants
//!
//! - Each operation creates at most one commit and mutates at most one ref;
//!   `fork_commit` may also create the fork
//! - Every refusal (validation, discovery, policy) happens before the first upload
//! - A commit that changes nothing never moves a branch
//! - No remote call is retried
//!
//! # Example
//!
//! ```ignore
//! use ghcommit::engine::{commit_to_branch, CommitOptions};
//! use ghcommit::files::LocalFileSystem;
//!
//! let options = CommitOptions::new("octocat/hello-world".parse()?, "Update docs", vec!["docs".into()]);
//! let outcome = commit_to_branch(service.as_ref(), &LocalFileSystem::new("."), &options).await?;
//! println!("{}", outcome);
//! ```

pub mod error;
pub mod orchestrate;
pub mod policy;
pub mod resolve;
pub mod synthesize;

pub use error::{DiscoveryError, EngineError, PolicyError, SynthesisError};
pub use orchestrate::{
    commit_to_branch, create_branch, fork_commit, update_branch, CommitOptions, CommitOutcome,
};
pub use policy::{BranchIntent, BranchPlan, ParentSelection, RefMutation};
pub use synthesize::{DEFAULT_UPLOAD_CONCURRENCY, MAX_UPLOAD_CONCURRENCY};
