//! engine::error
//!
//! Stage-identifying errors of the commit pipeline.
//!
//! Every failure names the stage it happened in (validation, discovery,
//! fork, resolution, policy, synthesis, mutation) and carries the path, ref or
//! object id involved. Nothing here is retried. "Nothing to commit" and
//! "dry run" are not errors; see [`CommitOutcome`](super::CommitOutcome).

use thiserror::Error;

use crate::core::types::{BranchName, CommitSha, RefName, RepositoryId};
use crate::files::FileError;
use crate::forge::ForgeError;

/// Errors from the commit pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid input, detected before any I/O.
    #[error("invalid arguments: {0}")]
    Validation(String),

    /// Local files could not be listed.
    #[error("file discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// The repository could not be forked.
    #[error("could not fork {repository}")]
    Fork {
        repository: RepositoryId,
        #[source]
        source: ForgeError,
    },

    /// The repository state could not be read.
    #[error("could not resolve the state of {repository}")]
    Resolution {
        repository: RepositoryId,
        #[source]
        source: ForgeError,
    },

    /// The requested branch operation is not allowed in the current state.
    #[error("refused: {0}")]
    Policy(#[from] PolicyError),

    /// Blob, tree or commit creation failed.
    #[error("commit synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// The branch ref could not be created or moved.
    #[error("could not {action} branch {branch} to {commit}")]
    Mutation {
        action: &'static str,
        branch: BranchName,
        commit: CommitSha,
        #[source]
        source: ForgeError,
    },
}

/// Errors from file discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Files(#[from] FileError),

    #[error("no file found in the given paths")]
    NoFiles,
}

/// Branch policy violations, all detected before any upload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("branch {0} already exists")]
    BranchExists(BranchName),

    #[error("branch {0} does not exist")]
    BranchMissing(BranchName),

    #[error("parent ref {0} does not exist or does not point at a commit")]
    ParentRefNotFound(RefName),

    #[error("repository has no default branch")]
    NoDefaultBranch,
}

/// Errors from building the commit.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("could not read {path}")]
    ReadFile {
        path: String,
        #[source]
        source: FileError,
    },

    #[error("could not upload {path}")]
    CreateBlob {
        path: String,
        #[source]
        source: ForgeError,
    },

    #[error("could not create a tree of {entries} entries")]
    CreateTree {
        entries: usize,
        #[source]
        source: ForgeError,
    },

    #[error("could not create a commit")]
    CreateCommit {
        #[source]
        source: ForgeError,
    },

    #[error("could not count the changed files of {commit}")]
    ChangedFiles {
        commit: CommitSha,
        #[source]
        source: ForgeError,
    },
}
