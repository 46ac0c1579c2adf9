//! forge::traits
//!
//! The remote Git service seen by the commit pipeline.
//!
//! # Design
//!
//! The `GitService` trait is async because every method is a network round
//! trip. Each call is independent and single-shot: implementations must not
//! retry, since the pipeline's failure semantics assume that an error means
//! nothing further happened on that call. The one wait allowed is in
//! [`GitService::create_fork`], which polls until the new fork is readable.
//!
//! The surface is deliberately small: object creation (blob, tree, commit),
//! ref creation/update, one batched state query, one change-count query and
//! forking.
//!
//! # Example
//!
//! ```ignore
//! use ghcommit::forge::{GitService, NewBlob};
//!
//! async fn upload(service: &dyn GitService, repo: &RepositoryId) -> Result<(), ForgeError> {
//!     let sha = service
//!         .create_blob(NewBlob {
//!             repository: repo.clone(),
//!             content: "aGVsbG8=".to_string(),
//!         })
//!         .await?;
//!     println!("uploaded blob {}", sha);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{
    BlobSha, BranchName, CommitAuthor, CommitSha, FileMode, RefName, RefQualifiedName,
    RepositoryId, TreeSha,
};

/// Errors from remote service operations.
///
/// These map to the common failure modes of a hosted Git API.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// No token was configured.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The repository or object was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code (200 for GraphQL-level errors)
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error, including request timeouts.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Request to create a blob.
#[derive(Debug, Clone)]
pub struct NewBlob {
    pub repository: RepositoryId,
    /// Base64-encoded content.
    pub content: String,
}

/// One entry of a new tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub blob: BlobSha,
    pub mode: FileMode,
}

/// Request to create a tree.
///
/// With a base tree the entries add to or override paths of the base; without
/// one the entries form the whole tree.
#[derive(Debug, Clone)]
pub struct NewTree {
    pub repository: RepositoryId,
    pub base_tree: Option<TreeSha>,
    pub entries: Vec<TreeEntry>,
}

/// Request to create a commit with zero or one parent.
#[derive(Debug, Clone)]
pub struct NewCommit {
    pub repository: RepositoryId,
    pub message: String,
    pub parent: Option<CommitSha>,
    pub tree: TreeSha,
    pub author: Option<CommitAuthor>,
    pub committer: Option<CommitAuthor>,
}

/// Request to point a branch at a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBranch {
    pub repository: RepositoryId,
    pub branch: BranchName,
    pub commit: CommitSha,
}

/// Request to move an existing branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchUpdate {
    pub target: NewBranch,
    /// Allow a non-fast-forward move.
    pub force: bool,
}

/// Input of the batched repository state query.
#[derive(Debug, Clone)]
pub struct RepositoryQuery {
    pub repository: RepositoryId,
    /// Repository holding the default branch and the parent ref, when it is
    /// not `repository` itself (a fork's upstream).
    pub parent_repository: Option<RepositoryId>,
    /// Named branch to look up; `None` targets the default branch.
    pub branch: Option<BranchName>,
    /// Ref to base the commit on, if any.
    pub parent_ref: Option<RefName>,
}

impl RepositoryQuery {
    /// True if the default branch and parent ref live in another repository.
    pub fn crosses_repositories(&self) -> bool {
        self.parent_repository
            .as_ref()
            .is_some_and(|parent| parent != &self.repository)
    }
}

/// Commit and tree a ref currently points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefTip {
    pub commit: CommitSha,
    pub tree: TreeSha,
}

/// The default branch of the repository the parent is taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultBranchState {
    pub name: BranchName,
    pub tip: RefTip,
}

/// A resolved parent ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRefState {
    pub qualified_name: RefQualifiedName,
    pub tip: RefTip,
    /// Whether this ref's tip equals or descends from the tip of the target
    /// (the named branch if it exists, else the default branch). `None` when
    /// there is no target tip to compare against, or when the ref lives in
    /// another repository than the target.
    pub descends_from_target: Option<bool>,
}

/// Result of the batched repository state query.
///
/// Each record is independently absent: a missing branch or ref is `None`,
/// never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryState {
    pub viewer_login: String,
    pub default_branch: Option<DefaultBranchState>,
    pub target_branch: Option<RefTip>,
    pub parent_ref: Option<ParentRefState>,
}

/// The remote Git service used by the commit pipeline.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; blob uploads are issued
/// concurrently against a shared reference.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Absence of a branch or ref in
/// [`query_repository`](GitService::query_repository) is data, not an error;
/// only an unreadable repository fails that call.
#[async_trait]
pub trait GitService: Send + Sync {
    /// Service name for log lines (e.g., "github").
    fn name(&self) -> &'static str;

    /// Fetch viewer, default branch, target branch and parent ref in one round trip.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the repository does not exist or is not visible
    /// - `AuthFailed` if the token is rejected
    async fn query_repository(
        &self,
        query: RepositoryQuery,
    ) -> Result<RepositoryState, ForgeError>;

    /// Upload file content and return the blob id.
    async fn create_blob(&self, blob: NewBlob) -> Result<BlobSha, ForgeError>;

    /// Create a tree and return its id.
    ///
    /// # Errors
    ///
    /// - `ApiError` with status 422 if a blob or the base tree does not exist
    async fn create_tree(&self, tree: NewTree) -> Result<TreeSha, ForgeError>;

    /// Create a commit object and return its id.
    async fn create_commit(&self, commit: NewCommit) -> Result<CommitSha, ForgeError>;

    /// Number of files the commit changes relative to its parent.
    async fn changed_files(
        &self,
        repository: &RepositoryId,
        commit: &CommitSha,
    ) -> Result<usize, ForgeError>;

    /// Create a branch pointing at a commit.
    ///
    /// # Errors
    ///
    /// - `ApiError` with status 422 if the branch already exists
    async fn create_branch(&self, branch: NewBranch) -> Result<(), ForgeError>;

    /// Move an existing branch to a commit; without `force` the move must be
    /// a fast-forward.
    ///
    /// # Errors
    ///
    /// - `ApiError` with status 422 if `force` is false and the update is not a fast-forward
    async fn update_branch(&self, update: BranchUpdate) -> Result<(), ForgeError>;

    /// Fork a repository into the token user's account and return the fork.
    ///
    /// An existing fork is returned as is. The call returns once the fork's
    /// default branch can be read.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the repository does not exist or is not visible
    /// - `NetworkError` if the fork does not become readable in time
    async fn create_fork(&self, repository: &RepositoryId) -> Result<RepositoryId, ForgeError>;
}
