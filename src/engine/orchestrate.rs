//! engine::orchestrate
//!
//! The entry points of the pipeline: commit to a branch, create a branch,
//! update a branch, and commit to a branch of a fork.
//!
//! # Stages
//!
//! ```text
//! validate -> discover files -> [fork] -> resolve state -> plan -> synthesize
//!          -> [nothing to commit] -> [dry run] -> mutate ref
//! ```
//!
//! Validation, discovery, resolution and policy all run before the first
//! upload, so a refused operation creates no remote object. The two
//! short-circuits after synthesis are successes, reported as distinct
//! [`CommitOutcome`] variants. The fork stage only runs for [`fork_commit`],
//! after local validation and discovery succeed.

use std::fmt;
use std::path::PathBuf;

use super::error::{DiscoveryError, EngineError};
use super::policy::{self, BranchIntent, ParentSelection, RefMutation};
use super::resolve::resolve;
use super::synthesize::{
    synthesize, SynthesisRequest, DEFAULT_UPLOAD_CONCURRENCY, MAX_UPLOAD_CONCURRENCY,
};
use crate::core::types::{BranchName, CommitAuthor, CommitSha, FileEntry, RepositoryId};
use crate::files::FileSystem;
use crate::forge::{BranchUpdate, GitService, NewBranch};

/// Everything a commit operation needs.
#[derive(Debug, Clone)]
pub struct CommitOptions {
    pub repository: RepositoryId,
    /// Repository whose default branch and refs the parent is taken from;
    /// `None` means `repository`. Requires a named `branch`.
    pub parent_repository: Option<RepositoryId>,
    /// Target branch; `None` targets the default branch.
    pub branch: Option<BranchName>,
    pub parent: ParentSelection,
    pub message: String,
    /// Files or directories, relative to the file system's base directory.
    pub paths: Vec<PathBuf>,
    pub author: Option<CommitAuthor>,
    pub committer: Option<CommitAuthor>,
    pub no_file_mode: bool,
    /// Build the commit but leave the branch untouched.
    pub dry_run: bool,
    pub upload_concurrency: usize,
}

impl CommitOptions {
    /// Options with the default parent selection and concurrency.
    pub fn new(repository: RepositoryId, message: impl Into<String>, paths: Vec<PathBuf>) -> Self {
        Self {
            repository,
            parent_repository: None,
            branch: None,
            parent: ParentSelection::FastForward,
            message: message.into(),
            paths,
            author: None,
            committer: None,
            no_file_mode: false,
            dry_run: false,
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }

    fn validate(&self, intent: BranchIntent) -> Result<(), EngineError> {
        let invalid = |msg: &str| Err(EngineError::Validation(msg.to_string()));

        if !self.repository.is_valid() {
            return invalid("repository owner and name are required");
        }
        if let Some(parent) = &self.parent_repository {
            if !parent.is_valid() {
                return invalid("parent repository owner and name are required");
            }
            if self.branch.is_none() {
                return invalid("a branch name is required to commit from another repository");
            }
        }
        if self.message.trim().is_empty() {
            return invalid("commit message is required");
        }
        if self.paths.is_empty() {
            return invalid("at least one path is required");
        }
        if intent == BranchIntent::CreateOnly && self.branch.is_none() {
            return invalid("a branch name is required to create a branch");
        }
        for (role, identity) in [("author", &self.author), ("committer", &self.committer)] {
            if let Some(identity) = identity {
                if identity.name.trim().is_empty() || identity.email.trim().is_empty() {
                    return Err(EngineError::Validation(format!(
                        "{role} name and email must both be set"
                    )));
                }
            }
        }
        if !(1..=MAX_UPLOAD_CONCURRENCY).contains(&self.upload_concurrency) {
            return Err(EngineError::Validation(format!(
                "upload concurrency must be between 1 and {MAX_UPLOAD_CONCURRENCY}"
            )));
        }
        Ok(())
    }
}

/// Successful result of a commit operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new branch now points at the commit.
    Created {
        branch: BranchName,
        commit: CommitSha,
        changed_files: usize,
    },
    /// An existing branch was moved to the commit.
    Updated {
        branch: BranchName,
        commit: CommitSha,
        changed_files: usize,
        force: bool,
    },
    /// The commit would not change any file; the branch was left alone.
    NothingToCommit { branch: BranchName },
    /// The commit was built but the branch was left alone on request.
    DryRun {
        commit: CommitSha,
        changed_files: usize,
        mutation: RefMutation,
    },
}

impl CommitOutcome {
    /// True if a branch ref was created or moved.
    pub fn mutated(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::Updated { .. })
    }
}

impl fmt::Display for CommitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created {
                branch,
                commit,
                changed_files,
            } => write!(
                f,
                "created branch {} at {} ({} file(s) changed)",
                branch,
                commit.short(),
                changed_files
            ),
            Self::Updated {
                branch,
                commit,
                changed_files,
                force,
            } => write!(
                f,
                "{} branch {} to {} ({} file(s) changed)",
                if *force { "force-updated" } else { "updated" },
                branch,
                commit.short(),
                changed_files
            ),
            Self::NothingToCommit { branch } => {
                write!(f, "nothing to commit, {} is unchanged", branch)
            }
            Self::DryRun {
                commit,
                changed_files,
                mutation,
            } => write!(
                f,
                "dry run: would {} to {} ({} file(s) changed)",
                mutation,
                commit.short(),
                changed_files
            ),
        }
    }
}

/// Commit files onto a branch, creating it if it does not exist.
pub async fn commit_to_branch(
    service: &dyn GitService,
    files: &dyn FileSystem,
    options: &CommitOptions,
) -> Result<CommitOutcome, EngineError> {
    run(service, files, options, BranchIntent::CreateOrUpdate).await
}

/// Commit files onto a new branch. The branch must not exist.
///
/// With `ParentSelection::FastForward` the new branch starts from the
/// default branch.
pub async fn create_branch(
    service: &dyn GitService,
    files: &dyn FileSystem,
    options: &CommitOptions,
) -> Result<CommitOutcome, EngineError> {
    run(service, files, options, BranchIntent::CreateOnly).await
}

/// Commit files onto an existing branch (or the default branch).
pub async fn update_branch(
    service: &dyn GitService,
    files: &dyn FileSystem,
    options: &CommitOptions,
) -> Result<CommitOutcome, EngineError> {
    run(service, files, options, BranchIntent::UpdateOnly).await
}

/// Fork `options.repository` and commit files onto a branch of the fork.
///
/// The branch is created or updated like [`commit_to_branch`] does, but the
/// parent comes from the upstream: its default branch with
/// `ParentSelection::FastForward` when the branch is new, or the named ref
/// with `ParentSelection::FromRef`. An existing fork is reused.
pub async fn fork_commit(
    service: &dyn GitService,
    files: &dyn FileSystem,
    options: &CommitOptions,
) -> Result<CommitOutcome, EngineError> {
    let upstream = options.repository.clone();
    let mut options = CommitOptions {
        parent_repository: Some(upstream.clone()),
        ..options.clone()
    };
    options.validate(BranchIntent::CreateOrUpdate)?;
    let entries = discover(files, &options)?;

    let fork = service
        .create_fork(&upstream)
        .await
        .map_err(|source| EngineError::Fork {
            repository: upstream.clone(),
            source,
        })?;
    tracing::info!("using fork {} of {}", fork, upstream);

    options.repository = fork;
    commit_files(service, files, &options, BranchIntent::CreateOrUpdate, &entries).await
}

async fn run(
    service: &dyn GitService,
    files: &dyn FileSystem,
    options: &CommitOptions,
    intent: BranchIntent,
) -> Result<CommitOutcome, EngineError> {
    options.validate(intent)?;
    let entries = discover(files, options)?;
    commit_files(service, files, options, intent, &entries).await
}

fn discover(
    files: &dyn FileSystem,
    options: &CommitOptions,
) -> Result<Vec<FileEntry>, EngineError> {
    let entries = files
        .find_files(&options.paths)
        .map_err(DiscoveryError::from)?;
    if entries.is_empty() {
        return Err(DiscoveryError::NoFiles.into());
    }
    tracing::debug!(count = entries.len(), "discovered files");
    Ok(entries)
}

async fn commit_files(
    service: &dyn GitService,
    files: &dyn FileSystem,
    options: &CommitOptions,
    intent: BranchIntent,
    entries: &[FileEntry],
) -> Result<CommitOutcome, EngineError> {
    let state = resolve(
        service,
        &options.repository,
        options.parent_repository.as_ref(),
        options.branch.as_ref(),
        options.parent.parent_ref(),
    )
    .await?;
    tracing::info!("logged in as {}", state.viewer_login);

    let plan = policy::plan(&state, options.branch.as_ref(), &options.parent, intent)?;
    match &plan.parent {
        Some(parent) => tracing::info!(
            "basing commit on {} ({})",
            parent.commit.short(),
            options.parent
        ),
        None => tracing::info!("creating a commit with no parent"),
    }

    let synthesized = synthesize(
        service,
        files,
        SynthesisRequest {
            repository: &options.repository,
            parent: plan.parent.as_ref(),
            message: &options.message,
            author: options.author.as_ref(),
            committer: options.committer.as_ref(),
            files: entries,
            no_file_mode: options.no_file_mode,
            upload_concurrency: options.upload_concurrency,
        },
    )
    .await?;

    if synthesized.changed_files == 0 {
        tracing::warn!("nothing to commit: no file differs from the parent");
        return Ok(CommitOutcome::NothingToCommit {
            branch: plan.mutation.branch().clone(),
        });
    }

    if options.dry_run {
        tracing::info!("dry run: not going to {}", plan.mutation);
        return Ok(CommitOutcome::DryRun {
            commit: synthesized.commit,
            changed_files: synthesized.changed_files,
            mutation: plan.mutation,
        });
    }

    let commit = synthesized.commit;
    let changed_files = synthesized.changed_files;
    match plan.mutation {
        RefMutation::Create { branch } => {
            service
                .create_branch(NewBranch {
                    repository: options.repository.clone(),
                    branch: branch.clone(),
                    commit: commit.clone(),
                })
                .await
                .map_err(|source| EngineError::Mutation {
                    action: "create",
                    branch: branch.clone(),
                    commit: commit.clone(),
                    source,
                })?;
            tracing::info!("created branch {} at {}", branch, commit.short());
            Ok(CommitOutcome::Created {
                branch,
                commit,
                changed_files,
            })
        }
        RefMutation::Update { branch, force } => {
            service
                .update_branch(BranchUpdate {
                    target: NewBranch {
                        repository: options.repository.clone(),
                        branch: branch.clone(),
                        commit: commit.clone(),
                    },
                    force,
                })
                .await
                .map_err(|source| EngineError::Mutation {
                    action: "update",
                    branch: branch.clone(),
                    commit: commit.clone(),
                    source,
                })?;
            tracing::info!(force, "updated branch {} to {}", branch, commit.short());
            Ok(CommitOutcome::Updated {
                branch,
                commit,
                changed_files,
                force,
            })
        }
    }
}
