//! fork-commit command - Fork a repository and commit files to a branch of the fork

use anyhow::{Context as _, Result};

use super::{build_options, execute, Context, Operation};
use crate::cli::args::CommitArgs;
use crate::core::types::BranchName;

/// Fork `--owner/--repo` into the token user's account and commit to
/// `branch` of the fork.
///
/// `--parent` names a ref of the upstream repository. Without it a new
/// branch starts from the upstream default branch.
pub fn fork_commit(ctx: &Context, branch: String, args: CommitArgs) -> Result<()> {
    let branch = BranchName::new(branch).context("invalid --branch")?;
    let options = build_options(ctx, Some(branch), args)?;
    execute(ctx, Operation::ForkCommit, options)
}
