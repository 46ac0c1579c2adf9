//! create-branch command - Create a branch with a commit of the given files

use anyhow::{Context as _, Result};

use super::{build_options, execute, Operation, Context};
use crate::cli::args::CommitArgs;
use crate::core::types::BranchName;
use crate::engine::BranchIntent;

/// Create `branch`. Fails if it already exists.
///
/// Without `--parent` or `--no-parent` the branch starts from the default branch.
pub fn create_branch(ctx: &Context, branch: String, args: CommitArgs) -> Result<()> {
    let branch = BranchName::new(branch).context("invalid --branch")?;
    let options = build_options(ctx, Some(branch), args)?;
    execute(ctx, Operation::Commit(BranchIntent::CreateOnly), options)
}
