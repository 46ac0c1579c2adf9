//! update-branch command - Commit files to an existing branch

use anyhow::Result;

use super::{build_options, execute, Operation, parse_branch, Context};
use crate::cli::args::CommitArgs;
use crate::engine::BranchIntent;

/// Update `branch` (default branch when `None`). Fails if it does not exist.
pub fn update_branch(ctx: &Context, branch: Option<String>, args: CommitArgs) -> Result<()> {
    let branch = parse_branch(branch)?;
    let options = build_options(ctx, branch, args)?;
    execute(ctx, Operation::Commit(BranchIntent::UpdateOnly), options)
}
