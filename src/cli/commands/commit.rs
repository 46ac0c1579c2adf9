//! commit command - Commit files to a branch, creating it if absent

use anyhow::Result;

use super::{build_options, execute, Operation, parse_branch, Context};
use crate::cli::args::CommitArgs;
use crate::engine::BranchIntent;

/// Commit files to `branch` (default branch when `None`).
///
/// An absent branch is created from the default branch, or from `--parent`.
pub fn commit(ctx: &Context, branch: Option<String>, args: CommitArgs) -> Result<()> {
    let branch = parse_branch(branch)?;
    let options = build_options(ctx, branch, args)?;
    execute(ctx, Operation::Commit(BranchIntent::CreateOrUpdate), options)
}
