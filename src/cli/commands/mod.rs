//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each commit command handler:
//! 1. Turns its arguments into [`CommitOptions`] (flags over config file)
//! 2. Calls the matching engine orchestrator through [`Operation`]
//! 3. Prints the outcome
//!
//! Handlers do NOT call the remote service directly.
//!
//! # Async Commands
//!
//! The orchestrators are async because every stage is network I/O. Handlers
//! stay synchronous and drive them on a tokio runtime created per command.

mod commit;
mod completion;
mod create_branch;
mod fork_commit;
mod update_branch;

pub use commit::commit;
pub use completion::completion;
pub use create_branch::create_branch;
pub use fork_commit::fork_commit;
pub use update_branch::update_branch;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::args::{Cli, Command, CommitArgs};
use crate::core::config::Config;
use crate::core::types::{BranchName, CommitAuthor, RefName, RepositoryId};
use crate::engine::{self, BranchIntent, CommitOptions, ParentSelection};
use crate::files::LocalFileSystem;
use crate::forge::{create_service, ServiceOptions};
use crate::ui::output::{self, Verbosity};

/// Settings shared by all commit commands.
#[derive(Debug)]
pub struct Context {
    pub service: ServiceOptions,
    /// Base directory for file paths
    pub directory: PathBuf,
    pub verbosity: Verbosity,
    pub config: Config,
}

impl Context {
    /// Merge global flags with the config file.
    fn from_cli(
        token: Option<String>,
        api: Option<String>,
        directory: Option<PathBuf>,
        verbosity: Verbosity,
    ) -> Result<Self> {
        let config = Config::load().context("could not load configuration")?;
        if let Some(path) = config.loaded_from() {
            tracing::debug!("using config file {}", path.display());
        }

        let service = ServiceOptions {
            token: token.unwrap_or_default(),
            api_base: api.or_else(|| config.api_url().map(str::to_string)),
            timeout: Some(config.request_timeout()),
        };
        Ok(Self {
            service,
            directory: directory.unwrap_or_else(|| PathBuf::from(".")),
            verbosity,
            config,
        })
    }
}

/// The engine entry point a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Commit(BranchIntent),
    ForkCommit,
}

/// Dispatch a parsed command line to its handler.
pub fn dispatch(cli: Cli, verbosity: Verbosity) -> Result<()> {
    let Cli {
        token,
        api,
        directory,
        command,
        ..
    } = cli;

    match command {
        Command::Completion { shell } => completion(shell),
        Command::Commit { branch, args } => {
            let ctx = Context::from_cli(token, api, directory, verbosity)?;
            commit(&ctx, branch, args)
        }
        Command::CreateBranch { branch, args } => {
            let ctx = Context::from_cli(token, api, directory, verbosity)?;
            create_branch(&ctx, branch, args)
        }
        Command::UpdateBranch { branch, args } => {
            let ctx = Context::from_cli(token, api, directory, verbosity)?;
            update_branch(&ctx, branch, args)
        }
        Command::ForkCommit { branch, args } => {
            let ctx = Context::from_cli(token, api, directory, verbosity)?;
            fork_commit(&ctx, branch, args)
        }
    }
}

/// Parse an optional `--branch` value.
fn parse_branch(branch: Option<String>) -> Result<Option<BranchName>> {
    branch
        .map(|b| BranchName::new(b).context("invalid --branch"))
        .transpose()
}

/// Build engine options from command arguments and the config file.
fn build_options(
    ctx: &Context,
    branch: Option<BranchName>,
    args: CommitArgs,
) -> Result<CommitOptions> {
    let parent_ref = args
        .parent
        .map(|r| RefName::new(r).context("invalid --parent"))
        .transpose()?;
    let parent = ParentSelection::from_flags(parent_ref, args.no_parent)?;
    let author = CommitAuthor::from_parts("author", args.author_name, args.author_email)?;
    let committer =
        CommitAuthor::from_parts("committer", args.committer_name, args.committer_email)?;

    Ok(CommitOptions {
        repository: RepositoryId::unchecked(args.owner, args.repo),
        parent_repository: None,
        branch,
        parent,
        message: args.message,
        paths: args.paths,
        author,
        committer,
        no_file_mode: args.no_file_mode || ctx.config.no_file_mode(),
        dry_run: args.dry_run,
        upload_concurrency: ctx.config.upload_concurrency(),
    })
}

/// Run one orchestrator and print its outcome.
fn execute(ctx: &Context, operation: Operation, options: CommitOptions) -> Result<()> {
    let service = create_service(&ctx.service)
        .context("a GitHub token is required: set GITHUB_TOKEN or pass --token")?;
    let files = LocalFileSystem::new(&ctx.directory);

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        match operation {
            Operation::Commit(BranchIntent::CreateOrUpdate) => {
                engine::commit_to_branch(service.as_ref(), &files, &options).await
            }
            Operation::Commit(BranchIntent::CreateOnly) => {
                engine::create_branch(service.as_ref(), &files, &options).await
            }
            Operation::Commit(BranchIntent::UpdateOnly) => {
                engine::update_branch(service.as_ref(), &files, &options).await
            }
            Operation::ForkCommit => {
                engine::fork_commit(service.as_ref(), &files, &options).await
            }
        }
    })?;

    output::success(&outcome, ctx.verbosity);
    Ok(())
}
