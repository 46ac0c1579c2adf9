//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--token <TOKEN>`: GitHub API token (env `GITHUB_TOKEN`)
//! - `--api <URL>`: GitHub Enterprise v3 API URL (env `GITHUB_API`)
//! - `-C <DIR>` / `--directory <DIR>`: Resolve paths from this directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Warnings and errors only

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ghcommit - Commit files to a GitHub branch without a local clone
#[derive(Parser, Debug)]
#[command(name = "ghcommit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub API v3 URL, e.g. https://github.example.com/api/v3
    #[arg(long = "api", env = "GITHUB_API", global = true, value_name = "URL")]
    pub api: Option<String>,

    /// Resolve file paths relative to this directory
    #[arg(short = 'C', long = "directory", global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Warnings and errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    ///
    /// Returns clap's error (help and version included) instead of exiting,
    /// so the caller decides the exit code.
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Parser::try_parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Commit files to a branch, creating the branch if needed
    #[command(after_help = "\
EXAMPLES:
    # Commit to the default branch
    ghcommit commit -u octocat -r hello-world -m 'Update docs' docs/

    # Commit to a topic branch, starting it from the default branch if absent
    ghcommit commit -u octocat -r hello-world -b topic -m 'Add config' config.yaml

    # Replace a branch with a single rootless commit
    ghcommit commit -u octocat -r pages -b gh-pages --no-parent -m 'Publish' -C build .")]
    Commit {
        /// Target branch (default: the repository's default branch)
        #[arg(short = 'b', long, value_name = "BRANCH")]
        branch: Option<String>,

        #[command(flatten)]
        args: CommitArgs,
    },

    /// Create a new branch with a commit of the given files
    CreateBranch {
        /// Branch to create
        #[arg(short = 'b', long, value_name = "BRANCH")]
        branch: String,

        #[command(flatten)]
        args: CommitArgs,
    },

    /// Commit files to an existing branch
    UpdateBranch {
        /// Branch to update (default: the repository's default branch)
        #[arg(short = 'b', long, value_name = "BRANCH")]
        branch: Option<String>,

        #[command(flatten)]
        args: CommitArgs,
    },

    /// Fork a repository and commit files to a branch of the fork
    #[command(after_help = "\
EXAMPLES:
    # Fork octocat/hello-world and start a topic branch from its default branch
    ghcommit fork-commit -u octocat -r hello-world -b fix-typo -m 'Fix typo' README.md

    # Base the fork branch on an upstream release branch
    ghcommit fork-commit -u octocat -r hello-world -b backport --parent release-1.x -m 'Backport' src/")]
    ForkCommit {
        /// Branch of the fork to commit to
        #[arg(short = 'b', long, value_name = "BRANCH")]
        branch: String,

        #[command(flatten)]
        args: CommitArgs,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments shared by the commit commands.
#[derive(Args, Debug, Clone)]
pub struct CommitArgs {
    /// Repository owner
    #[arg(short = 'u', long, value_name = "OWNER")]
    pub owner: String,

    /// Repository name
    #[arg(short = 'r', long = "repo", value_name = "REPO")]
    pub repo: String,

    /// Commit message
    #[arg(short = 'm', long)]
    pub message: String,

    /// Base the commit on this ref (branch, tag or refs/...)
    #[arg(long, value_name = "REF", conflicts_with = "no_parent")]
    pub parent: Option<String>,

    /// Create a commit without parent
    #[arg(long)]
    pub no_parent: bool,

    /// Author name (requires --author-email)
    #[arg(long, value_name = "NAME", requires = "author_email")]
    pub author_name: Option<String>,

    /// Author email (requires --author-name)
    #[arg(long, value_name = "EMAIL", requires = "author_name")]
    pub author_email: Option<String>,

    /// Committer name (requires --committer-email)
    #[arg(long, value_name = "NAME", requires = "committer_email")]
    pub committer_name: Option<String>,

    /// Committer email (requires --committer-name)
    #[arg(long, value_name = "EMAIL", requires = "committer_name")]
    pub committer_email: Option<String>,

    /// Ignore executable bits and record every file as 100644
    #[arg(long)]
    pub no_file_mode: bool,

    /// Build the commit but do not move the branch
    #[arg(long)]
    pub dry_run: bool,

    /// Files or directories to commit
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
