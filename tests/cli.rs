//! End-to-end tests of the `ghcommit` binary.
//!
//! None of these reach the network: each one fails (or finishes) before the
//! first API call. `--api` points at a closed local port in case one did.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DEAD_API: &str = "http://127.0.0.1:9";

/// A command isolated from the caller's token, API URL and config files.
fn ghcommit(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ghcommit").unwrap();
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("GITHUB_API")
        .env_remove("GHCOMMIT_CONFIG")
        .env_remove("RUST_LOG")
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"));
    cmd
}

fn workdir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    dir
}

mod parsing {
    use super::*;

    #[test]
    fn help_succeeds() {
        let home = TempDir::new().unwrap();
        ghcommit(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("commit"))
            .stdout(predicate::str::contains("create-branch"))
            .stdout(predicate::str::contains("update-branch"))
            .stdout(predicate::str::contains("fork-commit"));
    }

    #[test]
    fn version_succeeds() {
        let home = TempDir::new().unwrap();
        ghcommit(&home)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn parent_conflicts_with_no_parent() {
        let home = TempDir::new().unwrap();
        ghcommit(&home)
            .args(["commit", "-u", "octocat", "-r", "hello-world", "-m", "msg"])
            .args(["--parent", "main", "--no-parent", "a.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot be used with"));
    }

    #[test]
    fn paths_are_required() {
        let home = TempDir::new().unwrap();
        ghcommit(&home)
            .args(["commit", "-u", "octocat", "-r", "hello-world", "-m", "msg"])
            .assert()
            .failure()
            .code(1);
    }

    #[test]
    fn author_name_requires_email() {
        let home = TempDir::new().unwrap();
        ghcommit(&home)
            .args(["commit", "-u", "octocat", "-r", "hello-world", "-m", "msg"])
            .args(["--author-name", "Ann", "a.txt"])
            .assert()
            .failure();
    }

    #[test]
    fn fork_commit_requires_branch() {
        let home = TempDir::new().unwrap();
        ghcommit(&home)
            .args(["fork-commit", "-u", "octocat", "-r", "hello-world", "-m", "msg", "a.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--branch"));
    }

    #[test]
    fn create_branch_requires_branch() {
        let home = TempDir::new().unwrap();
        ghcommit(&home)
            .args(["create-branch", "-u", "octocat", "-r", "hello-world", "-m", "msg", "a.txt"])
            .assert()
            .failure();
    }
}

mod refusals {
    use super::*;

    #[test]
    fn missing_token_fails() {
        let home = TempDir::new().unwrap();
        let dir = workdir();
        ghcommit(&home)
            .arg("-C")
            .arg(dir.path())
            .args(["--api", DEAD_API])
            .args(["commit", "-u", "octocat", "-r", "hello-world", "-m", "msg", "a.txt"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("GITHUB_TOKEN"));
    }

    #[test]
    fn fork_commit_without_token_fails() {
        let home = TempDir::new().unwrap();
        let dir = workdir();
        ghcommit(&home)
            .arg("-C")
            .arg(dir.path())
            .args(["--api", DEAD_API])
            .args(["fork-commit", "-u", "octocat", "-r", "hello-world", "-b", "fix"])
            .args(["-m", "msg", "a.txt"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("GITHUB_TOKEN"));
    }

    #[test]
    fn blank_message_is_invalid() {
        let home = TempDir::new().unwrap();
        let dir = workdir();
        ghcommit(&home)
            .arg("-C")
            .arg(dir.path())
            .args(["--token", "dummy", "--api", DEAD_API])
            .args(["commit", "-u", "octocat", "-r", "hello-world", "-m", "   ", "a.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid arguments"));
    }

    #[test]
    fn empty_directory_finds_no_files() {
        let home = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        ghcommit(&home)
            .arg("-C")
            .arg(dir.path())
            .args(["--token", "dummy", "--api", DEAD_API])
            .args(["commit", "-u", "octocat", "-r", "hello-world", "-m", "msg", "empty"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no file found"));
    }

    #[test]
    fn invalid_branch_name_is_rejected() {
        let home = TempDir::new().unwrap();
        let dir = workdir();
        ghcommit(&home)
            .arg("-C")
            .arg(dir.path())
            .args(["--token", "dummy", "--api", DEAD_API])
            .args(["commit", "-u", "octocat", "-r", "hello-world", "-m", "msg"])
            .args(["-b", "bad name", "a.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid --branch"));
    }

    #[test]
    fn malformed_config_is_reported() {
        let home = TempDir::new().unwrap();
        let dir = workdir();
        let config = home.path().join("bad.toml");
        fs::write(&config, "no_such_key = 1\n").unwrap();
        ghcommit(&home)
            .env("GHCOMMIT_CONFIG", &config)
            .arg("-C")
            .arg(dir.path())
            .args(["--token", "dummy", "--api", DEAD_API])
            .args(["commit", "-u", "octocat", "-r", "hello-world", "-m", "msg", "a.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("could not load configuration"));
    }
}

mod completion {
    use super::*;

    #[test]
    fn bash_script_needs_no_token() {
        let home = TempDir::new().unwrap();
        ghcommit(&home)
            .args(["completion", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ghcommit"));
    }

    #[test]
    fn unknown_shell_fails() {
        let home = TempDir::new().unwrap();
        ghcommit(&home)
            .args(["completion", "tcsh"])
            .assert()
            .failure();
    }
}
