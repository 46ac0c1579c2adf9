//! Integration tests for the commit pipeline.
//!
//! These tests drive the public operations end to end against
//! `MockGitService` and a temporary working directory:
//! validate → discover → resolve → plan → synthesize → mutate.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use ghcommit::core::types::{BranchName, CommitSha, FileMode, RefName, RepositoryId};
use ghcommit::engine::{
    commit_to_branch, create_branch, fork_commit, update_branch, CommitOptions, CommitOutcome,
    EngineError, ParentSelection, PolicyError, RefMutation, SynthesisError,
};
use ghcommit::files::LocalFileSystem;
use ghcommit::forge::mock::{FailOn, MockGitService, MockOperation};
use ghcommit::forge::ForgeError;

// =============================================================================
// Test Fixtures
// =============================================================================

/// `alpha`, base64-encoded the way file contents reach the service.
const ALPHA_B64: &str = "YWxwaGE=";

/// A remote repository with `master` as default branch at a single commit.
struct Fixture {
    service: MockGitService,
    root: CommitSha,
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let service = MockGitService::new().with_repository(repo());
        let root = service.seed_commit(&[("README.md", "cmVhZG1l")], None);
        service.set_branch("master", &root);
        service.set_default_branch("master");

        let dir = TempDir::new().expect("failed to create temp dir");
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();

        Self { service, root, dir }
    }

    fn files(&self) -> LocalFileSystem {
        LocalFileSystem::new(self.dir.path())
    }

    fn write(&self, path: &str, contents: &str) {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, contents).unwrap();
    }

    fn blob_uploads(&self) -> usize {
        self.service
            .operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::CreateBlob { .. }))
            .count()
    }

    fn ref_mutations(&self) -> Vec<MockOperation> {
        self.service
            .operations()
            .into_iter()
            .filter(|op| {
                matches!(
                    op,
                    MockOperation::CreateBranch { .. } | MockOperation::UpdateBranch { .. }
                )
            })
            .collect()
    }
}

fn repo() -> RepositoryId {
    RepositoryId::new("octocat", "hello-world").unwrap()
}

fn options(branch: Option<&str>, paths: &[&str]) -> CommitOptions {
    let mut options = CommitOptions::new(
        repo(),
        "Update files",
        paths.iter().map(PathBuf::from).collect(),
    );
    options.branch = branch.map(|b| BranchName::new(b).unwrap());
    options
}

// =============================================================================
// Branch creation
// =============================================================================

mod creation {
    use super::*;

    #[tokio::test]
    async fn new_branch_starts_from_default_branch() {
        let fx = Fixture::new();

        let outcome = commit_to_branch(&fx.service, &fx.files(), &options(Some("topic"), &["a.txt"]))
            .await
            .unwrap();

        let CommitOutcome::Created {
            branch,
            commit,
            changed_files,
        } = outcome.clone()
        else {
            panic!("expected Created, got {:?}", outcome);
        };
        assert_eq!(branch.as_str(), "topic");
        assert_eq!(changed_files, 1);
        assert_eq!(fx.service.branch_tip("topic"), Some(commit.clone()));
        assert_eq!(fx.service.branch_tip("master"), Some(fx.root.clone()));

        let stored = fx.service.commit(&commit).unwrap();
        assert_eq!(stored.parent, Some(fx.root.clone()));
        assert_eq!(stored.message, "Update files");
        let tree = fx.service.tree(&stored.tree).unwrap();
        assert!(tree.contains_key("README.md"));
        assert!(tree.contains_key("a.txt"));
    }

    #[tokio::test]
    async fn create_branch_refuses_existing_branch_before_uploading() {
        let fx = Fixture::new();
        fx.service.set_branch("topic", &fx.root);

        let err = create_branch(&fx.service, &fx.files(), &options(Some("topic"), &["a.txt"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Policy(PolicyError::BranchExists(ref b)) if b.as_str() == "topic"
        ));
        assert_eq!(fx.blob_uploads(), 0);
        assert!(fx.ref_mutations().is_empty());
        assert_eq!(fx.service.commit_count(), 1);
    }

    #[tokio::test]
    async fn create_branch_refuses_default_branch() {
        let fx = Fixture::new();

        let err = create_branch(&fx.service, &fx.files(), &options(Some("master"), &["a.txt"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Policy(PolicyError::BranchExists(_))
        ));
    }

    #[tokio::test]
    async fn rootless_branch_counts_every_entry() {
        let fx = Fixture::new();
        fx.write("docs/b.txt", "beta");
        let mut o = options(Some("pages"), &["a.txt", "docs"]);
        o.parent = ParentSelection::NoParent;

        let outcome = create_branch(&fx.service, &fx.files(), &o).await.unwrap();

        let CommitOutcome::Created {
            commit,
            changed_files,
            ..
        } = outcome.clone()
        else {
            panic!("expected Created, got {:?}", outcome);
        };
        assert_eq!(changed_files, 2);
        let stored = fx.service.commit(&commit).unwrap();
        assert_eq!(stored.parent, None);
        let tree = fx.service.tree(&stored.tree).unwrap();
        assert_eq!(
            tree.keys().cloned().collect::<Vec<_>>(),
            vec!["a.txt".to_string(), "docs/b.txt".to_string()]
        );
        assert!(!fx
            .service
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::ChangedFiles { .. })));
    }

    #[tokio::test]
    async fn create_branch_with_no_changes_leaves_branch_absent() {
        let fx = Fixture::new();
        let tip = fx.service.seed_commit(
            &[("README.md", "cmVhZG1l"), ("a.txt", ALPHA_B64)],
            Some(&fx.root),
        );
        fx.service.set_branch("master", &tip);

        let outcome = create_branch(&fx.service, &fx.files(), &options(Some("topic"), &["a.txt"]))
            .await
            .unwrap();

        let CommitOutcome::NothingToCommit { branch } = outcome.clone() else {
            panic!("expected NothingToCommit, got {:?}", outcome);
        };
        assert_eq!(branch.as_str(), "topic");
        assert!(!outcome.mutated());
        assert!(fx.ref_mutations().is_empty());
        assert_eq!(fx.service.branch_tip("topic"), None);
        assert_eq!(fx.service.branch_tip("master"), Some(tip));
    }

    #[tokio::test]
    async fn branch_from_lightweight_tag() {
        let fx = Fixture::new();
        let tagged = fx
            .service
            .seed_commit(&[("README.md", "dGFnZ2Vk")], Some(&fx.root));
        fx.service.set_tag("v1.0", &tagged);
        let mut o = options(Some("release"), &["a.txt"]);
        o.parent = ParentSelection::FromRef(RefName::new("v1.0").unwrap());

        let outcome = commit_to_branch(&fx.service, &fx.files(), &o).await.unwrap();

        let CommitOutcome::Created { commit, .. } = outcome.clone() else {
            panic!("expected Created, got {:?}", outcome);
        };
        assert_eq!(fx.service.commit(&commit).unwrap().parent, Some(tagged));
    }
}

// =============================================================================
// Branch update
// =============================================================================

mod update {
    use super::*;

    #[tokio::test]
    async fn fast_forward_does_not_force() {
        let fx = Fixture::new();
        commit_to_branch(&fx.service, &fx.files(), &options(Some("topic"), &["a.txt"]))
            .await
            .unwrap();
        let before = fx.service.branch_tip("topic").unwrap();

        fx.write("a.txt", "alpha, revised");
        let outcome = update_branch(&fx.service, &fx.files(), &options(Some("topic"), &["a.txt"]))
            .await
            .unwrap();

        let CommitOutcome::Updated {
            commit,
            changed_files,
            force,
            ..
        } = outcome.clone()
        else {
            panic!("expected Updated, got {:?}", outcome);
        };
        assert!(!force);
        assert_eq!(changed_files, 1);
        assert_eq!(fx.service.commit(&commit).unwrap().parent, Some(before));
        assert_eq!(fx.service.branch_tip("topic"), Some(commit));
    }

    #[tokio::test]
    async fn default_branch_is_the_implicit_target() {
        let fx = Fixture::new();

        let outcome = update_branch(&fx.service, &fx.files(), &options(None, &["a.txt"]))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            CommitOutcome::Updated { ref branch, force: false, .. } if branch.as_str() == "master"
        ));
        assert_ne!(fx.service.branch_tip("master"), Some(fx.root.clone()));
    }

    #[tokio::test]
    async fn no_parent_replaces_history_with_force() {
        let fx = Fixture::new();
        fx.service.set_branch("topic", &fx.root);
        let mut o = options(Some("topic"), &["a.txt"]);
        o.parent = ParentSelection::NoParent;

        let outcome = commit_to_branch(&fx.service, &fx.files(), &o).await.unwrap();

        let CommitOutcome::Updated { commit, force, .. } = outcome.clone() else {
            panic!("expected Updated, got {:?}", outcome);
        };
        assert!(force);
        assert_eq!(fx.service.commit(&commit).unwrap().parent, None);
        assert!(fx.ref_mutations().contains(&MockOperation::UpdateBranch {
            branch: "topic".into(),
            commit,
            force: true,
        }));
    }

    #[tokio::test]
    async fn parent_ref_behind_target_forces() {
        let fx = Fixture::new();
        let ahead = fx
            .service
            .seed_commit(&[("README.md", "YWhlYWQ=")], Some(&fx.root));
        fx.service.set_branch("topic", &ahead);
        let mut o = options(Some("topic"), &["a.txt"]);
        o.parent = ParentSelection::FromRef(RefName::new("master").unwrap());

        let outcome = commit_to_branch(&fx.service, &fx.files(), &o).await.unwrap();

        let CommitOutcome::Updated { commit, force, .. } = outcome.clone() else {
            panic!("expected Updated, got {:?}", outcome);
        };
        assert!(force);
        assert_eq!(fx.service.commit(&commit).unwrap().parent, Some(fx.root.clone()));
    }

    #[tokio::test]
    async fn parent_ref_ahead_of_target_fast_forwards() {
        let fx = Fixture::new();
        let ahead = fx
            .service
            .seed_commit(&[("README.md", "YWhlYWQ=")], Some(&fx.root));
        fx.service.set_branch("next", &ahead);
        fx.service.set_branch("topic", &fx.root);
        let mut o = options(Some("topic"), &["a.txt"]);
        o.parent = ParentSelection::FromRef(RefName::new("refs/heads/next").unwrap());

        let outcome = update_branch(&fx.service, &fx.files(), &o).await.unwrap();

        assert!(matches!(outcome, CommitOutcome::Updated { force: false, .. }));
    }

    #[tokio::test]
    async fn update_branch_refuses_absent_branch() {
        let fx = Fixture::new();

        let err = update_branch(&fx.service, &fx.files(), &options(Some("nope"), &["a.txt"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Policy(PolicyError::BranchMissing(_))
        ));
        assert_eq!(fx.blob_uploads(), 0);
    }
}

// =============================================================================
// Refusals and short-circuits
// =============================================================================

mod refusals {
    use super::*;

    #[tokio::test]
    async fn unchanged_files_leave_branch_alone() {
        let fx = Fixture::new();
        let tip = fx.service.seed_commit(&[("a.txt", ALPHA_B64)], Some(&fx.root));
        fx.service.set_branch("topic", &tip);

        let outcome = commit_to_branch(&fx.service, &fx.files(), &options(Some("topic"), &["a.txt"]))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            CommitOutcome::NothingToCommit { ref branch } if branch.as_str() == "topic"
        ));
        assert!(!outcome.mutated());
        assert!(fx.ref_mutations().is_empty());
        assert_eq!(fx.service.branch_tip("topic"), Some(tip));
    }

    #[tokio::test]
    async fn dry_run_builds_commit_only() {
        let fx = Fixture::new();
        let mut o = options(Some("topic"), &["a.txt"]);
        o.dry_run = true;

        let outcome = commit_to_branch(&fx.service, &fx.files(), &o).await.unwrap();

        let CommitOutcome::DryRun {
            commit, mutation, ..
        } = outcome.clone()
        else {
            panic!("expected DryRun, got {:?}", outcome);
        };
        assert!(fx.service.commit(&commit).is_some());
        assert_eq!(
            mutation,
            RefMutation::Create {
                branch: BranchName::new("topic").unwrap()
            }
        );
        assert!(fx.ref_mutations().is_empty());
        assert_eq!(fx.service.branch_tip("topic"), None);
    }

    #[tokio::test]
    async fn unresolvable_parent_ref_uploads_nothing() {
        let fx = Fixture::new();
        let mut o = options(Some("topic"), &["a.txt"]);
        o.parent = ParentSelection::FromRef(RefName::new("refs/tags/missing").unwrap());

        let err = commit_to_branch(&fx.service, &fx.files(), &o).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::Policy(PolicyError::ParentRefNotFound(_))
        ));
        assert_eq!(fx.blob_uploads(), 0);
    }

    #[tokio::test]
    async fn annotated_tag_is_not_a_parent() {
        let fx = Fixture::new();
        fx.service.set_annotated_tag("v2.0");
        let mut o = options(Some("topic"), &["a.txt"]);
        o.parent = ParentSelection::FromRef(RefName::new("v2.0").unwrap());

        let err = commit_to_branch(&fx.service, &fx.files(), &o).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::Policy(PolicyError::ParentRefNotFound(_))
        ));
        assert_eq!(fx.blob_uploads(), 0);
    }

    #[tokio::test]
    async fn unknown_repository_is_resolution_error() {
        let fx = Fixture::new();
        let mut o = options(None, &["a.txt"]);
        o.repository = RepositoryId::new("octocat", "elsewhere").unwrap();

        let err = commit_to_branch(&fx.service, &fx.files(), &o).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::Resolution {
                source: ForgeError::NotFound(_),
                ..
            }
        ));
        assert_eq!(fx.blob_uploads(), 0);
    }

    #[tokio::test]
    async fn missing_path_is_discovery_error() {
        let fx = Fixture::new();

        let err = commit_to_branch(&fx.service, &fx.files(), &options(None, &["nope.txt"]))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Discovery(_)));
        assert!(fx.service.operations().is_empty());
    }

    #[tokio::test]
    async fn upload_failure_stops_before_any_ref_change() {
        let fx = Fixture::new();
        fx.write("b.txt", "beta");
        let service = fx.service.clone().fail_on(FailOn::CreateBlobNth(
            1,
            ForgeError::ApiError {
                status: 502,
                message: "bad gateway".into(),
            },
        ));

        let err = commit_to_branch(&service, &fx.files(), &options(None, &["a.txt", "b.txt"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Synthesis(SynthesisError::CreateBlob { .. })
        ));
        assert!(!service
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::CreateCommit { .. })));
        assert!(fx.ref_mutations().is_empty());
        assert_eq!(service.branch_tip("master"), Some(fx.root.clone()));
    }
}

// =============================================================================
// Fork commits
// =============================================================================

mod forks {
    use super::*;

    /// Make `hubot` the token user and return where its fork will live.
    fn fork_of(fx: &Fixture) -> RepositoryId {
        fx.service.clone().with_viewer("hubot");
        RepositoryId::new("hubot", "hello-world").unwrap()
    }

    #[tokio::test]
    async fn new_fork_branch_starts_from_upstream_default_branch() {
        let fx = Fixture::new();
        let fork = fork_of(&fx);

        let outcome = fork_commit(&fx.service, &fx.files(), &options(Some("topic"), &["a.txt"]))
            .await
            .unwrap();

        let CommitOutcome::Created { branch, commit, .. } = outcome.clone() else {
            panic!("expected Created, got {:?}", outcome);
        };
        assert_eq!(branch.as_str(), "topic");
        assert_eq!(fx.service.forks(), vec![fork.clone()]);
        assert_eq!(fx.service.fork_branch_tip(&fork, "topic"), Some(commit.clone()));
        assert_eq!(fx.service.branch_tip("topic"), None);
        assert_eq!(fx.service.commit(&commit).unwrap().parent, Some(fx.root.clone()));
    }

    #[tokio::test]
    async fn existing_fork_branch_fast_forwards() {
        let fx = Fixture::new();
        let fork = fork_of(&fx);
        let o = options(Some("topic"), &["a.txt"]);
        fork_commit(&fx.service, &fx.files(), &o).await.unwrap();
        let first = fx.service.fork_branch_tip(&fork, "topic").unwrap();
        fx.write("a.txt", "alpha, revised");

        let outcome = fork_commit(&fx.service, &fx.files(), &o).await.unwrap();

        let CommitOutcome::Updated { commit, force, .. } = outcome.clone() else {
            panic!("expected Updated, got {:?}", outcome);
        };
        assert!(!force);
        assert_eq!(fx.service.commit(&commit).unwrap().parent, Some(first));
        assert_eq!(fx.service.forks().len(), 1);
    }

    #[tokio::test]
    async fn parent_ref_is_read_from_upstream() {
        let fx = Fixture::new();
        let fork = fork_of(&fx);
        let next = fx
            .service
            .seed_commit(&[("README.md", "bmV4dA==")], Some(&fx.root));
        fx.service.set_branch("next", &next);
        let mut o = options(Some("master"), &["a.txt"]);
        o.parent = ParentSelection::FromRef(RefName::new("next").unwrap());

        let outcome = fork_commit(&fx.service, &fx.files(), &o).await.unwrap();

        let CommitOutcome::Updated { commit, force, .. } = outcome.clone() else {
            panic!("expected Updated, got {:?}", outcome);
        };
        assert!(force);
        assert_eq!(fx.service.commit(&commit).unwrap().parent, Some(next));
        assert_eq!(fx.service.fork_branch_tip(&fork, "master"), Some(commit));
        assert_eq!(fx.service.branch_tip("master"), Some(fx.root.clone()));
    }
}

// =============================================================================
// File modes
// =============================================================================

#[cfg(unix)]
mod file_modes {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn make_executable(fx: &Fixture, path: &str) {
        let full = fx.dir.path().join(path);
        fs::set_permissions(&full, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn executable_bit_is_recorded() {
        let fx = Fixture::new();
        fx.write("run.sh", "#!/bin/sh\n");
        make_executable(&fx, "run.sh");

        let outcome = commit_to_branch(&fx.service, &fx.files(), &options(None, &["run.sh", "a.txt"]))
            .await
            .unwrap();

        let CommitOutcome::Updated { commit, .. } = outcome.clone() else {
            panic!("expected Updated, got {:?}", outcome);
        };
        let tree = fx.service.tree(&fx.service.commit(&commit).unwrap().tree).unwrap();
        assert_eq!(tree["run.sh"].1, FileMode::Executable);
        assert_eq!(tree["a.txt"].1, FileMode::Regular);
    }

    #[tokio::test]
    async fn no_file_mode_records_regular_files() {
        let fx = Fixture::new();
        fx.write("run.sh", "#!/bin/sh\n");
        make_executable(&fx, "run.sh");
        let mut o = options(None, &["run.sh"]);
        o.no_file_mode = true;

        let outcome = commit_to_branch(&fx.service, &fx.files(), &o).await.unwrap();

        let CommitOutcome::Updated { commit, .. } = outcome.clone() else {
            panic!("expected Updated, got {:?}", outcome);
        };
        let tree = fx.service.tree(&fx.service.commit(&commit).unwrap().tree).unwrap();
        assert_eq!(tree["run.sh"].1, FileMode::Regular);
    }
}
