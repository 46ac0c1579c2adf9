//! forge::mock
//!
//! In-memory Git service for deterministic testing.
//!
//! # Design
//!
//! The mock keeps a tiny object store (blobs, flat trees, commits) plus branch
//! and tag refs, and answers every [`GitService`] call from it. Object ids are
//! content-addressed with SHA-256, so uploading the same content twice yields
//! the same blob id, as on a real forge.
//!
//! Trees are flat `path -> (blob, mode)` maps, which is all the commit
//! pipeline can observe. `changed_files` diffs a commit's tree against its
//! parent's tree; ancestry walks parent links.
//!
//! Failures are injected with [`FailOn`] and every call is recorded as a
//! [`MockOperation`] for later assertions.
//!
//! Forks share the object store and tags with the repository they came from
//! but keep their own branches, copied at fork time.
//!
//! # Example
//!
//! ```
//! use ghcommit::forge::mock::MockGitService;
//! use ghcommit::forge::{GitService, RepositoryQuery};
//! use ghcommit::core::types::RepositoryId;
//!
//! # tokio_test::block_on(async {
//! let service = MockGitService::new();
//! let root = service.seed_commit(&[("README.md", "hello")], None);
//! service.set_branch("main", &root);
//! service.set_default_branch("main");
//!
//! let state = service
//!     .query_repository(RepositoryQuery {
//!         repository: RepositoryId::new("octocat", "hello-world").unwrap(),
//!         parent_repository: None,
//!         branch: None,
//!         parent_ref: None,
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(state.default_branch.unwrap().tip.commit, root);
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::traits::{
    BranchUpdate, DefaultBranchState, ForgeError, GitService, NewBlob, NewBranch, NewCommit,
    NewTree, ParentRefState, RefTip, RepositoryQuery, RepositoryState,
};
use crate::core::types::{
    BlobSha, BranchName, CommitAuthor, CommitSha, FileMode, RefQualifiedName, RepositoryId,
    TreeSha,
};

/// Contents of a mock tree: path to blob and mode.
pub type MockTree = BTreeMap<String, (BlobSha, FileMode)>;

/// A stored commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCommit {
    pub message: String,
    pub tree: TreeSha,
    pub parent: Option<CommitSha>,
    pub author: Option<CommitAuthor>,
    pub committer: Option<CommitAuthor>,
}

/// What a tag points at.
#[derive(Debug, Clone)]
enum TagTarget {
    Commit(CommitSha),
    /// An annotated tag object; it has no commit tip of its own.
    Annotated,
}

/// Mock Git service for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockGitService {
    inner: Arc<Mutex<MockGitServiceInner>>,
}

#[derive(Debug)]
struct MockGitServiceInner {
    viewer_login: String,
    /// When set, queries for any other repository fail with `NotFound`.
    repository: Option<RepositoryId>,
    default_branch: Option<String>,
    branches: BTreeMap<String, CommitSha>,
    /// Branches of each fork created through `create_fork`.
    forks: BTreeMap<RepositoryId, BTreeMap<String, CommitSha>>,
    tags: BTreeMap<String, TagTarget>,
    blobs: HashMap<BlobSha, String>,
    trees: HashMap<TreeSha, MockTree>,
    commits: HashMap<CommitSha, MockCommit>,
    /// Distinguishes otherwise identical commits.
    commit_counter: u64,
    /// Number of `create_blob` calls so far, for `FailOn::CreateBlobNth`.
    blob_calls: usize,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    QueryRepository(ForgeError),
    /// Fail every `create_blob` call.
    CreateBlob(ForgeError),
    /// Fail only the n-th `create_blob` call (0-based).
    CreateBlobNth(usize, ForgeError),
    CreateTree(ForgeError),
    CreateCommit(ForgeError),
    ChangedFiles(ForgeError),
    CreateBranch(ForgeError),
    UpdateBranch(ForgeError),
    CreateFork(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    QueryRepository {
        repository: String,
        parent_repository: Option<String>,
        branch: Option<String>,
        parent_ref: Option<String>,
    },
    CreateBlob {
        content: String,
    },
    CreateTree {
        base_tree: Option<TreeSha>,
        paths: Vec<String>,
    },
    CreateCommit {
        message: String,
        parent: Option<CommitSha>,
        tree: TreeSha,
    },
    ChangedFiles {
        commit: CommitSha,
    },
    CreateBranch {
        branch: String,
        commit: CommitSha,
    },
    UpdateBranch {
        branch: String,
        commit: CommitSha,
        force: bool,
    },
    CreateFork {
        repository: String,
    },
}

impl MockOperation {
    /// True for calls that change remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            MockOperation::QueryRepository { .. } | MockOperation::ChangedFiles { .. }
        )
    }
}

/// First 20 bytes of SHA-256 over `kind NUL payload`, the size of a Git id.
fn digest(kind: &str, payload: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update([0u8]);
    hasher.update(payload.as_bytes());
    hasher.finalize()[..20].to_vec()
}

fn tree_payload(tree: &MockTree) -> String {
    tree.iter()
        .map(|(path, (blob, mode))| format!("{} {} {}\n", mode, blob, path))
        .collect()
}

fn not_found(repository: &RepositoryId) -> ForgeError {
    ForgeError::NotFound(format!(
        "Could not resolve to a Repository with the name '{}'",
        repository
    ))
}

fn unprocessable(message: impl Into<String>) -> ForgeError {
    ForgeError::ApiError {
        status: 422,
        message: message.into(),
    }
}

impl MockGitServiceInner {
    fn store_blob(&mut self, content: &str) -> BlobSha {
        let sha = BlobSha::from_digest(&digest("blob", content));
        self.blobs.insert(sha.clone(), content.to_string());
        sha
    }

    fn store_tree(&mut self, tree: MockTree) -> TreeSha {
        let sha = TreeSha::from_digest(&digest("tree", &tree_payload(&tree)));
        self.trees.insert(sha.clone(), tree);
        sha
    }

    fn store_commit(&mut self, commit: MockCommit) -> CommitSha {
        self.commit_counter += 1;
        let payload = format!(
            "{}\n{}\n{}\n{}",
            commit.tree,
            commit.parent.as_ref().map(|p| p.as_str()).unwrap_or(""),
            self.commit_counter,
            commit.message
        );
        let sha = CommitSha::from_digest(&digest("commit", &payload));
        self.commits.insert(sha.clone(), commit);
        sha
    }

    fn tip(&self, commit: &CommitSha) -> Option<RefTip> {
        let stored = self.commits.get(commit)?;
        Some(RefTip {
            commit: commit.clone(),
            tree: stored.tree.clone(),
        })
    }

    /// Branches of `repository`: a fork's own, else the seeded ones.
    ///
    /// Fails with `NotFound` for a repository outside the
    /// [`MockGitService::with_repository`] restriction.
    fn branches_of(
        &self,
        repository: &RepositoryId,
    ) -> Result<&BTreeMap<String, CommitSha>, ForgeError> {
        if let Some(fork) = self.forks.get(repository) {
            return Ok(fork);
        }
        self.check_known(repository)?;
        Ok(&self.branches)
    }

    fn branches_of_mut(
        &mut self,
        repository: &RepositoryId,
    ) -> Result<&mut BTreeMap<String, CommitSha>, ForgeError> {
        if self.forks.contains_key(repository) {
            return self
                .forks
                .get_mut(repository)
                .ok_or_else(|| not_found(repository));
        }
        self.check_known(repository)?;
        Ok(&mut self.branches)
    }

    fn check_known(&self, repository: &RepositoryId) -> Result<(), ForgeError> {
        match &self.repository {
            Some(only) if only != repository => Err(not_found(repository)),
            _ => Ok(()),
        }
    }

    /// True if `descendant` equals `ancestor` or reaches it by parent links.
    fn descends(&self, descendant: &CommitSha, ancestor: &CommitSha) -> bool {
        let mut cursor = Some(descendant.clone());
        while let Some(sha) = cursor {
            if &sha == ancestor {
                return true;
            }
            cursor = self.commits.get(&sha).and_then(|c| c.parent.clone());
        }
        false
    }

    /// Resolve a ref the way `git rev-parse` does: qualified names literally,
    /// short names as a branch first and a tag second.
    fn resolve_ref(
        &self,
        branches: &BTreeMap<String, CommitSha>,
        name: &str,
    ) -> Option<(RefQualifiedName, Option<CommitSha>)> {
        let branch = |short: &str| {
            branches.get(short).map(|sha| {
                (
                    RefQualifiedName::new(RefQualifiedName::HEADS, short),
                    Some(sha.clone()),
                )
            })
        };
        let tag = |short: &str| {
            self.tags.get(short).map(|target| {
                let commit = match target {
                    TagTarget::Commit(sha) => Some(sha.clone()),
                    TagTarget::Annotated => None,
                };
                (RefQualifiedName::new(RefQualifiedName::TAGS, short), commit)
            })
        };

        if let Some(short) = name.strip_prefix(RefQualifiedName::HEADS) {
            branch(short)
        } else if let Some(short) = name.strip_prefix(RefQualifiedName::TAGS) {
            tag(short)
        } else {
            branch(name).or_else(|| tag(name))
        }
    }
}

impl MockGitService {
    /// Create an empty repository service: no branches, no objects.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockGitServiceInner {
                viewer_login: "octocat".to_string(),
                repository: None,
                default_branch: None,
                branches: BTreeMap::new(),
                forks: BTreeMap::new(),
                tags: BTreeMap::new(),
                blobs: HashMap::new(),
                trees: HashMap::new(),
                commits: HashMap::new(),
                commit_counter: 0,
                blob_calls: 0,
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockGitServiceInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Only answer for this repository; others are `NotFound`.
    pub fn with_repository(self, repository: RepositoryId) -> Self {
        self.state().repository = Some(repository);
        self
    }

    /// Set the login reported for the token's user.
    pub fn with_viewer(self, login: impl Into<String>) -> Self {
        self.state().viewer_login = login.into();
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use ghcommit::forge::mock::{FailOn, MockGitService};
    /// use ghcommit::forge::ForgeError;
    ///
    /// let service = MockGitService::new()
    ///     .fail_on(FailOn::CreateTree(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.state().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    // ----------------------------------------------------------------------
    // Seeding
    // ----------------------------------------------------------------------

    /// Store a commit whose tree holds exactly `files` (path, content), all
    /// regular files. Not recorded as an operation.
    pub fn seed_commit(&self, files: &[(&str, &str)], parent: Option<&CommitSha>) -> CommitSha {
        let mut state = self.state();
        let mut tree = MockTree::new();
        for (path, content) in files {
            let blob = state.store_blob(content);
            tree.insert(path.to_string(), (blob, FileMode::Regular));
        }
        let tree = state.store_tree(tree);
        state.store_commit(MockCommit {
            message: "seed".to_string(),
            tree,
            parent: parent.cloned(),
            author: None,
            committer: None,
        })
    }

    /// Point a branch at a commit, creating it if needed.
    pub fn set_branch(&self, name: &str, commit: &CommitSha) {
        self.state()
            .branches
            .insert(name.to_string(), commit.clone());
    }

    /// Mark a branch as the repository default.
    pub fn set_default_branch(&self, name: &str) {
        self.state().default_branch = Some(name.to_string());
    }

    /// Create a lightweight tag pointing at a commit.
    pub fn set_tag(&self, name: &str, commit: &CommitSha) {
        self.state()
            .tags
            .insert(name.to_string(), TagTarget::Commit(commit.clone()));
    }

    /// Create an annotated tag; it resolves to no commit.
    pub fn set_annotated_tag(&self, name: &str) {
        self.state()
            .tags
            .insert(name.to_string(), TagTarget::Annotated);
    }

    // ----------------------------------------------------------------------
    // Inspection
    // ----------------------------------------------------------------------

    /// Commit a branch points at.
    pub fn branch_tip(&self, name: &str) -> Option<CommitSha> {
        self.state().branches.get(name).cloned()
    }

    /// Commit a branch of a fork points at.
    pub fn fork_branch_tip(&self, fork: &RepositoryId, name: &str) -> Option<CommitSha> {
        self.state().forks.get(fork)?.get(name).cloned()
    }

    /// Forks created so far.
    pub fn forks(&self) -> Vec<RepositoryId> {
        self.state().forks.keys().cloned().collect()
    }

    pub fn commit(&self, sha: &CommitSha) -> Option<MockCommit> {
        self.state().commits.get(sha).cloned()
    }

    pub fn tree(&self, sha: &TreeSha) -> Option<MockTree> {
        self.state().trees.get(sha).cloned()
    }

    /// Base64 content of a blob.
    pub fn blob(&self, sha: &BlobSha) -> Option<String> {
        self.state().blobs.get(sha).cloned()
    }

    /// Number of commits in the store, seeds included.
    pub fn commit_count(&self) -> usize {
        self.state().commits.len()
    }

    fn record(&self, op: MockOperation) {
        self.state().operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail(&self, expected: &str) -> Result<(), ForgeError> {
        let mut state = self.state();
        let blob_call = if expected == "create_blob" {
            state.blob_calls += 1;
            Some(state.blob_calls - 1)
        } else {
            None
        };
        let err = match (&state.fail_on, expected) {
            (Some(FailOn::QueryRepository(e)), "query_repository") => Some(e),
            (Some(FailOn::CreateBlob(e)), "create_blob") => Some(e),
            (Some(FailOn::CreateBlobNth(n, e)), "create_blob") if blob_call == Some(*n) => Some(e),
            (Some(FailOn::CreateTree(e)), "create_tree") => Some(e),
            (Some(FailOn::CreateCommit(e)), "create_commit") => Some(e),
            (Some(FailOn::ChangedFiles(e)), "changed_files") => Some(e),
            (Some(FailOn::CreateBranch(e)), "create_branch") => Some(e),
            (Some(FailOn::UpdateBranch(e)), "update_branch") => Some(e),
            (Some(FailOn::CreateFork(e)), "create_fork") => Some(e),
            _ => None,
        };
        match err {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl Default for MockGitService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GitService for MockGitService {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn query_repository(
        &self,
        query: RepositoryQuery,
    ) -> Result<RepositoryState, ForgeError> {
        self.record(MockOperation::QueryRepository {
            repository: query.repository.to_string(),
            parent_repository: query.parent_repository.as_ref().map(|r| r.to_string()),
            branch: query.branch.as_ref().map(|b| b.to_string()),
            parent_ref: query.parent_ref.as_ref().map(|r| r.to_string()),
        });
        self.check_fail("query_repository")?;

        let state = self.state();
        let cross = query.crosses_repositories();
        let target_branches = state.branches_of(&query.repository)?;
        let source_branches = match &query.parent_repository {
            Some(parent) => state.branches_of(parent)?,
            None => target_branches,
        };

        let default_branch = state.default_branch.as_ref().and_then(|name| {
            let tip = state.tip(source_branches.get(name)?)?;
            Some(DefaultBranchState {
                name: BranchName::new(name.clone()).ok()?,
                tip,
            })
        });
        let target_branch = query
            .branch
            .as_ref()
            .and_then(|b| target_branches.get(b.as_str()))
            .and_then(|sha| state.tip(sha));

        let comparison_base = match &query.branch {
            _ if cross => None,
            Some(_) if target_branch.is_some() => target_branch.as_ref().map(|t| &t.commit),
            _ => default_branch.as_ref().map(|d| &d.tip.commit),
        };
        let parent_ref = query.parent_ref.as_ref().and_then(|name| {
            let (qualified_name, commit) = state.resolve_ref(source_branches, name.as_str())?;
            let tip = state.tip(&commit?)?;
            let descends_from_target = comparison_base.map(|base| state.descends(&tip.commit, base));
            Some(ParentRefState {
                qualified_name,
                tip,
                descends_from_target,
            })
        });

        Ok(RepositoryState {
            viewer_login: state.viewer_login.clone(),
            default_branch,
            target_branch,
            parent_ref,
        })
    }

    async fn create_blob(&self, blob: NewBlob) -> Result<BlobSha, ForgeError> {
        self.record(MockOperation::CreateBlob {
            content: blob.content.clone(),
        });
        self.check_fail("create_blob")?;
        Ok(self.state().store_blob(&blob.content))
    }

    async fn create_tree(&self, tree: NewTree) -> Result<TreeSha, ForgeError> {
        self.record(MockOperation::CreateTree {
            base_tree: tree.base_tree.clone(),
            paths: tree.entries.iter().map(|e| e.path.clone()).collect(),
        });
        self.check_fail("create_tree")?;

        let mut state = self.state();
        let mut contents = match &tree.base_tree {
            Some(base) => state
                .trees
                .get(base)
                .cloned()
                .ok_or_else(|| unprocessable("base_tree is not a valid tree oid"))?,
            None => MockTree::new(),
        };
        for entry in tree.entries {
            if !state.blobs.contains_key(&entry.blob) {
                return Err(unprocessable(format!("tree.sha {} is not a valid blob", entry.blob)));
            }
            contents.insert(entry.path, (entry.blob, entry.mode));
        }
        Ok(state.store_tree(contents))
    }

    async fn create_commit(&self, commit: NewCommit) -> Result<CommitSha, ForgeError> {
        self.record(MockOperation::CreateCommit {
            message: commit.message.clone(),
            parent: commit.parent.clone(),
            tree: commit.tree.clone(),
        });
        self.check_fail("create_commit")?;

        let mut state = self.state();
        if !state.trees.contains_key(&commit.tree) {
            return Err(unprocessable("Tree SHA does not exist"));
        }
        if let Some(parent) = &commit.parent {
            if !state.commits.contains_key(parent) {
                return Err(unprocessable("Parent SHA does not exist or is not a commit object"));
            }
        }
        Ok(state.store_commit(MockCommit {
            message: commit.message,
            tree: commit.tree,
            parent: commit.parent,
            author: commit.author,
            committer: commit.committer,
        }))
    }

    async fn changed_files(
        &self,
        _repository: &RepositoryId,
        commit: &CommitSha,
    ) -> Result<usize, ForgeError> {
        self.record(MockOperation::ChangedFiles {
            commit: commit.clone(),
        });
        self.check_fail("changed_files")?;

        let state = self.state();
        let stored = state
            .commits
            .get(commit)
            .ok_or_else(|| ForgeError::NotFound(format!("No commit found for SHA: {}", commit)))?;
        let empty = MockTree::new();
        let tree = state.trees.get(&stored.tree).unwrap_or(&empty);
        let parent_tree = stored
            .parent
            .as_ref()
            .and_then(|p| state.commits.get(p))
            .and_then(|p| state.trees.get(&p.tree))
            .unwrap_or(&empty);

        let changed = tree
            .iter()
            .filter(|(path, entry)| parent_tree.get(*path) != Some(*entry))
            .count()
            + parent_tree
                .keys()
                .filter(|path| !tree.contains_key(*path))
                .count();
        Ok(changed)
    }

    async fn create_branch(&self, branch: NewBranch) -> Result<(), ForgeError> {
        self.record(MockOperation::CreateBranch {
            branch: branch.branch.to_string(),
            commit: branch.commit.clone(),
        });
        self.check_fail("create_branch")?;

        let mut state = self.state();
        if !state.commits.contains_key(&branch.commit) {
            return Err(unprocessable("Object does not exist"));
        }
        let branches = state.branches_of_mut(&branch.repository)?;
        if branches.contains_key(branch.branch.as_str()) {
            return Err(unprocessable("Reference already exists"));
        }
        branches.insert(branch.branch.to_string(), branch.commit);
        Ok(())
    }

    async fn update_branch(&self, update: BranchUpdate) -> Result<(), ForgeError> {
        let BranchUpdate {
            target: branch,
            force,
        } = update;
        self.record(MockOperation::UpdateBranch {
            branch: branch.branch.to_string(),
            commit: branch.commit.clone(),
            force,
        });
        self.check_fail("update_branch")?;

        let mut state = self.state();
        let current = state
            .branches_of(&branch.repository)?
            .get(branch.branch.as_str())
            .cloned()
            .ok_or_else(|| unprocessable("Reference does not exist"))?;
        if !state.commits.contains_key(&branch.commit) {
            return Err(unprocessable("Object does not exist"));
        }
        if !force && !state.descends(&branch.commit, &current) {
            return Err(unprocessable("Update is not a fast forward"));
        }
        state
            .branches_of_mut(&branch.repository)?
            .insert(branch.branch.to_string(), branch.commit);
        Ok(())
    }

    async fn create_fork(&self, repository: &RepositoryId) -> Result<RepositoryId, ForgeError> {
        self.record(MockOperation::CreateFork {
            repository: repository.to_string(),
        });
        self.check_fail("create_fork")?;

        let mut state = self.state();
        state.check_known(repository)?;
        let fork = RepositoryId::new(state.viewer_login.clone(), repository.name())
            .map_err(|e| unprocessable(e.to_string()))?;
        if &fork == repository {
            return Err(unprocessable("Cannot fork a repository into its own account"));
        }
        if !state.forks.contains_key(&fork) {
            let copied = state.branches.clone();
            state.forks.insert(fork.clone(), copied);
        }
        Ok(fork)
    }
}
