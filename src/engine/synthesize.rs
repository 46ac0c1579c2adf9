//! engine::synthesize
//!
//! Commit synthesis: blobs, one tree, one commit, one change count.
//!
//! # Design
//!
//! Blob uploads are independent, so they run concurrently with at most
//! `upload_concurrency` requests in flight. The stream is `buffered`, not
//! `buffer_unordered`: results come back in discovery order, so each blob id
//! stays paired with the file it came from and the tree entries keep that
//! order. All uploads complete before the tree request is sent. The first
//! failed upload ends the stream, and dropping it cancels the rest.
//!
//! Each upload reads its file through the async [`FileSystem::read_encoded`],
//! so disk reads overlap with requests in flight instead of blocking the
//! task that polls the stream.
//!
//! Tree, commit and change count are sequential. Objects created before a
//! failure are left unreferenced; the service collects them.

use futures::stream::{self, StreamExt, TryStreamExt};

use super::error::SynthesisError;
use crate::core::types::{
    BlobSha, CommitAuthor, CommitSha, FileEntry, FileMode, RepositoryId, TreeSha,
};
use crate::files::FileSystem;
use crate::forge::{GitService, NewBlob, NewCommit, NewTree, RefTip, TreeEntry};

/// Blob uploads in flight when nothing else is configured.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;

/// Upper bound accepted for the upload concurrency.
pub const MAX_UPLOAD_CONCURRENCY: usize = 32;

/// Input of [`synthesize`].
#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
    pub repository: &'a RepositoryId,
    /// Parent commit and base tree; `None` builds a rootless commit over a
    /// tree holding only `files`.
    pub parent: Option<&'a RefTip>,
    pub message: &'a str,
    pub author: Option<&'a CommitAuthor>,
    pub committer: Option<&'a CommitAuthor>,
    pub files: &'a [FileEntry],
    /// Record every file as `100644`, ignoring executable bits.
    pub no_file_mode: bool,
    pub upload_concurrency: usize,
}

/// The commit that was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedCommit {
    pub commit: CommitSha,
    pub tree: TreeSha,
    /// Files the commit changes relative to its parent. Zero means the new
    /// tree equals the parent's.
    pub changed_files: usize,
}

/// Upload the files and create the commit.
///
/// # Errors
///
/// Returns the `SynthesisError` of the first failing step, naming the file
/// or object involved.
pub async fn synthesize(
    service: &dyn GitService,
    files: &dyn FileSystem,
    request: SynthesisRequest<'_>,
) -> Result<SynthesizedCommit, SynthesisError> {
    let repository = request.repository;

    let entries: Vec<TreeEntry> = stream::iter(request.files)
        .map(|file| upload_blob(service, files, repository, file, request.no_file_mode))
        .buffered(request.upload_concurrency.max(1))
        .try_collect()
        .await?;
    tracing::info!("uploaded {} file(s)", entries.len());

    let entry_count = entries.len();
    let base_tree = request.parent.map(|p| p.tree.clone());
    let tree = service
        .create_tree(NewTree {
            repository: repository.clone(),
            base_tree: base_tree.clone(),
            entries,
        })
        .await
        .map_err(|source| SynthesisError::CreateTree {
            entries: entry_count,
            source,
        })?;
    match &base_tree {
        Some(base) => tracing::info!("created tree {} on base tree {}", tree.short(), base.short()),
        None => tracing::info!("created tree {}", tree.short()),
    }

    let parent = request.parent.map(|p| p.commit.clone());
    let commit = service
        .create_commit(NewCommit {
            repository: repository.clone(),
            message: request.message.to_string(),
            parent: parent.clone(),
            tree: tree.clone(),
            author: request.author.cloned(),
            committer: request.committer.cloned(),
        })
        .await
        .map_err(|source| SynthesisError::CreateCommit { source })?;
    match &parent {
        Some(parent) => tracing::info!("created commit {} on {}", commit.short(), parent.short()),
        None => tracing::info!("created commit {} with no parent", commit.short()),
    }

    // A rootless commit changes every path it writes.
    let changed_files = if parent.is_some() {
        service
            .changed_files(repository, &commit)
            .await
            .map_err(|source| SynthesisError::ChangedFiles {
                commit: commit.clone(),
                source,
            })?
    } else {
        entry_count
    };
    tracing::debug!(commit = %commit, changed_files, "counted changes");

    Ok(SynthesizedCommit {
        commit,
        tree,
        changed_files,
    })
}

async fn upload_blob(
    service: &dyn GitService,
    files: &dyn FileSystem,
    repository: &RepositoryId,
    file: &FileEntry,
    no_file_mode: bool,
) -> Result<TreeEntry, SynthesisError> {
    let content = files
        .read_encoded(&file.path)
        .await
        .map_err(|source| SynthesisError::ReadFile {
            path: file.path.clone(),
            source,
        })?;

    let blob: BlobSha = service
        .create_blob(NewBlob {
            repository: repository.clone(),
            content,
        })
        .await
        .map_err(|source| SynthesisError::CreateBlob {
            path: file.path.clone(),
            source,
        })?;

    let mode = FileMode::for_file(file.executable, no_file_mode);
    tracing::info!("uploaded {} as blob {} ({})", file.path, blob.short(), mode);
    Ok(TreeEntry {
        path: file.path.clone(),
        blob,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::LocalFileSystem;
    use crate::forge::mock::{FailOn, MockGitService, MockOperation};
    use crate::forge::ForgeError;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn repo() -> RepositoryId {
        RepositoryId::new("octocat", "hello-world").unwrap()
    }

    fn workdir(files: &[(&str, &str)]) -> (TempDir, Vec<FileEntry>) {
        let dir = TempDir::new().unwrap();
        let mut entries = Vec::new();
        for (path, content) in files {
            fs::write(dir.path().join(path), content).unwrap();
            entries.push(FileEntry {
                path: path.to_string(),
                executable: false,
            });
        }
        (dir, entries)
    }

    fn request<'a>(
        repository: &'a RepositoryId,
        parent: Option<&'a RefTip>,
        files: &'a [FileEntry],
    ) -> SynthesisRequest<'a> {
        SynthesisRequest {
            repository,
            parent,
            message: "update files",
            author: None,
            committer: None,
            files,
            no_file_mode: false,
            upload_concurrency: 2,
        }
    }

    fn tip_of(service: &MockGitService, commit: &CommitSha) -> RefTip {
        RefTip {
            commit: commit.clone(),
            tree: service.commit(commit).unwrap().tree,
        }
    }

    #[tokio::test]
    async fn entries_keep_discovery_order() {
        let service = MockGitService::new();
        let (dir, files) = workdir(&[("z.txt", "z"), ("a.txt", "a"), ("m.txt", "m")]);
        let fs = LocalFileSystem::new(dir.path());
        let repo = repo();

        synthesize(&service, &fs, request(&repo, None, &files))
            .await
            .unwrap();

        let tree_paths = service.operations().into_iter().find_map(|op| match op {
            MockOperation::CreateTree { paths, .. } => Some(paths),
            _ => None,
        });
        assert_eq!(
            tree_paths,
            Some(vec!["z.txt".to_string(), "a.txt".into(), "m.txt".into()])
        );
    }

    #[tokio::test]
    async fn rootless_commit_counts_entries_without_query() {
        let service = MockGitService::new();
        let (dir, files) = workdir(&[("a.txt", "a"), ("b.txt", "b")]);
        let fs = LocalFileSystem::new(dir.path());
        let repo = repo();

        let result = synthesize(&service, &fs, request(&repo, None, &files))
            .await
            .unwrap();

        assert_eq!(result.changed_files, 2);
        assert!(service.commit(&result.commit).unwrap().parent.is_none());
        assert!(!service
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::ChangedFiles { .. })));
    }

    #[tokio::test]
    async fn unchanged_content_counts_zero() {
        let service = MockGitService::new();
        let root = service.seed_commit(&[("a.txt", "YQ==")], None);
        let parent = tip_of(&service, &root);
        let (dir, files) = workdir(&[("a.txt", "a")]);
        let fs = LocalFileSystem::new(dir.path());
        let repo = repo();

        let result = synthesize(&service, &fs, request(&repo, Some(&parent), &files))
            .await
            .unwrap();

        assert_eq!(result.changed_files, 0);
        assert_eq!(result.tree, parent.tree);
    }

    #[tokio::test]
    async fn executable_mode_follows_flag() {
        let service = MockGitService::new();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("run.sh"), "#!/bin/sh").unwrap();
        let files = vec![FileEntry {
            path: "run.sh".into(),
            executable: true,
        }];
        let fs = LocalFileSystem::new(dir.path());
        let repo = repo();

        let result = synthesize(&service, &fs, request(&repo, None, &files))
            .await
            .unwrap();
        let tree = service.tree(&result.tree).unwrap();
        assert_eq!(tree["run.sh"].1, FileMode::Executable);

        let mut req = request(&repo, None, &files);
        req.no_file_mode = true;
        let result = synthesize(&service, &fs, req).await.unwrap();
        let tree = service.tree(&result.tree).unwrap();
        assert_eq!(tree["run.sh"].1, FileMode::Regular);
    }

    #[tokio::test]
    async fn failed_upload_stops_before_tree() {
        let service =
            MockGitService::new().fail_on(FailOn::CreateBlobNth(1, ForgeError::RateLimited));
        let (dir, files) = workdir(&[("a.txt", "a"), ("b.txt", "b"), ("c.txt", "c")]);
        let fs = LocalFileSystem::new(dir.path());
        let repo = repo();

        let err = synthesize(&service, &fs, request(&repo, None, &files))
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisError::CreateBlob { .. }));
        assert!(!service
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::CreateTree { .. })));
    }

    /// Reports fixed content and records how many reads were pending at once.
    struct SlowFiles {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl FileSystem for SlowFiles {
        fn find_files(
            &self,
            _paths: &[std::path::PathBuf],
        ) -> Result<Vec<FileEntry>, crate::files::FileError> {
            Ok(Vec::new())
        }

        async fn read_encoded(&self, path: &str) -> Result<String, crate::files::FileError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("{}=", path.len()))
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn reads_overlap_within_upload_window() {
        let service = MockGitService::new();
        let files: Vec<FileEntry> = ["a.txt", "b.txt", "c.txt"]
            .iter()
            .map(|p| FileEntry {
                path: p.to_string(),
                executable: false,
            })
            .collect();
        let slow = SlowFiles {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let repo = repo();

        synthesize(&service, &slow, request(&repo, None, &files))
            .await
            .unwrap();

        assert_eq!(slow.peak.load(Ordering::SeqCst), 2);
        assert_eq!(slow.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreadable_file_names_path() {
        let service = MockGitService::new();
        let dir = TempDir::new().unwrap();
        let files = vec![FileEntry {
            path: "vanished.txt".into(),
            executable: false,
        }];
        let fs = LocalFileSystem::new(dir.path());
        let repo = repo();

        let err = synthesize(&service, &fs, request(&repo, None, &files))
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::ReadFile { ref path, .. } if path == "vanished.txt"));
    }
}
