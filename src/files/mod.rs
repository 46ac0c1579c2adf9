//! files
//!
//! Local file discovery and content access.
//!
//! # Design
//!
//! The commit pipeline needs two things from the local disk: the list of
//! files to place in the tree and their base64 content. Both go through the
//! [`FileSystem`] trait so orchestrators never touch `std::fs` directly.
//!
//! Discovery is synchronous and runs once, before any network call. Content
//! is read asynchronously: reads happen inside the concurrent blob upload
//! stream and must not stall the runtime thread driving the uploads.
//!
//! [`LocalFileSystem`] resolves every path against a base directory (the
//! `-C` flag, or the current directory). Tree paths are the file's path
//! relative to that base, `/`-separated.
//!
//! # Discovery Rules
//!
//! - A file argument yields that file
//! - A directory argument is walked recursively, sorted by file name
//! - `.git` directories are never descended into
//! - Only regular files are collected; symlinks and special files are skipped
//! - A file reached twice (overlapping arguments) is listed once, at its
//!   first position
//!
//! # Example
//!
//! ```ignore
//! use ghcommit::files::{FileSystem, LocalFileSystem};
//! use std::path::PathBuf;
//!
//! let fs = LocalFileSystem::new(".");
//! let files = fs.find_files(&[PathBuf::from("docs")])?;
//! for file in &files {
//!     let content = fs.read_encoded(&file.path).await?;
//!     println!("{} ({} base64 bytes)", file.path, content.len());
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::types::FileEntry;

/// Errors from local file access.
#[derive(Debug, Error)]
pub enum FileError {
    /// The path could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path resolves outside the base directory.
    #[error("{path} is outside of {base}")]
    OutsideBase { path: PathBuf, base: PathBuf },
}

/// Source of files for a commit.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Expand the given paths into the files to commit, in a deterministic order.
    ///
    /// # Errors
    ///
    /// Returns `FileError` naming the first path that cannot be read.
    fn find_files(&self, paths: &[PathBuf]) -> Result<Vec<FileEntry>, FileError>;

    /// Read a discovered file and return its content base64-encoded.
    async fn read_encoded(&self, path: &str) -> Result<String, FileError>;
}

/// [`FileSystem`] over the local disk, rooted at a base directory.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    base_dir: PathBuf,
}

impl LocalFileSystem {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Tree path of a file under the base directory.
    ///
    /// `.` and `..` components are folded lexically so that `-C sub ../x`
    /// is rejected rather than silently escaping.
    fn tree_path(&self, full: &Path) -> Result<String, FileError> {
        let outside = || FileError::OutsideBase {
            path: full.to_path_buf(),
            base: self.base_dir.clone(),
        };
        let relative = full.strip_prefix(&self.base_dir).map_err(|_| outside())?;

        let mut parts: Vec<String> = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => {
                    parts.pop().ok_or_else(outside)?;
                }
                Component::RootDir | Component::Prefix(_) => return Err(outside()),
            }
        }
        if parts.is_empty() {
            return Err(outside());
        }
        Ok(parts.join("/"))
    }

    fn entry(&self, full: &Path, metadata: &fs::Metadata) -> Result<FileEntry, FileError> {
        Ok(FileEntry {
            path: self.tree_path(full)?,
            executable: is_executable(metadata),
        })
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    fn find_files(&self, paths: &[PathBuf]) -> Result<Vec<FileEntry>, FileError> {
        let mut files = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |entry: FileEntry| {
            if seen.insert(entry.path.clone()) {
                tracing::debug!(path = %entry.path, executable = entry.executable, "found file");
                files.push(entry);
            }
        };

        for path in paths {
            let full = self.base_dir.join(path);
            let metadata = fs::metadata(&full).map_err(|source| FileError::Io {
                path: full.clone(),
                source,
            })?;

            if !metadata.is_dir() {
                push(self.entry(&full, &metadata)?);
                continue;
            }

            let walker = WalkDir::new(&full)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == ".git"));
            for entry in walker {
                let entry = entry.map_err(|e| FileError::Io {
                    path: e.path().map(Path::to_path_buf).unwrap_or_else(|| full.clone()),
                    source: e.into(),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let metadata = entry.metadata().map_err(|e| FileError::Io {
                    path: entry.path().to_path_buf(),
                    source: e.into(),
                })?;
                push(self.entry(entry.path(), &metadata)?);
            }
        }
        Ok(files)
    }

    async fn read_encoded(&self, path: &str) -> Result<String, FileError> {
        let full = self.base_dir.join(path);
        let content = tokio::fs::read(&full)
            .await
            .map_err(|source| FileError::Io { path: full, source })?;
        Ok(STANDARD.encode(content))
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o100 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}
