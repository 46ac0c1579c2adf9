//! core::types
//!
//! Strong types for the objects and names the commit pipeline moves around.
//!
//! # Types
//!
//! - [`RepositoryId`] - `owner/name` pair identifying a remote repository
//! - [`BranchName`] - Validated branch short name
//! - [`RefName`] - Any ref the caller may base a commit on (branch, tag, qualified)
//! - [`RefQualifiedName`] - Fully qualified ref split into prefix and name
//! - [`CommitSha`], [`TreeSha`], [`BlobSha`] - Content-addressed object ids
//! - [`FileEntry`], [`FileMode`] - A local file destined for a tree
//! - [`CommitAuthor`] - Optional author/committer identity
//!
//! # Absence
//!
//! Nothing in this module uses the empty string as a sentinel. A missing
//! parent, a missing branch or "the default branch" are all `Option::None`
//! at the call sites.
//!
//! # Examples
//!
//! ```
//! use ghcommit::core::types::{BranchName, CommitSha, RepositoryId};
//!
//! let repo: RepositoryId = "octocat/hello-world".parse().unwrap();
//! assert_eq!(repo.owner(), "octocat");
//!
//! let branch = BranchName::new("feature/docs").unwrap();
//! assert_eq!(branch.qualified_name().to_string(), "refs/heads/feature/docs");
//!
//! assert!(CommitSha::new("not-a-sha").is_err());
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid repository: {0}")]
    InvalidRepository(String),

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid object id: {0}")]
    InvalidSha(String),

    #[error("--parent and --no-parent cannot be combined")]
    ConflictingParentFlags,

    #[error("{0} name and email must be set together")]
    IncompleteIdentity(String),
}

// --------------------------------------------------------------------------
// Repository
// --------------------------------------------------------------------------

/// A remote repository, identified by owner and name.
///
/// Validity requires both parts to be non-empty. Construction through
/// [`RepositoryId::new`] or [`FromStr`] enforces that; [`RepositoryId::is_valid`]
/// exists for values assembled from raw CLI input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct RepositoryId {
    owner: String,
    name: String,
}

impl RepositoryId {
    /// Create a repository id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepository` if either part is empty.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, TypeError> {
        let id = Self::unchecked(owner, name);
        if !id.is_valid() {
            return Err(TypeError::InvalidRepository(
                "owner and name must both be set".into(),
            ));
        }
        Ok(id)
    }

    /// Assemble a repository id without validating it.
    ///
    /// Orchestrators validate the result as their first step, so callers that
    /// forward raw user input use this and let validation report the problem.
    pub fn unchecked(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// True when both owner and name are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.owner.is_empty() && !self.name.is_empty()
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepositoryId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s.split_once('/').ok_or_else(|| {
            TypeError::InvalidRepository(format!("expected OWNER/NAME, got '{s}'"))
        })?;
        if name.contains('/') {
            return Err(TypeError::InvalidRepository(format!(
                "expected OWNER/NAME, got '{s}'"
            )));
        }
        Self::new(owner, name)
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// --------------------------------------------------------------------------
// Branch and ref names
// --------------------------------------------------------------------------

/// Check a ref or branch name against the rules of `git check-ref-format`.
///
/// Returns a short human-readable reason on failure.
fn check_ref_format(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".into());
    }
    if name == "@" {
        return Err("name cannot be '@'".into());
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err("name cannot begin or end with '/'".into());
    }
    if name.ends_with('.') {
        return Err("name cannot end with '.'".into());
    }
    for forbidden in ["..", "@{", "//"] {
        if name.contains(forbidden) {
            return Err(format!("name cannot contain '{forbidden}'"));
        }
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_ascii_control() || " ~^:\\?*[".contains(*c))
    {
        return Err(format!("name cannot contain {c:?}"));
    }
    for component in name.split('/') {
        if component.starts_with('.') {
            return Err("a component cannot start with '.'".into());
        }
        if component.ends_with(".lock") {
            return Err("a component cannot end with '.lock'".into());
        }
    }
    Ok(())
}

/// A validated branch short name, e.g. `main` or `feature/docs`.
///
/// # Example
///
/// ```
/// use ghcommit::core::types::BranchName;
///
/// assert!(BranchName::new("topic").is_ok());
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("-flag").is_err());
/// assert!(BranchName::new("with space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules
    /// or looks like a command-line flag.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "name cannot start with '-'".into(),
            ));
        }
        check_ref_format(&name).map_err(TypeError::InvalidBranchName)?;
        Ok(Self(name))
    }

    /// The fully qualified ref of this branch (`refs/heads/<name>`).
    pub fn qualified_name(&self) -> RefQualifiedName {
        RefQualifiedName::new(RefQualifiedName::HEADS, self.0.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl FromStr for BranchName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ref a commit may be based on: a branch, a tag, or a qualified ref.
///
/// Short names (`main`, `v1.0`) are resolved by the remote service the same
/// way `git rev-parse` would; qualified names (`refs/tags/v1.0`) are taken as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_ref_format(&name).map_err(TypeError::InvalidRefName)?;
        Ok(Self(name))
    }

    /// True if the name starts with `refs/`.
    pub fn is_qualified(&self) -> bool {
        self.0.starts_with("refs/")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&BranchName> for RefName {
    fn from(branch: &BranchName) -> Self {
        Self(branch.as_str().to_string())
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl FromStr for RefName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully qualified ref, e.g. prefix `refs/heads/` and name `main`.
///
/// The zero value (`Default`) is invalid and displays as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RefQualifiedName {
    pub prefix: String,
    pub name: String,
}

impl RefQualifiedName {
    /// Prefix of branch refs.
    pub const HEADS: &'static str = "refs/heads/";
    /// Prefix of tag refs.
    pub const TAGS: &'static str = "refs/tags/";

    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
        }
    }

    /// True when both prefix and name are set.
    pub fn is_valid(&self) -> bool {
        !self.prefix.is_empty() && !self.name.is_empty()
    }
}

impl std::fmt::Display for RefQualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "{}{}", self.prefix, self.name)
        } else {
            Ok(())
        }
    }
}

// --------------------------------------------------------------------------
// Object ids
// --------------------------------------------------------------------------

/// Declare a hex object-id newtype. The three kinds are kept distinct so a
/// tree id cannot be passed where a commit id is expected.
macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new object id, normalized to lowercase.
            ///
            /// # Errors
            ///
            /// Returns `TypeError::InvalidSha` unless the value is non-empty hex.
            pub fn new(sha: impl Into<String>) -> Result<Self, TypeError> {
                let sha = sha.into().to_ascii_lowercase();
                if sha.is_empty() {
                    return Err(TypeError::InvalidSha("object id cannot be empty".into()));
                }
                if !sha.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(TypeError::InvalidSha(format!(
                        "object id must be hexadecimal, got '{sha}'"
                    )));
                }
                Ok(Self(sha))
            }

            /// Build an id from raw digest bytes.
            pub fn from_digest(bytes: &[u8]) -> Self {
                Self(hex::encode(bytes))
            }

            /// Abbreviated form for log lines.
            pub fn short(&self) -> &str {
                &self.0[..self.0.len().min(7)]
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(sha: $name) -> Self {
                sha.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

object_id!(
    /// Id of a commit object.
    CommitSha
);
object_id!(
    /// Id of a tree object.
    TreeSha
);
object_id!(
    /// Id of a blob object.
    BlobSha
);

// --------------------------------------------------------------------------
// Files and commit metadata
// --------------------------------------------------------------------------

/// A local file to place in the tree.
///
/// `path` is relative to the working directory and always uses `/` as the
/// separator, since it becomes the tree path verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub executable: bool,
}

/// Git file mode of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    Regular,
    Executable,
}

impl FileMode {
    /// Mode for a file, ignoring the executable bit when `no_file_mode` is set.
    pub fn for_file(executable: bool, no_file_mode: bool) -> Self {
        if executable && !no_file_mode {
            FileMode::Executable
        } else {
            FileMode::Regular
        }
    }

    /// The octal mode string used in tree objects.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Executable => "100755",
        }
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author or committer identity of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

impl CommitAuthor {
    /// Build an identity from optional name/email flags.
    ///
    /// Both unset yields `Ok(None)` (the service uses the token's user).
    ///
    /// # Errors
    ///
    /// Returns `TypeError::IncompleteIdentity` naming the `role` when only
    /// one of the pair is given.
    pub fn from_parts(
        role: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Option<Self>, TypeError> {
        match (name, email) {
            (None, None) => Ok(None),
            (Some(name), Some(email)) if !name.is_empty() && !email.is_empty() => {
                Ok(Some(Self { name, email }))
            }
            _ => Err(TypeError::IncompleteIdentity(role.to_string())),
        }
    }
}
