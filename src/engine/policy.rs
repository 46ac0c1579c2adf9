//! engine::policy
//!
//! Pure branch update policy: which commit the new commit descends from,
//! and how the branch ref moves afterwards.
//!
//! # Decision Table
//!
//! | Target | NoParent | FastForward | FromRef(r) |
//! |---|---|---|---|
//! | absent named branch | no parent | default branch tip | tip of r |
//! | existing named branch | no parent, forced | branch tip | tip of r |
//! | default branch | no parent, forced | default tip | tip of r |
//!
//! An absent target is always created. An existing target is updated with
//! `force` exactly when the new parent may not descend from its current tip:
//! always for `NoParent`, never for `FastForward`, and for `FromRef` unless
//! the service reported that `r` descends from (or equals) the current tip.
//!
//! # Invariants
//!
//! - No I/O; the same inputs always give the same plan
//! - Every rejection happens here, before any blob is uploaded

use std::fmt;

use super::error::PolicyError;
use crate::core::types::{BranchName, RefName, TypeError};
use crate::forge::{RefTip, RepositoryState};

/// Which existing commit the new commit descends from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentSelection {
    /// A rootless commit.
    NoParent,
    /// The current tip of the target (the default branch for a new branch).
    FastForward,
    /// The tip of an arbitrary ref.
    FromRef(RefName),
}

impl ParentSelection {
    /// Build a selection from the `--parent` and `--no-parent` flags.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::ConflictingParentFlags` when both flags are given.
    pub fn from_flags(parent: Option<RefName>, no_parent: bool) -> Result<Self, TypeError> {
        match (parent, no_parent) {
            (Some(_), true) => Err(TypeError::ConflictingParentFlags),
            (Some(r), false) => Ok(Self::FromRef(r)),
            (None, true) => Ok(Self::NoParent),
            (None, false) => Ok(Self::FastForward),
        }
    }

    /// The ref to resolve, if any.
    pub fn parent_ref(&self) -> Option<&RefName> {
        match self {
            Self::FromRef(r) => Some(r),
            Self::NoParent | Self::FastForward => None,
        }
    }
}

impl fmt::Display for ParentSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoParent => f.write_str("no parent"),
            Self::FastForward => f.write_str("fast-forward"),
            Self::FromRef(r) => write!(f, "parent {}", r),
        }
    }
}

/// What the caller allows to happen to the target branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchIntent {
    /// Create the branch if absent, otherwise update it.
    CreateOrUpdate,
    /// The branch must not exist yet.
    CreateOnly,
    /// The branch must exist (or be the default branch).
    UpdateOnly,
}

/// How the branch ref moves once the commit exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefMutation {
    Create { branch: BranchName },
    Update { branch: BranchName, force: bool },
}

impl RefMutation {
    pub fn branch(&self) -> &BranchName {
        match self {
            Self::Create { branch } | Self::Update { branch, .. } => branch,
        }
    }
}

impl fmt::Display for RefMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { branch } => write!(f, "create branch {}", branch),
            Self::Update {
                branch,
                force: false,
            } => write!(f, "fast-forward branch {}", branch),
            Self::Update {
                branch,
                force: true,
            } => write!(f, "force-update branch {}", branch),
        }
    }
}

/// Result of the policy: parent of the new commit and the ref mutation.
///
/// `parent` also supplies the base tree; `None` means a rootless commit
/// over a tree holding only the committed files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPlan {
    pub parent: Option<RefTip>,
    pub mutation: RefMutation,
}

/// The target branch as seen in the resolved state.
enum Target<'a> {
    /// The repository's default branch.
    Default { name: &'a BranchName, tip: &'a RefTip },
    /// A named branch that exists.
    Existing { name: &'a BranchName, tip: &'a RefTip },
    /// A named branch that does not exist yet.
    Absent { name: &'a BranchName },
}

/// Decide parent and ref mutation for a commit onto `branch`
/// (`None` = default branch).
///
/// # Errors
///
/// - `BranchExists` for `CreateOnly` on an existing branch
/// - `BranchMissing` for `UpdateOnly` on an absent branch
/// - `ParentRefNotFound` when `FromRef` does not resolve
/// - `NoDefaultBranch` when the default branch is needed but missing
///
/// # Example
///
/// ```
/// use ghcommit::engine::policy::{plan, BranchIntent, ParentSelection, RefMutation};
/// use ghcommit::core::types::BranchName;
/// use ghcommit::forge::RepositoryState;
///
/// let state = RepositoryState {
///     viewer_login: "octocat".into(),
///     default_branch: None,
///     target_branch: None,
///     parent_ref: None,
/// };
/// let topic = BranchName::new("topic").unwrap();
/// let plan = plan(&state, Some(&topic), &ParentSelection::NoParent, BranchIntent::CreateOrUpdate)
///     .unwrap();
/// assert_eq!(plan.parent, None);
/// assert_eq!(plan.mutation, RefMutation::Create { branch: topic });
/// ```
pub fn plan(
    state: &RepositoryState,
    branch: Option<&BranchName>,
    selection: &ParentSelection,
    intent: BranchIntent,
) -> Result<BranchPlan, PolicyError> {
    let target = match (branch, &state.target_branch) {
        (None, _) => {
            let default = state
                .default_branch
                .as_ref()
                .ok_or(PolicyError::NoDefaultBranch)?;
            Target::Default {
                name: &default.name,
                tip: &default.tip,
            }
        }
        (Some(name), Some(tip)) => Target::Existing { name, tip },
        (Some(name), None) => Target::Absent { name },
    };

    match (&target, intent) {
        (Target::Default { name, .. } | Target::Existing { name, .. }, BranchIntent::CreateOnly) => {
            return Err(PolicyError::BranchExists((*name).clone()));
        }
        (Target::Absent { name }, BranchIntent::UpdateOnly) => {
            return Err(PolicyError::BranchMissing((*name).clone()));
        }
        _ => {}
    }

    let parent = match selection {
        ParentSelection::NoParent => None,
        ParentSelection::FastForward => match &target {
            Target::Default { tip, .. } | Target::Existing { tip, .. } => Some((*tip).clone()),
            Target::Absent { .. } => {
                let default = state
                    .default_branch
                    .as_ref()
                    .ok_or(PolicyError::NoDefaultBranch)?;
                Some(default.tip.clone())
            }
        },
        ParentSelection::FromRef(r) => {
            let resolved = state
                .parent_ref
                .as_ref()
                .ok_or_else(|| PolicyError::ParentRefNotFound(r.clone()))?;
            Some(resolved.tip.clone())
        }
    };

    let mutation = match target {
        Target::Absent { name } => RefMutation::Create {
            branch: name.clone(),
        },
        Target::Default { name, .. } | Target::Existing { name, .. } => {
            let force = match selection {
                ParentSelection::NoParent => true,
                ParentSelection::FastForward => false,
                ParentSelection::FromRef(_) => !state
                    .parent_ref
                    .as_ref()
                    .and_then(|p| p.descends_from_target)
                    .unwrap_or(false),
            };
            RefMutation::Update {
                branch: name.clone(),
                force,
            }
        }
    };

    tracing::debug!(
        %selection,
        %mutation,
        parent = ?parent.as_ref().map(|p| p.commit.short()),
        "planned commit"
    );
    Ok(BranchPlan { parent, mutation })
}
