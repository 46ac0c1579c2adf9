//! engine::resolve
//!
//! Repository state resolution.
//!
//! One call, one round trip: the acting user, the default branch, the
//! target branch and the parent ref are fetched together. A branch or ref
//! that does not exist comes back as `None`; only an unreadable repository
//! is an error.
//!
//! The default branch and the parent ref come from the parent repository
//! when one is given (a fork's upstream), the target branch always from the
//! target repository.

use super::error::EngineError;
use crate::core::types::{BranchName, RefName, RepositoryId};
use crate::forge::{GitService, RepositoryQuery, RepositoryState};

/// Fetch everything the policy needs to plan a commit.
///
/// `branch` is the named target (`None` for the default branch) and
/// `parent_ref` the ref to base the commit on, if any.
///
/// # Errors
///
/// Returns `EngineError::Resolution` if the service call fails.
pub async fn resolve(
    service: &dyn GitService,
    repository: &RepositoryId,
    parent_repository: Option<&RepositoryId>,
    branch: Option<&BranchName>,
    parent_ref: Option<&RefName>,
) -> Result<RepositoryState, EngineError> {
    let query = RepositoryQuery {
        repository: repository.clone(),
        parent_repository: parent_repository.cloned(),
        branch: branch.cloned(),
        parent_ref: parent_ref.cloned(),
    };

    let state = service
        .query_repository(query)
        .await
        .map_err(|source| EngineError::Resolution {
            repository: repository.clone(),
            source,
        })?;

    tracing::debug!(
        service = service.name(),
        viewer = %state.viewer_login,
        default_branch = ?state.default_branch.as_ref().map(|d| d.name.as_str()),
        target_exists = state.target_branch.is_some(),
        parent_ref_exists = state.parent_ref.is_some(),
        "resolved {}",
        repository
    );
    Ok(state)
}
