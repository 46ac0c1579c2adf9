//! forge::github
//!
//! GitHub implementation of [`GitService`] using the REST and GraphQL APIs.
//!
//! # Design
//!
//! - REST v3 (`/repos/{owner}/{repo}/git/...`) creates blobs, trees, commits
//!   and refs, since the Git Data API exposes exactly those primitives.
//! - GraphQL v4 answers the batched repository state query (viewer, default
//!   branch, target branch, parent ref and their ancestry) in one round trip,
//!   and reports the changed-file count of a commit. When the parent comes
//!   from a fork's upstream, the same query reads both repositories.
//! - Forks are created with REST and polled with GraphQL until their git
//!   data is readable.
//!
//! # Rate Limiting
//!
//! A 429 maps to `ForgeError::RateLimited`. Nothing is retried here; the
//! pipeline surfaces the error to the caller. Polling a new fork is the only
//! repeated request, bounded by [`FORK_POLL_ATTEMPTS`].
//!
//! # GitHub Enterprise
//!
//! Pass the v3 base URL (e.g. `https://github.example.com/api/v3`) to
//! [`GitHubService::with_api_base`]; the GraphQL endpoint is inferred.
//!
//! # Example
//!
//! ```ignore
//! use ghcommit::forge::github::GitHubService;
//! use ghcommit::forge::{GitService, NewBlob};
//!
//! let service = GitHubService::new("ghp_xxx");
//! let sha = service.create_blob(NewBlob { repository, content }).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::traits::{
    BranchUpdate, DefaultBranchState, ForgeError, GitService, NewBlob, NewBranch, NewCommit,
    NewTree, ParentRefState, RefTip, RepositoryQuery, RepositoryState,
};
use crate::core::types::{
    BlobSha, BranchName, CommitAuthor, CommitSha, RefQualifiedName, RepositoryId, TreeSha,
};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "ghcommit";

/// Readability checks made on a new fork before giving up.
pub const FORK_POLL_ATTEMPTS: u32 = 10;

/// Delay between two readability checks of a new fork.
const FORK_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// GitHub implementation of the remote Git service.
pub struct GitHubService {
    /// HTTP client for making requests
    client: Client,
    /// Personal access token or app token
    token: String,
    /// REST API base URL (configurable for GitHub Enterprise)
    api_base: String,
    /// GraphQL endpoint, inferred from `api_base`
    graphql_url: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubService")
            .field("has_token", &!self.token.is_empty())
            .field("api_base", &self.api_base)
            .field("graphql_url", &self.graphql_url)
            .finish()
    }
}

impl GitHubService {
    /// Create a service for github.com.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Create a service for a custom REST base URL (GitHub Enterprise).
    ///
    /// The GraphQL endpoint is derived with [`graphql_url_for`].
    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            token: token.into(),
            graphql_url: graphql_url_for(&api_base),
            api_base,
        }
    }

    /// Apply a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::NetworkError` if the HTTP client cannot be built.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ForgeError> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        Ok(self)
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn graphql_url(&self) -> &str {
        &self.graphql_url
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        if self.token.is_empty() {
            return Err(ForgeError::AuthRequired);
        }
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, repository: &RepositoryId, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base,
            repository.owner(),
            repository.name(),
            path
        )
    }

    /// URL of a branch ref, one path segment per `/` component of the name.
    ///
    /// Characters such as `#`, `?` and `%` are percent-encoded, so they stay
    /// part of the ref name instead of ending the path.
    fn branch_ref_url(
        &self,
        repository: &RepositoryId,
        branch: &BranchName,
    ) -> Result<Url, ForgeError> {
        let invalid = || ForgeError::ApiError {
            status: 0,
            message: format!("cannot build a ref URL from {}", self.api_base),
        };
        let mut url =
            Url::parse(&self.repo_url(repository, "git/refs/heads")).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .extend(branch.as_str().split('/'));
        Ok(url)
    }

    /// Send a request with auth headers and decode the JSON response.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ForgeError> {
        let response = request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        self.handle_response(response).await
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(self.handle_error_response(response, status).await)
        }
    }

    /// Map an error response from the API to a `ForgeError`.
    async fn handle_error_response(&self, response: Response, status: StatusCode) -> ForgeError {
        // GitHub Apps report fine-grained permissions, classic tokens report scopes.
        let headers = response.headers();
        let required = headers
            .get("X-Accepted-GitHub-Permissions")
            .or_else(|| headers.get("X-Accepted-OAuth-Scopes"))
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => match required {
                Some(required) => ForgeError::AuthFailed(format!(
                    "Permission denied: {} [required: {}]",
                    message, required
                )),
                None => ForgeError::AuthFailed(format!("Permission denied: {}", message)),
            },
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Execute a GraphQL query and return its `data`.
    ///
    /// Errors whose path runs through a `compare` field are dropped: they
    /// mean the comparison could not be computed, which callers treat as
    /// unknown ancestry rather than a failed query.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ForgeError> {
        let body = json!({ "query": query, "variables": variables });
        let result: GraphQLResponse<T> =
            self.send(self.client.post(&self.graphql_url).json(&body)).await?;

        let fatal: Vec<GraphQLError> = result
            .errors
            .unwrap_or_default()
            .into_iter()
            .filter(|e| !e.is_comparison_error())
            .collect();
        if let Some(err) = fatal.into_iter().next() {
            return Err(match err.error_type.as_deref() {
                Some("NOT_FOUND") => ForgeError::NotFound(err.message),
                Some("FORBIDDEN") => ForgeError::AuthFailed(err.message),
                Some("RATE_LIMITED") => ForgeError::RateLimited,
                _ => ForgeError::ApiError {
                    status: 200,
                    message: err.message,
                },
            });
        }

        result.data.ok_or_else(|| ForgeError::ApiError {
            status: 200,
            message: "GraphQL response has no data".into(),
        })
    }

    /// Poll until the fork's default branch resolves to a commit.
    ///
    /// GitHub creates forks asynchronously; until the copy finishes the
    /// repository is missing or has no default branch.
    async fn wait_for_fork(&self, fork: &RepositoryId) -> Result<(), ForgeError> {
        for attempt in 1..=FORK_POLL_ATTEMPTS {
            let variables = json!({ "owner": fork.owner(), "name": fork.name() });
            match self.graphql::<ForkReadyData>(FORK_READY_QUERY, variables).await {
                Ok(data) if data.is_ready() => return Ok(()),
                Ok(_) | Err(ForgeError::NotFound(_)) => {
                    tracing::debug!(attempt, "fork {} is not readable yet", fork);
                }
                Err(e) => return Err(e),
            }
            if attempt < FORK_POLL_ATTEMPTS {
                tokio::time::sleep(FORK_POLL_INTERVAL).await;
            }
        }
        Err(ForgeError::NetworkError(format!(
            "fork {} was not readable after {} checks",
            fork, FORK_POLL_ATTEMPTS
        )))
    }

    /// Count the files of a commit through the REST commit endpoint.
    async fn changed_files_from_rest(
        &self,
        repository: &RepositoryId,
        commit: &CommitSha,
    ) -> Result<usize, ForgeError> {
        let url = self.repo_url(repository, &format!("commits/{}", commit));
        let detail: GitHubCommitDetail = self.send(self.client.get(&url)).await?;
        Ok(detail.files.len())
    }
}

/// Derive the GraphQL endpoint from a REST base URL.
///
/// - `https://api.github.com` → `https://api.github.com/graphql`
/// - `https://host/api/v3` → `https://host/api/graphql`
/// - anything else → `<base>/graphql`
///
/// # Example
///
/// ```
/// use ghcommit::forge::github::graphql_url_for;
///
/// assert_eq!(
///     graphql_url_for("https://github.example.com/api/v3/"),
///     "https://github.example.com/api/graphql"
/// );
/// ```
pub fn graphql_url_for(api_base: &str) -> String {
    let base = api_base.trim_end_matches('/');
    match base.strip_suffix("/v3") {
        Some(api_root) if api_root.ends_with("/api") => format!("{}/graphql", api_root),
        _ => format!("{}/graphql", base),
    }
}

/// Map a GraphQL comparison status to "head descends from (or equals) base".
fn descends_from_status(status: &str) -> bool {
    matches!(status, "AHEAD" | "IDENTICAL")
}

const REPOSITORY_QUERY: &str = r#"query(
  $owner: String!, $name: String!,
  $parentOwner: String!, $parentName: String!,
  $targetRef: String!, $parentRef: String!,
  $hasTarget: Boolean!, $hasParent: Boolean!,
  $hasParentRepository: Boolean!, $hasUpstreamParent: Boolean!
) {
  viewer { login }
  repository(owner: $owner, name: $name) {
    defaultBranchRef {
      name
      target { ... on Commit { oid tree { oid } } }
      compare(headRef: $parentRef) @include(if: $hasParent) { status }
    }
    targetRef: ref(qualifiedName: $targetRef) @include(if: $hasTarget) {
      target { ... on Commit { oid tree { oid } } }
      compare(headRef: $parentRef) @include(if: $hasParent) { status }
    }
    parentRef: ref(qualifiedName: $parentRef) @include(if: $hasParent) {
      prefix
      name
      target { ... on Commit { oid tree { oid } } }
    }
  }
  parentRepository: repository(owner: $parentOwner, name: $parentName)
    @include(if: $hasParentRepository) {
    defaultBranchRef {
      name
      target { ... on Commit { oid tree { oid } } }
    }
    parentRef: ref(qualifiedName: $parentRef) @include(if: $hasUpstreamParent) {
      prefix
      name
      target { ... on Commit { oid tree { oid } } }
    }
  }
}"#;

const FORK_READY_QUERY: &str = r#"query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    defaultBranchRef { target { ... on Commit { oid } } }
  }
}"#;

const CHANGED_FILES_QUERY: &str = r#"query($owner: String!, $name: String!, $oid: GitObjectID!) {
  repository(owner: $owner, name: $name) {
    object(oid: $oid) { ... on Commit { changedFilesIfAvailable } }
  }
}"#;

#[async_trait]
impl GitService for GitHubService {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn query_repository(
        &self,
        query: RepositoryQuery,
    ) -> Result<RepositoryState, ForgeError> {
        // Ancestry is only compared within one repository; a parent ref read
        // from the upstream leaves `descends_from_target` unknown.
        let cross = query.crosses_repositories();
        let parent_repository = query
            .parent_repository
            .as_ref()
            .unwrap_or(&query.repository);
        let variables = json!({
            "owner": query.repository.owner(),
            "name": query.repository.name(),
            "parentOwner": parent_repository.owner(),
            "parentName": parent_repository.name(),
            "targetRef": query
                .branch
                .as_ref()
                .map(|b| b.qualified_name().to_string())
                .unwrap_or_default(),
            "parentRef": query.parent_ref.as_ref().map(|r| r.as_str()).unwrap_or_default(),
            "hasTarget": query.branch.is_some(),
            "hasParent": query.parent_ref.is_some() && !cross,
            "hasParentRepository": cross,
            "hasUpstreamParent": query.parent_ref.is_some() && cross,
        });
        tracing::debug!(repository = %query.repository, %variables, "querying repository state");

        let data: RepositoryQueryData = self.graphql(REPOSITORY_QUERY, variables).await?;
        let repo = data
            .repository
            .ok_or_else(|| ForgeError::NotFound(query.repository.to_string()))?;
        let upstream = match data.parent_repository {
            Some(upstream) if cross => Some(upstream),
            None if cross => return Err(ForgeError::NotFound(parent_repository.to_string())),
            _ => None,
        };
        // Default branch and parent ref are read from the repository the
        // parent comes from; the target branch always from `repo`.
        let source = upstream.as_ref().unwrap_or(&repo);

        let default_branch = source.default_branch_ref.as_ref().and_then(|r| {
            let name = BranchName::new(r.name.clone()?).ok()?;
            Some(DefaultBranchState {
                name,
                tip: r.tip()?,
            })
        });
        let target_branch = repo.target_ref.as_ref().and_then(GqlRef::tip);

        let comparison = match (&repo.target_ref, &repo.default_branch_ref) {
            (Some(target), _) if target.tip().is_some() => target.compare.as_ref(),
            (_, Some(default)) => default.compare.as_ref(),
            _ => None,
        };
        let parent_ref = source.parent_ref.as_ref().and_then(|r| {
            Some(ParentRefState {
                qualified_name: RefQualifiedName::new(
                    r.prefix.clone().unwrap_or_default(),
                    r.name.clone().unwrap_or_default(),
                ),
                tip: r.tip()?,
                descends_from_target: comparison.map(|c| descends_from_status(&c.status)),
            })
        });

        let state = RepositoryState {
            viewer_login: data.viewer.login,
            default_branch,
            target_branch,
            parent_ref,
        };
        tracing::debug!(?state, "resolved repository state");
        Ok(state)
    }

    async fn create_blob(&self, blob: NewBlob) -> Result<BlobSha, ForgeError> {
        tracing::debug!(
            repository = %blob.repository,
            size = blob.content.len(),
            "creating blob"
        );
        let url = self.repo_url(&blob.repository, "git/blobs");
        let body = CreateBlobBody {
            content: &blob.content,
            encoding: "base64",
        };
        let created: GitHubObject = self.send(self.client.post(&url).json(&body)).await?;
        created.blob_sha()
    }

    async fn create_tree(&self, tree: NewTree) -> Result<TreeSha, ForgeError> {
        tracing::debug!(
            repository = %tree.repository,
            base_tree = ?tree.base_tree,
            entries = tree.entries.len(),
            "creating tree"
        );
        let url = self.repo_url(&tree.repository, "git/trees");
        let body = CreateTreeBody {
            base_tree: tree.base_tree.as_ref().map(|t| t.as_str()),
            tree: tree
                .entries
                .iter()
                .map(|e| TreeEntryBody {
                    path: &e.path,
                    mode: e.mode.as_str(),
                    kind: "blob",
                    sha: e.blob.as_str(),
                })
                .collect(),
        };
        let created: GitHubObject = self.send(self.client.post(&url).json(&body)).await?;
        created.tree_sha()
    }

    async fn create_commit(&self, commit: NewCommit) -> Result<CommitSha, ForgeError> {
        tracing::debug!(
            repository = %commit.repository,
            tree = %commit.tree,
            parent = ?commit.parent,
            "creating commit"
        );
        let url = self.repo_url(&commit.repository, "git/commits");
        let body = CreateCommitBody {
            message: &commit.message,
            tree: commit.tree.as_str(),
            parents: commit.parent.iter().map(|p| p.as_str()).collect(),
            author: commit.author.as_ref(),
            committer: commit.committer.as_ref(),
        };
        let created: GitHubObject = self.send(self.client.post(&url).json(&body)).await?;
        created.commit_sha()
    }

    async fn changed_files(
        &self,
        repository: &RepositoryId,
        commit: &CommitSha,
    ) -> Result<usize, ForgeError> {
        let variables = json!({
            "owner": repository.owner(),
            "name": repository.name(),
            "oid": commit.as_str(),
        });
        let data: ChangedFilesData = self.graphql(CHANGED_FILES_QUERY, variables).await?;
        let count = data
            .repository
            .and_then(|r| r.object)
            .and_then(|o| o.changed_files_if_available);

        match count {
            Some(count) => Ok(count as usize),
            None => {
                tracing::debug!(%commit, "changed file count unavailable, asking REST");
                self.changed_files_from_rest(repository, commit).await
            }
        }
    }

    async fn create_branch(&self, branch: NewBranch) -> Result<(), ForgeError> {
        tracing::debug!(
            repository = %branch.repository,
            branch = %branch.branch,
            commit = %branch.commit,
            "creating branch"
        );
        let url = self.repo_url(&branch.repository, "git/refs");
        let body = CreateRefBody {
            ref_name: branch.branch.qualified_name().to_string(),
            sha: branch.commit.as_str(),
        };
        let created: GitHubRef = self.send(self.client.post(&url).json(&body)).await?;
        tracing::debug!(r#ref = %created.ref_name, sha = %created.object.sha, "branch created");
        Ok(())
    }

    async fn update_branch(&self, update: BranchUpdate) -> Result<(), ForgeError> {
        let BranchUpdate {
            target: branch,
            force,
        } = update;
        tracing::debug!(
            repository = %branch.repository,
            branch = %branch.branch,
            commit = %branch.commit,
            force,
            "updating branch"
        );
        let url = self.branch_ref_url(&branch.repository, &branch.branch)?;
        let body = UpdateRefBody {
            sha: branch.commit.as_str(),
            force,
        };
        let updated: GitHubRef = self.send(self.client.patch(url).json(&body)).await?;
        tracing::debug!(r#ref = %updated.ref_name, sha = %updated.object.sha, "branch updated");
        Ok(())
    }

    async fn create_fork(&self, repository: &RepositoryId) -> Result<RepositoryId, ForgeError> {
        tracing::debug!(%repository, "creating fork");
        let url = self.repo_url(repository, "forks");
        let created: GitHubRepository = self.send(self.client.post(&url).json(&json!({}))).await?;
        let fork = RepositoryId::new(created.owner.login, created.name).map_err(|e| {
            ForgeError::ApiError {
                status: 202,
                message: format!("unexpected fork in response: {}", e),
            }
        })?;
        tracing::debug!(%fork, "fork requested, waiting for git data");
        self.wait_for_fork(&fork).await?;
        Ok(fork)
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

#[derive(Serialize)]
struct CreateBlobBody<'a> {
    content: &'a str,
    encoding: &'a str,
}

#[derive(Serialize)]
struct CreateTreeBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    base_tree: Option<&'a str>,
    tree: Vec<TreeEntryBody<'a>>,
}

#[derive(Serialize)]
struct TreeEntryBody<'a> {
    path: &'a str,
    mode: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    sha: &'a str,
}

#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a CommitAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<&'a CommitAuthor>,
}

#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: &'a str,
}

#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Any created git object (`{"sha": ...}`).
#[derive(Deserialize)]
struct GitHubObject {
    sha: String,
}

impl GitHubObject {
    fn invalid(e: crate::core::types::TypeError) -> ForgeError {
        ForgeError::ApiError {
            status: 200,
            message: format!("unexpected object id in response: {}", e),
        }
    }

    fn blob_sha(self) -> Result<BlobSha, ForgeError> {
        BlobSha::new(self.sha).map_err(Self::invalid)
    }

    fn tree_sha(self) -> Result<TreeSha, ForgeError> {
        TreeSha::new(self.sha).map_err(Self::invalid)
    }

    fn commit_sha(self) -> Result<CommitSha, ForgeError> {
        CommitSha::new(self.sha).map_err(Self::invalid)
    }
}

/// Ref returned by create/update ref.
#[derive(Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    ref_name: String,
    object: GitHubObject,
}

/// Subset of the repository returned by `POST /repos/{owner}/{repo}/forks`.
#[derive(Deserialize)]
struct GitHubRepository {
    name: String,
    owner: GitHubOwner,
}

#[derive(Deserialize)]
struct GitHubOwner {
    login: String,
}

/// Subset of `GET /repos/{owner}/{repo}/commits/{sha}`.
#[derive(Deserialize)]
struct GitHubCommitDetail {
    #[serde(default)]
    files: Vec<serde_json::Value>,
}

/// GraphQL response wrapper.
#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error format.
#[derive(Deserialize)]
struct GraphQLError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

impl GraphQLError {
    fn is_comparison_error(&self) -> bool {
        self.path.iter().any(|p| p.as_str() == Some("compare"))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryQueryData {
    viewer: GqlViewer,
    repository: Option<GqlRepository>,
    #[serde(default)]
    parent_repository: Option<GqlRepository>,
}

#[derive(Deserialize)]
struct GqlViewer {
    login: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlRepository {
    default_branch_ref: Option<GqlRef>,
    #[serde(default)]
    target_ref: Option<GqlRef>,
    #[serde(default)]
    parent_ref: Option<GqlRef>,
}

#[derive(Deserialize)]
struct GqlRef {
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    name: Option<String>,
    target: Option<GqlTarget>,
    #[serde(default)]
    compare: Option<GqlComparison>,
}

impl GqlRef {
    /// Commit and tree of the ref, or `None` if it does not point at a commit.
    fn tip(&self) -> Option<RefTip> {
        let target = self.target.as_ref()?;
        Some(RefTip {
            commit: CommitSha::new(target.oid.clone()?).ok()?,
            tree: TreeSha::new(target.tree.as_ref()?.oid.clone()).ok()?,
        })
    }
}

/// Ref target; fields are absent when the target is not a commit.
#[derive(Deserialize)]
struct GqlTarget {
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    tree: Option<GqlOid>,
}

#[derive(Deserialize)]
struct GqlOid {
    oid: String,
}

#[derive(Deserialize)]
struct GqlComparison {
    status: String,
}

#[derive(Deserialize)]
struct ForkReadyData {
    repository: Option<GqlRepository>,
}

impl ForkReadyData {
    fn is_ready(&self) -> bool {
        self.repository
            .as_ref()
            .and_then(|r| r.default_branch_ref.as_ref())
            .and_then(|r| r.target.as_ref())
            .is_some_and(|t| t.oid.is_some())
    }
}

#[derive(Deserialize)]
struct ChangedFilesData {
    repository: Option<GqlCommitRepository>,
}

#[derive(Deserialize)]
struct GqlCommitRepository {
    object: Option<GqlCommitObject>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlCommitObject {
    #[serde(default)]
    changed_files_if_available: Option<u64>,
}
