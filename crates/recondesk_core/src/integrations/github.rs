//! GitHub REST v3 client for single-file commits.
//!
//! # Responsibility
//! - List repository contents on the configured branch.
//! - Commit one file through the git data API:
//!   branch -> blob -> tree -> commit -> ref update.
//!
//! # Invariants
//! - The ref update is never forced; GitHub rejects non-fast-forward moves.
//! - A failed step aborts the chain. Objects created by earlier steps are
//!   left in GitHub's object store.

use crate::integrations::upstream_message;
use crate::model::settings::GitHubCredentials;
use log::{error, info};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "recondesk";
const ACCEPT: &str = "application/vnd.github+json";
const FILE_MODE: &str = "100644";

#[derive(Debug)]
pub enum GitHubError {
    /// Transport or body decoding failure.
    Http(reqwest::Error),
    /// Non-2xx response; `message` is GitHub's own text.
    Api {
        step: &'static str,
        status: u16,
        message: String,
    },
}

impl Display for GitHubError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "GitHub request failed: {err}"),
            Self::Api { message, .. } => write!(f, "{message}"),
        }
    }
}

impl Error for GitHubError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Api { .. } => None,
        }
    }
}

impl From<reqwest::Error> for GitHubError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

pub type GitHubResult<T> = Result<T, GitHubError>;

/// `Debug` goes through [`GitHubCredentials`], which redacts the token.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_base: String,
    pub credentials: GitHubCredentials,
}

impl GitHubConfig {
    pub fn new(credentials: GitHubCredentials) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            credentials,
        }
    }

    /// Points the client at another host (GitHub Enterprise, test servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

/// One entry of a contents listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHead {
    pub commit_sha: String,
    pub tree_sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub blob_sha: String,
    pub tree_sha: String,
    pub commit_sha: String,
}

#[derive(Deserialize)]
struct ShaResponse {
    sha: String,
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: BranchCommit,
}

#[derive(Deserialize)]
struct BranchCommit {
    sha: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    tree: ShaResponse,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentEntry>),
    File(ContentEntry),
}

pub struct GitHubClient {
    http: Client,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> GitHubResult<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// Lists a directory (or a single file) at `path` on the configured branch.
    /// An empty path lists the repository root.
    pub async fn list_contents(&self, path: &str) -> GitHubResult<Vec<ContentEntry>> {
        let path = path.trim_matches('/');
        let url = self.repo_url(&format!("contents/{path}"));
        let request = self
            .http
            .get(url)
            .query(&[("ref", self.config.credentials.branch.as_str())]);
        let response: ContentsResponse = self.send("list_contents", request).await?;
        Ok(match response {
            ContentsResponse::Listing(entries) => entries,
            ContentsResponse::File(entry) => vec![entry],
        })
    }

    pub async fn get_branch(&self) -> GitHubResult<BranchHead> {
        let url = self.repo_url(&format!("branches/{}", self.config.credentials.branch));
        let response: BranchResponse = self.send("get_branch", self.http.get(url)).await?;
        Ok(BranchHead {
            commit_sha: response.commit.sha,
            tree_sha: response.commit.commit.tree.sha,
        })
    }

    pub async fn create_blob(&self, content: &str) -> GitHubResult<String> {
        let body = json!({ "content": content, "encoding": "utf-8" });
        let request = self.http.post(self.repo_url("git/blobs")).json(&body);
        let response: ShaResponse = self.send("create_blob", request).await?;
        Ok(response.sha)
    }

    pub async fn create_tree(
        &self,
        base_tree: &str,
        path: &str,
        blob_sha: &str,
    ) -> GitHubResult<String> {
        let body = json!({
            "base_tree": base_tree,
            "tree": [{
                "path": path.trim_start_matches('/'),
                "mode": FILE_MODE,
                "type": "blob",
                "sha": blob_sha,
            }],
        });
        let request = self.http.post(self.repo_url("git/trees")).json(&body);
        let response: ShaResponse = self.send("create_tree", request).await?;
        Ok(response.sha)
    }

    pub async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
    ) -> GitHubResult<String> {
        let body = json!({
            "message": message,
            "tree": tree_sha,
            "parents": [parent_sha],
        });
        let request = self.http.post(self.repo_url("git/commits")).json(&body);
        let response: ShaResponse = self.send("create_commit", request).await?;
        Ok(response.sha)
    }

    pub async fn update_ref(&self, commit_sha: &str) -> GitHubResult<()> {
        let url = self.repo_url(&format!(
            "git/refs/heads/{}",
            self.config.credentials.branch
        ));
        let body = json!({ "sha": commit_sha, "force": false });
        let _: serde_json::Value = self
            .send("update_ref", self.http.patch(url).json(&body))
            .await?;
        Ok(())
    }

    /// Writes `content` to `path` as a new commit on the configured branch.
    pub async fn commit_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> GitHubResult<CommitOutcome> {
        let head = self.get_branch().await?;
        let blob_sha = self.create_blob(content).await?;
        let tree_sha = self.create_tree(&head.tree_sha, path, &blob_sha).await?;
        let commit_sha = self
            .create_commit(message, &tree_sha, &head.commit_sha)
            .await?;
        self.update_ref(&commit_sha).await?;

        info!(
            "event=github_commit module=github status=ok repo={}/{} branch={} commit={}",
            self.config.credentials.owner,
            self.config.credentials.repo,
            self.config.credentials.branch,
            commit_sha
        );
        Ok(CommitOutcome {
            blob_sha,
            tree_sha,
            commit_sha,
        })
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.config.api_base,
            self.config.credentials.owner,
            self.config.credentials.repo,
            suffix.trim_end_matches('/')
        )
    }

    async fn send<T: DeserializeOwned>(
        &self,
        step: &'static str,
        request: RequestBuilder,
    ) -> GitHubResult<T> {
        let response = request
            .bearer_auth(&self.config.credentials.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = upstream_message(status.as_u16(), &body);
            error!(
                "event=github_call module=github status=error step={} http_status={}",
                step,
                status.as_u16()
            );
            return Err(GitHubError::Api {
                step,
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}
