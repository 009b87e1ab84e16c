//! Per-dealership settings document.
//!
//! GitHub credentials live here and are never sent anywhere except GitHub.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_site_url: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubCredentials {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: String,
}

impl Debug for GitHubCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubCredentials")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::GitHubCredentials;

    #[test]
    fn debug_output_redacts_token() {
        let credentials = GitHubCredentials {
            owner: "metro-motors".to_string(),
            repo: "recon-site".to_string(),
            branch: "main".to_string(),
            token: "ghp_secret".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("recon-site"));
    }
}
