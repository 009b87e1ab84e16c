//! Hosting deploy status.

use crate::integrations::poller::StatusCheck;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployState {
    Success,
    Error,
    Pending,
}

impl DeployState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Pending => "pending",
        }
    }
}

impl Display for DeployState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployStatus {
    pub state: DeployState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Provider of the current deploy state. Provider-side failures are reported
/// as [`DeployState::Error`] rather than as `Err`.
#[async_trait]
pub trait DeployStatusSource: Send + Sync + 'static {
    async fn fetch_status(&self) -> DeployStatus;
}

/// Reports a successful deploy of the configured site without calling out.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDeploySource {
    site_url: Option<String>,
}

impl SimulatedDeploySource {
    pub fn new(site_url: Option<String>) -> Self {
        Self { site_url }
    }
}

#[async_trait]
impl DeployStatusSource for SimulatedDeploySource {
    async fn fetch_status(&self) -> DeployStatus {
        DeployStatus {
            state: DeployState::Success,
            url: self.site_url.clone(),
            message: Some("simulated deploy status".to_string()),
            checked_at: Utc::now(),
        }
    }
}

/// Adapts a [`DeployStatusSource`] for [`StatusPoller`](crate::integrations::poller::StatusPoller).
pub struct DeployStatusCheck<S> {
    source: S,
}

impl<S: DeployStatusSource> DeployStatusCheck<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: DeployStatusSource> StatusCheck for DeployStatusCheck<S> {
    type Output = DeployStatus;

    fn name(&self) -> &'static str {
        "deploy"
    }

    async fn check(&self) -> Result<DeployStatus, String> {
        let status = self.source.fetch_status().await;
        match status.state {
            DeployState::Error => Err(status
                .message
                .unwrap_or_else(|| "deploy reported an error".to_string())),
            DeployState::Success | DeployState::Pending => Ok(status),
        }
    }
}
