//! Deployments and commits as the engine reports them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The platform's numeric deployment ID.
pub type DeploymentId = octocat::models::DeploymentId;

/// A deployment, with the commits it added and removed once reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment ID, assigned by the platform.
    pub id: DeploymentId,

    /// API URL of the deployment.
    pub url: String,

    /// The deployed commit.
    pub sha: String,

    /// When the deployment was created.
    pub created_at: DateTime<Utc>,

    /// When the deployment last changed state.
    pub updated_at: DateTime<Utc>,

    /// When the deployment reported success. Never changes once set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succeeded_at: Option<DateTime<Utc>>,

    /// Link to the comparison with the previous deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_url: Option<String>,

    /// Commits added since the previous deployment.
    #[serde(default)]
    pub added: Vec<Commit>,

    /// Commits removed since the previous deployment.
    #[serde(default)]
    pub removed: Vec<Commit>,
}

impl From<&octocat::models::Deployment> for Deployment {
    fn from(raw: &octocat::models::Deployment) -> Self {
        Self {
            id: raw.id,
            url: raw.url.clone(),
            sha: raw.sha.clone(),
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            succeeded_at: None,
            comparison_url: None,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

/// A commit in a deployment diff.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commit {
    /// Commit SHA.
    pub sha: String,

    /// First line of the commit message.
    pub title: String,

    /// Link to the commit.
    pub url: String,
}

impl From<&octocat::models::Commit> for Commit {
    fn from(commit: &octocat::models::Commit) -> Self {
        Self {
            sha: commit.sha.clone(),
            title: commit_title(commit.message()).to_owned(),
            url: commit.html_url.clone(),
        }
    }
}

/// The title of a commit message: everything before the first newline.
pub fn commit_title(message: &str) -> &str {
    message
        .split_once('\n')
        .map_or(message, |(title, _)| title)
}

/// An open interval of time, `from < t < to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    /// Start of the window, exclusive.
    pub from: DateTime<Utc>,

    /// End of the window, exclusive.
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    /// A window between two instants.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Is `at` strictly inside the window?
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from < at && at < self.to
    }

    /// Does the window contain no instants at all?
    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    /// Could a deployment have been active during this window?
    ///
    /// Over-approximates: every deployment which succeeded inside the window,
    /// and the one active at its start, pass this check.
    pub fn is_candidate(&self, deployment: &Deployment) -> bool {
        deployment.updated_at > self.from && deployment.created_at < self.to
    }
}
