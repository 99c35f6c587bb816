//! Deployment and deployment status models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Github's numeric deployment ID.
pub type DeploymentId = u64;

/// A deployment of a commit to an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment ID, assigned by Github.
    pub id: DeploymentId,

    /// API URL for this deployment.
    #[serde(default)]
    pub url: String,

    /// The deployed commit.
    pub sha: String,

    /// The ref (branch, tag or SHA) which was requested for deployment.
    #[serde(rename = "ref", default)]
    pub git_ref: String,

    /// Name of the target environment.
    #[serde(default)]
    pub environment: String,

    /// When the deployment was created.
    pub created_at: DateTime<Utc>,

    /// When the deployment was last updated, which moves forward with every
    /// new status.
    pub updated_at: DateTime<Utc>,
}

/// The state carried by a deployment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    /// The deployment failed with an error.
    Error,
    /// The deployment failed.
    Failure,
    /// The deployment was superseded by a newer one.
    Inactive,
    /// The deployment is running.
    InProgress,
    /// The deployment is waiting to start.
    Queued,
    /// The deployment was created but has not started.
    Pending,
    /// The deployment finished successfully.
    Success,
    /// A state this client doesn't know about.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentState::Error => "error",
            DeploymentState::Failure => "failure",
            DeploymentState::Inactive => "inactive",
            DeploymentState::InProgress => "in_progress",
            DeploymentState::Queued => "queued",
            DeploymentState::Pending => "pending",
            DeploymentState::Success => "success",
            DeploymentState::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A single status event on a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    /// Status ID.
    pub id: u64,

    /// State reported by this status.
    pub state: DeploymentState,

    /// When the status was created.
    pub created_at: DateTime<Utc>,

    /// When the status was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentsQuery {
    /// Only list deployments to this environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Page number, starting at 1.
    pub page: u32,

    /// Deployments per page, at most 100.
    pub per_page: u32,
}

impl DeploymentsQuery {
    /// Query a page of deployments, optionally for one environment.
    pub fn new(environment: Option<String>, options: api_client::ListOptions) -> Self {
        Self {
            environment,
            page: options.page,
            per_page: options.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_deployment() {
        let deployment: Deployment = serde_json::from_value(serde_json::json!({
            "url": "https://api.github.com/repos/octocat/example/deployments/1",
            "id": 1,
            "node_id": "MDEwOkRlcGxveW1lbnQx",
            "sha": "a84d88e7554fc1fa21bcbc4efae3c782a70d2b9d",
            "ref": "topic-branch",
            "task": "deploy",
            "environment": "production",
            "created_at": "2012-07-20T01:19:13Z",
            "updated_at": "2012-07-20T01:19:13Z"
        }))
        .unwrap();

        assert_eq!(deployment.id, 1);
        assert_eq!(deployment.git_ref, "topic-branch");
        assert_eq!(deployment.environment, "production");
        assert_eq!(deployment.created_at.timestamp(), 1342747153);
    }

    #[test]
    fn unknown_states_do_not_fail() {
        let status: DeploymentStatus = serde_json::from_value(serde_json::json!({
            "id": 7,
            "state": "rolled_back",
            "created_at": "2012-07-20T01:19:13Z",
            "updated_at": "2012-07-20T01:19:13Z"
        }))
        .unwrap();
        assert_eq!(status.state, DeploymentState::Unknown);

        let state: DeploymentState = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(state, DeploymentState::InProgress);
        assert_eq!(state.to_string(), "in_progress");
    }

    #[test]
    fn environment_is_optional_in_query() {
        let query = DeploymentsQuery::new(None, api_client::ListOptions::first(100));
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            serde_json::json!({"page": 1, "per_page": 100})
        );
    }
}
