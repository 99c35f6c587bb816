//! The remote operations the engine consumes.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use api_client::{ListOptions, Page};
use octocat::models::{CommitComparison, DeploymentStatus, DeploymentsQuery};
use octocat::GithubClient;
use parking_lot::Mutex;

use crate::error::BoxError;
use crate::model::DeploymentId;

/// A deployment as the platform lists it.
pub use octocat::models::Deployment as RawDeployment;

/// Read access to the deployments of one repository and environment.
#[async_trait::async_trait]
pub trait Repository: fmt::Debug + Send + Sync {
    /// One page of deployments, newest first.
    async fn list_deployments(&self, options: ListOptions)
        -> Result<Page<RawDeployment>, BoxError>;

    /// One page of status events for a deployment, newest first.
    async fn list_deployment_statuses(
        &self,
        id: DeploymentId,
        options: ListOptions,
    ) -> Result<Page<DeploymentStatus>, BoxError>;

    /// Compare two commits, `base...head`.
    async fn compare_commits(&self, base: &str, head: &str)
        -> Result<CommitComparison, BoxError>;
}

#[async_trait::async_trait]
impl<R> Repository for Arc<R>
where
    R: ?Sized + Repository + 'static,
{
    async fn list_deployments(
        &self,
        options: ListOptions,
    ) -> Result<Page<RawDeployment>, BoxError> {
        self.deref().list_deployments(options).await
    }

    async fn list_deployment_statuses(
        &self,
        id: DeploymentId,
        options: ListOptions,
    ) -> Result<Page<DeploymentStatus>, BoxError> {
        self.deref().list_deployment_statuses(id, options).await
    }

    async fn compare_commits(
        &self,
        base: &str,
        head: &str,
    ) -> Result<CommitComparison, BoxError> {
        self.deref().compare_commits(base, head).await
    }
}

/// A [Repository] backed by the Github REST API.
///
/// Commit comparisons are kept for the lifetime of the repository, since the
/// comparison of two fixed SHAs never changes.
#[derive(Debug)]
pub struct GithubRepository {
    client: GithubClient,
    owner: String,
    name: String,
    environment: Option<String>,
    comparisons: Mutex<HashMap<(String, String), CommitComparison>>,
}

impl GithubRepository {
    /// Deployments to every environment of `owner/name`.
    pub fn new(client: GithubClient, owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            client,
            owner: owner.into(),
            name: name.into(),
            environment: None,
            comparisons: Mutex::new(HashMap::new()),
        }
    }

    /// Only consider deployments to `environment`.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// The repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The repository name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The environment filter, if any.
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }
}

#[async_trait::async_trait]
impl Repository for GithubRepository {
    async fn list_deployments(
        &self,
        options: ListOptions,
    ) -> Result<Page<RawDeployment>, BoxError> {
        let query = DeploymentsQuery::new(self.environment.clone(), options);
        let page = self
            .client
            .list_deployments(&self.owner, &self.name, &query)
            .await?;
        Ok(page)
    }

    async fn list_deployment_statuses(
        &self,
        id: DeploymentId,
        options: ListOptions,
    ) -> Result<Page<DeploymentStatus>, BoxError> {
        let page = self
            .client
            .list_deployment_statuses(&self.owner, &self.name, id, &options)
            .await?;
        Ok(page)
    }

    async fn compare_commits(
        &self,
        base: &str,
        head: &str,
    ) -> Result<CommitComparison, BoxError> {
        let key = (base.to_owned(), head.to_owned());
        let cached = self.comparisons.lock().get(&key).cloned();
        if let Some(comparison) = cached {
            tracing::trace!(%base, %head, "Using cached comparison");
            return Ok(comparison);
        }

        let comparison = self
            .client
            .compare_commits(&self.owner, &self.name, base, head)
            .await?;

        self.comparisons.lock().insert(key, comparison.clone());
        Ok(comparison)
    }
}
