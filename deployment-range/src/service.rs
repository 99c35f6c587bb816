use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cache::DeploymentCache;
use crate::error::Error;
use crate::index::RangeIndex;
use crate::model::{Deployment, TimeWindow};
use crate::reconcile::CommitReconciler;
use crate::repository::Repository;
use crate::resolver::SuccessResolver;

/// Answers which deployments were successfully active during a window of
/// time, and what changed between each of them.
///
/// All state is held in memory for the life of the service and only grows.
/// Operations take `&mut self` and run one remote call at a time; use
/// [SharedDeploymentService] to share one service between tasks.
#[derive(Debug)]
pub struct DeploymentService<R> {
    repository: R,
    cache: DeploymentCache,
    index: RangeIndex,
    resolver: SuccessResolver,
    reconciler: CommitReconciler,
}

impl<R> DeploymentService<R>
where
    R: Repository,
{
    /// A service with empty caches, reading from `repository`.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            cache: DeploymentCache::new(),
            index: RangeIndex::new(),
            resolver: SuccessResolver::new(),
            reconciler: CommitReconciler::new(),
        }
    }

    /// Use a different success resolver.
    pub fn with_resolver(mut self, resolver: SuccessResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// The repository deployments are read from.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// The raw deployment cache.
    pub fn cache(&self) -> &DeploymentCache {
        &self.cache
    }

    /// The index of successful deployments.
    pub fn index(&self) -> &RangeIndex {
        &self.index
    }

    /// Every deployment, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_deployments(&mut self) -> Result<Vec<Deployment>, Error> {
        self.cache.ensure_loaded(&self.repository).await?;
        Ok(self.cache.iter().cloned().collect())
    }

    /// Deployments which succeeded strictly between `from` and `to`, newest
    /// first, with the commits each added and removed since the deployment
    /// before it.
    ///
    /// The oldest deployment returned is compared with the deployment that
    /// was active when the window opened, which is not itself returned.
    #[tracing::instrument(skip(self))]
    pub async fn list_deployments_in_range(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Deployment>, Error> {
        let window = TimeWindow::new(from, to);
        if window.is_empty() {
            tracing::debug!("Empty window");
            return Ok(Vec::new());
        }

        self.cache.ensure_loaded(&self.repository).await?;
        self.index
            .load_successful_in_range(&self.repository, &self.cache, &self.resolver, &window)
            .await?;

        let mut deployments = self.index.query_in_range(&self.cache, &window);
        if deployments.is_empty() {
            return Ok(deployments);
        }

        let predecessor = self.index.predecessor(&self.cache, window.from);
        let seeded = predecessor.is_some();
        if !seeded {
            tracing::debug!("No deployment succeeded before the window");
        }
        deployments.extend(predecessor);

        self.reconciler
            .reconcile(&self.repository, &mut deployments)
            .await?;

        if seeded {
            deployments.pop();
        }

        tracing::debug!(count = deployments.len(), "Deployments in range");
        Ok(deployments)
    }
}

/// A [DeploymentService] behind a single lock, so that it can be cloned and
/// shared between tasks. Calls run one at a time.
#[derive(Debug)]
pub struct SharedDeploymentService<R> {
    inner: Arc<tokio::sync::Mutex<DeploymentService<R>>>,
}

impl<R> Clone for SharedDeploymentService<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> From<DeploymentService<R>> for SharedDeploymentService<R> {
    fn from(service: DeploymentService<R>) -> Self {
        Self {
            inner: Arc::new(tokio::sync::Mutex::new(service)),
        }
    }
}

impl<R> SharedDeploymentService<R>
where
    R: Repository,
{
    /// Share a service reading from `repository`.
    pub fn new(repository: R) -> Self {
        DeploymentService::new(repository).into()
    }

    /// See [DeploymentService::list_deployments].
    pub async fn list_deployments(&self) -> Result<Vec<Deployment>, Error> {
        self.inner.lock().await.list_deployments().await
    }

    /// See [DeploymentService::list_deployments_in_range].
    pub async fn list_deployments_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Deployment>, Error> {
        self.inner
            .lock()
            .await
            .list_deployments_in_range(from, to)
            .await
    }
}

#[cfg(test)]
mod tests {
    use octocat::models::{ComparisonStatus, DeploymentState};

    use super::*;
    use crate::mock::{comparison, deployment, status, Call, MockRepository};

    static_assertions::assert_impl_all!(SharedDeploymentService<MockRepository>: Clone, Send, Sync);

    fn at(minutes: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + minutes * 60, 0).unwrap()
    }

    #[tokio::test]
    async fn inverted_window_makes_no_calls() {
        let repository = Arc::new(MockRepository::new());
        let mut service = DeploymentService::new(Arc::clone(&repository));

        assert!(service
            .list_deployments_in_range(at(10), at(10))
            .await
            .unwrap()
            .is_empty());
        assert!(service
            .list_deployments_in_range(at(20), at(10))
            .await
            .unwrap()
            .is_empty());
        assert!(repository.calls().is_empty());
    }

    #[tokio::test]
    async fn first_deployment_has_no_predecessor() {
        let repository = Arc::new(MockRepository::new());
        repository.deploy(deployment(1, "a", at(0), at(1)));
        repository.set_statuses(1, vec![status(1, DeploymentState::Success, at(1))]);

        let mut service = DeploymentService::new(Arc::clone(&repository));
        let deployments = service
            .list_deployments_in_range(at(0), at(10))
            .await
            .unwrap();

        assert_eq!(deployments.len(), 1);
        assert_eq!(deployments[0].id, 1);
        assert_eq!(deployments[0].succeeded_at, Some(at(1)));
        assert!(deployments[0].added.is_empty());
        assert!(!repository
            .calls()
            .iter()
            .any(|call| matches!(call, Call::Compare { .. })));
    }

    #[tokio::test]
    async fn shared_service_serializes_calls() {
        let repository = MockRepository::new();
        repository.deploy(deployment(1, "a", at(0), at(10)));
        repository.deploy(deployment(2, "b", at(9), at(10)));
        repository.set_statuses(
            1,
            vec![
                status(2, DeploymentState::Inactive, at(10)),
                status(1, DeploymentState::Success, at(1)),
            ],
        );
        repository.set_statuses(2, vec![status(3, DeploymentState::Success, at(10))]);
        repository.set_comparison(
            "a",
            "b",
            comparison(ComparisonStatus::Ahead, "a", "b", "a", &[("b", "change")]),
        );

        let service = SharedDeploymentService::new(repository);
        let other = service.clone();
        let (left, right) = tokio::join!(
            service.list_deployments_in_range(at(5), at(15)),
            other.list_deployments_in_range(at(5), at(15)),
        );

        let left = left.unwrap();
        assert_eq!(left, right.unwrap());
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].added[0].title, "change");
        assert_eq!(service.list_deployments().await.unwrap().len(), 2);
    }
}
