//! Decide whether, and when, a deployment succeeded.

use api_client::ListOptions;
use chrono::{DateTime, Utc};
use octocat::models::DeploymentState;

use crate::error::Error;
use crate::model::DeploymentId;
use crate::repository::Repository;

/// Status events fetched per deployment.
pub const STATUS_PAGE_SIZE: u32 = 30;

/// The outcome of inspecting a deployment's status history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The deployment reported success at this time.
    Succeeded(DateTime<Utc>),

    /// The deployment ended without succeeding (error, failure or inactive).
    Unsuccessful,

    /// The deployment has not finished yet, and may still succeed.
    Pending,
}

impl Resolution {
    /// The success time, if the deployment succeeded.
    pub fn succeeded_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Resolution::Succeeded(at) => Some(*at),
            _ => None,
        }
    }
}

/// Reads the status history of deployments.
///
/// Histories are assumed to be monotonic: a deployment passes through at
/// most one success before it becomes inactive. A single page of statuses is
/// therefore enough, and a success found once holds forever. If a history
/// ever shows several successes, a warning is logged and the first one the
/// platform lists is used.
#[derive(Debug, Clone, Copy)]
pub struct SuccessResolver {
    per_page: u32,
}

impl Default for SuccessResolver {
    fn default() -> Self {
        Self {
            per_page: STATUS_PAGE_SIZE,
        }
    }
}

impl SuccessResolver {
    /// A resolver which reads [STATUS_PAGE_SIZE] statuses per deployment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `per_page` statuses per deployment.
    pub fn with_page_size(per_page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    /// Fetch the status history of `id` and classify it.
    #[tracing::instrument(skip(self, repository))]
    pub async fn resolve<R>(&self, repository: &R, id: DeploymentId) -> Result<Resolution, Error>
    where
        R: Repository + ?Sized,
    {
        let statuses = repository
            .list_deployment_statuses(id, ListOptions::first(self.per_page))
            .await
            .map_err(|source| Error::Statuses { id, source })?;

        if !statuses.is_last() {
            tracing::debug!(id, "Status history is longer than one page");
        }

        let mut successes = statuses
            .items
            .iter()
            .filter(|status| status.state == DeploymentState::Success);

        if let Some(first) = successes.next() {
            let others = successes.count();
            if others > 0 {
                tracing::warn!(
                    id,
                    successes = others + 1,
                    "Deployment reported success more than once, using {}",
                    first.updated_at
                );
            }
            return Ok(Resolution::Succeeded(first.updated_at));
        }

        let settled = statuses.items.first().is_some_and(|latest| {
            matches!(
                latest.state,
                DeploymentState::Error | DeploymentState::Failure | DeploymentState::Inactive
            )
        });

        Ok(if settled {
            Resolution::Unsuccessful
        } else {
            Resolution::Pending
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{status, MockRepository};

    fn at(minutes: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + minutes * 60, 0).unwrap()
    }

    #[tokio::test]
    async fn success_time_is_taken_from_status() {
        let repository = MockRepository::new();
        repository.set_statuses(
            1,
            vec![
                status(3, DeploymentState::Inactive, at(30)),
                status(2, DeploymentState::Success, at(12)),
                status(1, DeploymentState::InProgress, at(10)),
            ],
        );

        let resolution = SuccessResolver::new().resolve(&repository, 1).await.unwrap();
        assert_eq!(resolution, Resolution::Succeeded(at(12)));
        assert_eq!(resolution.succeeded_at(), Some(at(12)));
    }

    #[tokio::test]
    async fn first_listed_success_wins() {
        let repository = MockRepository::new();
        repository.set_statuses(
            1,
            vec![
                status(3, DeploymentState::Success, at(20)),
                status(2, DeploymentState::Inactive, at(15)),
                status(1, DeploymentState::Success, at(10)),
            ],
        );

        let resolution = SuccessResolver::new().resolve(&repository, 1).await.unwrap();
        assert_eq!(resolution, Resolution::Succeeded(at(20)));
    }

    #[tokio::test]
    async fn unfinished_and_failed_deployments() {
        let repository = MockRepository::new();
        repository.set_statuses(1, vec![status(1, DeploymentState::InProgress, at(1))]);
        repository.set_statuses(
            2,
            vec![
                status(3, DeploymentState::Failure, at(2)),
                status(2, DeploymentState::InProgress, at(1)),
            ],
        );

        let resolver = SuccessResolver::new();
        assert_eq!(
            resolver.resolve(&repository, 1).await.unwrap(),
            Resolution::Pending
        );
        assert_eq!(
            resolver.resolve(&repository, 2).await.unwrap(),
            Resolution::Unsuccessful
        );
        assert_eq!(
            resolver.resolve(&repository, 3).await.unwrap(),
            Resolution::Pending
        );
    }

    #[tokio::test]
    async fn history_is_capped_at_one_page() {
        let repository = MockRepository::new();
        repository.set_statuses(
            1,
            vec![
                status(3, DeploymentState::Inactive, at(30)),
                status(2, DeploymentState::Inactive, at(20)),
                status(1, DeploymentState::Success, at(10)),
            ],
        );

        let resolution = SuccessResolver::with_page_size(2)
            .resolve(&repository, 1)
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::Unsuccessful);
    }
}
