//! Fill in the commits added and removed between consecutive deployments.

use octocat::models::{CommitComparison, ComparisonStatus};

use crate::error::Error;
use crate::model::{Commit, Deployment};
use crate::repository::Repository;

/// Compares each deployment with the one before it.
///
/// For a newer deployment at `head` and the older one at `base`:
///
/// * ahead: the compared commits were added.
/// * behind: `head...base` is compared as well, and its commits were removed.
/// * diverged: the compared commits were added, and the commits between the
///   merge base and `base` were removed.
/// * identical: nothing changed.
///
/// Any other status is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommitReconciler;

impl CommitReconciler {
    /// A reconciler.
    pub fn new() -> Self {
        Self
    }

    /// Reconcile every adjacent pair of `deployments`, which are newest first.
    ///
    /// The oldest deployment is only used as a base and is left unchanged.
    #[tracing::instrument(skip_all, fields(deployments = deployments.len()))]
    pub async fn reconcile<R>(
        &self,
        repository: &R,
        deployments: &mut [Deployment],
    ) -> Result<(), Error>
    where
        R: Repository + ?Sized,
    {
        for newer in 0..deployments.len().saturating_sub(1) {
            let (head, rest) = deployments.split_at_mut(newer + 1);
            self.reconcile_pair(repository, &mut head[newer], &rest[0])
                .await?;
        }
        Ok(())
    }

    async fn reconcile_pair<R>(
        &self,
        repository: &R,
        newer: &mut Deployment,
        older: &Deployment,
    ) -> Result<(), Error>
    where
        R: Repository + ?Sized,
    {
        let base = older.sha.as_str();
        let head = newer.sha.as_str();
        let comparison = compare(repository, base, head).await?;

        match &comparison.status {
            ComparisonStatus::Ahead => {
                newer.added = commits(&comparison);
            }
            ComparisonStatus::Behind => {
                let behind = compare(repository, head, base).await?;
                newer.removed = commits(&behind);
            }
            ComparisonStatus::Diverged => {
                newer.added = commits(&comparison);
                let merge_base = comparison.merge_base_commit.sha.as_str();
                let removed = compare(repository, merge_base, base).await?;
                newer.removed = commits(&removed);
            }
            ComparisonStatus::Identical => {
                return Ok(());
            }
            ComparisonStatus::Unknown(status) => {
                return Err(Error::UnexpectedComparison {
                    status: status.clone(),
                    base: base.to_owned(),
                    head: head.to_owned(),
                });
            }
        }

        if !comparison.html_url.is_empty() {
            newer.comparison_url = Some(comparison.html_url.clone());
        }

        tracing::trace!(
            id = newer.id,
            status = %comparison.status,
            added = newer.added.len(),
            removed = newer.removed.len(),
            "Reconciled deployment"
        );
        Ok(())
    }
}

async fn compare<R>(repository: &R, base: &str, head: &str) -> Result<CommitComparison, Error>
where
    R: Repository + ?Sized,
{
    repository
        .compare_commits(base, head)
        .await
        .map_err(|source| Error::Compare {
            base: base.to_owned(),
            head: head.to_owned(),
            source,
        })
}

fn commits(comparison: &CommitComparison) -> Vec<Commit> {
    comparison.commits.iter().map(Commit::from).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::mock::{comparison, Call, MockRepository};

    fn at(minutes: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + minutes * 60, 0).unwrap()
    }

    fn deployed(id: u64, sha: &str) -> Deployment {
        let raw = crate::mock::deployment(id, sha, at(id as i64), at(id as i64));
        Deployment::from(&raw)
    }

    fn titles(commits: &[Commit]) -> Vec<&str> {
        commits.iter().map(|c| c.title.as_str()).collect()
    }

    #[tokio::test]
    async fn ahead_adds_commits() {
        let repository = MockRepository::new();
        repository.set_comparison(
            "a",
            "b",
            comparison(
                ComparisonStatus::Ahead,
                "a",
                "b",
                "a",
                &[("b1", "first\nbody"), ("b", "second")],
            ),
        );

        let mut deployments = vec![deployed(2, "b"), deployed(1, "a")];
        CommitReconciler::new()
            .reconcile(&repository, &mut deployments)
            .await
            .unwrap();

        assert_eq!(titles(&deployments[0].added), vec!["first", "second"]);
        assert!(deployments[0].removed.is_empty());
        assert_eq!(
            deployments[0].comparison_url.as_deref(),
            Some("https://github.com/octo/app/compare/a...b")
        );
        assert_eq!(deployments[1], deployed(1, "a"));
    }

    #[tokio::test]
    async fn behind_removes_commits_from_reverse_comparison() {
        let repository = MockRepository::new();
        repository.set_comparison("b", "a", comparison(ComparisonStatus::Behind, "b", "a", "a", &[]));
        repository.set_comparison(
            "a",
            "b",
            comparison(ComparisonStatus::Ahead, "a", "b", "b", &[("b", "reverted")]),
        );

        let mut deployments = vec![deployed(2, "a"), deployed(1, "b")];
        CommitReconciler::new()
            .reconcile(&repository, &mut deployments)
            .await
            .unwrap();

        assert!(deployments[0].added.is_empty());
        assert_eq!(titles(&deployments[0].removed), vec!["reverted"]);
        assert_eq!(
            deployments[0].comparison_url.as_deref(),
            Some("https://github.com/octo/app/compare/b...a")
        );
        assert_eq!(
            repository.calls(),
            vec![
                Call::Compare {
                    base: "b".into(),
                    head: "a".into()
                },
                Call::Compare {
                    base: "a".into(),
                    head: "b".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn diverged_compares_merge_base() {
        let repository = MockRepository::new();
        repository.set_comparison(
            "a",
            "b",
            comparison(ComparisonStatus::Diverged, "a", "b", "m", &[("b", "feature")]),
        );
        repository.set_comparison(
            "m",
            "a",
            comparison(ComparisonStatus::Ahead, "m", "a", "m", &[("a", "hotfix")]),
        );

        let mut deployments = vec![deployed(2, "b"), deployed(1, "a")];
        CommitReconciler::new()
            .reconcile(&repository, &mut deployments)
            .await
            .unwrap();

        assert_eq!(titles(&deployments[0].added), vec!["feature"]);
        assert_eq!(titles(&deployments[0].removed), vec!["hotfix"]);
        assert!(repository.calls().contains(&Call::Compare {
            base: "m".into(),
            head: "a".into()
        }));
    }

    #[tokio::test]
    async fn identical_changes_nothing() {
        let repository = MockRepository::new();
        repository.set_comparison(
            "a",
            "a",
            comparison(ComparisonStatus::Identical, "a", "a", "a", &[]),
        );

        let mut deployments = vec![deployed(2, "a"), deployed(1, "a")];
        CommitReconciler::new()
            .reconcile(&repository, &mut deployments)
            .await
            .unwrap();

        assert!(deployments[0].added.is_empty());
        assert!(deployments[0].removed.is_empty());
        assert_eq!(deployments[0].comparison_url, None);
    }

    #[tokio::test]
    async fn unknown_status_is_an_error() {
        let repository = MockRepository::new();
        repository.set_comparison(
            "a",
            "b",
            comparison(
                ComparisonStatus::Unknown("sideways".into()),
                "a",
                "b",
                "a",
                &[],
            ),
        );

        let mut deployments = vec![deployed(2, "b"), deployed(1, "a")];
        let error = CommitReconciler::new()
            .reconcile(&repository, &mut deployments)
            .await
            .unwrap_err();

        match error {
            Error::UnexpectedComparison { status, base, head } => {
                assert_eq!(status, "sideways");
                assert_eq!(base, "a");
                assert_eq!(head, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn fewer_than_two_deployments_pass_through() {
        let repository = MockRepository::new();
        let reconciler = CommitReconciler::new();

        let mut empty: Vec<Deployment> = Vec::new();
        reconciler.reconcile(&repository, &mut empty).await.unwrap();

        let mut single = vec![deployed(1, "a")];
        reconciler.reconcile(&repository, &mut single).await.unwrap();
        assert_eq!(single, vec![deployed(1, "a")]);
        assert!(repository.calls().is_empty());
    }

    #[tokio::test]
    async fn compare_errors_name_the_pair() {
        let repository = MockRepository::new();
        let mut deployments = vec![deployed(2, "b"), deployed(1, "a")];

        let error = CommitReconciler::new()
            .reconcile(&repository, &mut deployments)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::Compare { ref base, ref head, .. } if base == "a" && head == "b"
        ));
    }
}
