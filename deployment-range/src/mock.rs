//! An in-memory [Repository] for tests and demonstrations.

use std::collections::HashMap;

use api_client::{ListOptions, Page, RateLimit};
use chrono::{DateTime, Utc};
use octocat::models::{
    Commit, CommitComparison, ComparisonStatus, DeploymentState, DeploymentStatus,
};
use parking_lot::Mutex;

use crate::error::BoxError;
use crate::model::DeploymentId;
use crate::repository::{RawDeployment, Repository};

/// A call made against a [MockRepository].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    /// A page of deployments was listed.
    ListDeployments {
        /// The page requested.
        page: u32,
    },

    /// The statuses of a deployment were listed.
    ListStatuses {
        /// The deployment.
        id: DeploymentId,
    },

    /// Two commits were compared.
    Compare {
        /// Base SHA.
        base: String,
        /// Head SHA.
        head: String,
    },
}

#[derive(Debug, Default)]
struct State {
    // Newest first, as the platform lists them.
    deployments: Vec<RawDeployment>,
    statuses: HashMap<DeploymentId, Vec<DeploymentStatus>>,
    comparisons: HashMap<(String, String), CommitComparison>,
    rates: HashMap<u32, RateLimit>,
    calls: Vec<Call>,
}

/// A repository held in memory, which records every call made against it.
///
/// Deployment pages are `page_size` long when one is set, and otherwise use
/// the page size requested. Pages report a healthy rate limit unless one has
/// been set for that page with [MockRepository::set_rate].
#[derive(Debug, Default)]
pub struct MockRepository {
    page_size: Option<u32>,
    state: Mutex<State>,
}

impl MockRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve deployments `page_size` at a time, whatever page size is requested.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    /// Record a new deployment, newer than any seen so far.
    pub fn deploy(&self, deployment: RawDeployment) {
        self.state.lock().deployments.insert(0, deployment);
    }

    /// Set a listed deployment's `updated_at`, as the platform does when a
    /// newer deployment supersedes it.
    pub fn touch(&self, id: DeploymentId, updated_at: DateTime<Utc>) {
        let mut state = self.state.lock();
        if let Some(deployment) = state.deployments.iter_mut().find(|d| d.id == id) {
            deployment.updated_at = updated_at;
        }
    }

    /// Remove a deployment from the listing.
    pub fn remove(&self, id: DeploymentId) {
        self.state.lock().deployments.retain(|d| d.id != id);
    }

    /// Set the status history of a deployment, newest first.
    pub fn set_statuses(&self, id: DeploymentId, statuses: Vec<DeploymentStatus>) {
        self.state.lock().statuses.insert(id, statuses);
    }

    /// Answer comparisons of `base...head`.
    pub fn set_comparison(&self, base: &str, head: &str, comparison: CommitComparison) {
        self.state
            .lock()
            .comparisons
            .insert((base.to_owned(), head.to_owned()), comparison);
    }

    /// Report `rate` with a page of deployments.
    pub fn set_rate(&self, page: u32, rate: RateLimit) {
        self.state.lock().rates.insert(page, rate);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Forget the calls made so far.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// The number of status listings made so far.
    pub fn status_calls(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::ListStatuses { .. }))
            .count()
    }
}

#[async_trait::async_trait]
impl Repository for MockRepository {
    async fn list_deployments(
        &self,
        options: ListOptions,
    ) -> Result<Page<RawDeployment>, BoxError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListDeployments { page: options.page });

        let per_page = self.page_size.unwrap_or(options.per_page).max(1) as usize;
        let start = (options.page.max(1) as usize - 1) * per_page;
        let items: Vec<_> = state
            .deployments
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect();
        let next = (start + per_page < state.deployments.len()).then_some(options.page + 1);
        let rate = state
            .rates
            .get(&options.page)
            .copied()
            .unwrap_or(RateLimit {
                limit: Some(5000),
                remaining: 5000,
                reset: DateTime::<Utc>::default(),
            });

        Ok(Page::new(items).with_next(next).with_rate(rate))
    }

    async fn list_deployment_statuses(
        &self,
        id: DeploymentId,
        options: ListOptions,
    ) -> Result<Page<DeploymentStatus>, BoxError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListStatuses { id });

        let statuses = state.statuses.get(&id).cloned().unwrap_or_default();
        let per_page = options.per_page.max(1) as usize;
        let next = (statuses.len() > per_page).then_some(2);
        Ok(Page::new(statuses.into_iter().take(per_page).collect()).with_next(next))
    }

    async fn compare_commits(
        &self,
        base: &str,
        head: &str,
    ) -> Result<CommitComparison, BoxError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Compare {
            base: base.to_owned(),
            head: head.to_owned(),
        });

        state
            .comparisons
            .get(&(base.to_owned(), head.to_owned()))
            .cloned()
            .ok_or_else(|| format!("no comparison for {base}...{head}").into())
    }
}

/// A deployment of `sha`.
pub fn deployment(
    id: DeploymentId,
    sha: &str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> RawDeployment {
    RawDeployment {
        id,
        url: format!("https://api.github.com/repos/octo/app/deployments/{id}"),
        sha: sha.to_owned(),
        git_ref: sha.to_owned(),
        environment: "production".to_owned(),
        created_at,
        updated_at,
    }
}

/// A status event.
pub fn status(id: u64, state: DeploymentState, at: DateTime<Utc>) -> DeploymentStatus {
    DeploymentStatus {
        id,
        state,
        created_at: at,
        updated_at: at,
    }
}

/// A comparison reporting `status`, listing `commits` as `(sha, message)` pairs.
pub fn comparison(
    status: ComparisonStatus,
    base: &str,
    head: &str,
    merge_base: &str,
    commits: &[(&str, &str)],
) -> CommitComparison {
    let commits: Vec<Commit> = commits
        .iter()
        .map(|(sha, message)| {
            Commit::new(
                *sha,
                *message,
                format!("https://github.com/octo/app/commit/{sha}"),
            )
        })
        .collect();

    CommitComparison {
        status,
        html_url: format!("https://github.com/octo/app/compare/{base}...{head}"),
        merge_base_commit: Commit::new(merge_base, "merge base", ""),
        ahead_by: commits.len() as u32,
        behind_by: 0,
        total_commits: commits.len() as u32,
        commits,
    }
}
