use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::DeploymentId;

/// Errors returned by a [crate::Repository].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from the deployment range engine.
///
/// No operation retries. Every error aborts the operation which produced it,
/// leaving the caches as they were before the operation started.
#[derive(Debug, Error)]
pub enum Error {
    /// Fetching a page of deployments failed.
    #[error("listing deployments (page {page})")]
    ListDeployments {
        /// The page being fetched.
        page: u32,

        /// The repository error.
        #[source]
        source: BoxError,
    },

    /// The remaining request quota fell to the floor while paging.
    #[error("rate limit nearly exhausted ({remaining} requests remaining), resets at {reset}")]
    RateLimited {
        /// Requests remaining when the listing stopped.
        remaining: u32,

        /// When the quota resets.
        reset: DateTime<Utc>,
    },

    /// The newest cached deployment was not found while refreshing.
    ///
    /// Deployments are expected to be append-only, so this means the remote
    /// listing no longer agrees with the cache.
    #[error("cached deployment {0} is missing from the remote listing")]
    MissingSentinel(DeploymentId),

    /// Fetching the statuses of a deployment failed.
    #[error("listing statuses for deployment {id}")]
    Statuses {
        /// The deployment whose statuses were requested.
        id: DeploymentId,

        /// The repository error.
        #[source]
        source: BoxError,
    },

    /// Comparing two commits failed.
    #[error("comparing {base}...{head}")]
    Compare {
        /// Base commit SHA.
        base: String,

        /// Head commit SHA.
        head: String,

        /// The repository error.
        #[source]
        source: BoxError,
    },

    /// A comparison reported a status other than ahead, behind, diverged or identical.
    #[error("unexpected comparison status {status:?} for {base}...{head}")]
    UnexpectedComparison {
        /// The status reported.
        status: String,

        /// Base commit SHA.
        base: String,

        /// Head commit SHA.
        head: String,
    },
}

impl Error {
    /// Did this error come from hitting the rate limit floor?
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// When the rate limit resets, if this is a rate limit error.
    pub fn reset(&self) -> Option<DateTime<Utc>> {
        match self {
            Error::RateLimited { reset, .. } => Some(*reset),
            _ => None,
        }
    }
}
