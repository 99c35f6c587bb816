//! Which deployments were successfully active during a window of time, and
//! what changed between them.
//!
//! A [DeploymentService] reads from a [Repository] (normally a
//! [GithubRepository]) and keeps everything it learns in memory:
//!
//! * the [DeploymentCache] holds every deployment, refreshed by scanning the
//!   remote listing only as far as the newest deployment already seen,
//! * the [SuccessResolver] reads a deployment's status history to find when
//!   it succeeded,
//! * the [RangeIndex] orders successful deployments by success time, and finds
//!   the deployment which was active when a window opened,
//! * the [CommitReconciler] compares consecutive deployments to list the
//!   commits each one added and removed.
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! use deployment_range::{DeploymentService, RepositoryConfig};
//!
//! let config = RepositoryConfig::from_env()?;
//! let mut service = DeploymentService::new(config.repository());
//!
//! let to = chrono::Utc::now();
//! let from = to - chrono::Duration::days(7);
//! for deployment in service.list_deployments_in_range(from, to).await? {
//!     println!("{} {} (+{} -{})", deployment.id, deployment.sha, deployment.added.len(), deployment.removed.len());
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod config;
mod error;
mod index;
pub mod mock;
pub mod model;
mod reconcile;
mod repository;
mod resolver;
mod service;

pub use self::cache::{DeploymentCache, PER_PAGE, RATE_LIMIT_FLOOR};
pub use self::config::{ConfigError, RepositoryConfig};
pub use self::error::{BoxError, Error};
pub use self::index::RangeIndex;
pub use self::model::{commit_title, Commit, Deployment, DeploymentId, TimeWindow};
pub use self::reconcile::CommitReconciler;
pub use self::repository::{GithubRepository, RawDeployment, Repository};
pub use self::resolver::{Resolution, SuccessResolver, STATUS_PAGE_SIZE};
pub use self::service::{DeploymentService, SharedDeploymentService};
