//! Github API object models.

pub mod commits;
pub mod compare;
pub mod deployments;

pub use commits::Commit;
pub use compare::{CommitComparison, ComparisonStatus};
pub use deployments::{
    Deployment, DeploymentId, DeploymentState, DeploymentStatus, DeploymentsQuery,
};
