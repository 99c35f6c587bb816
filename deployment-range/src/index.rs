//! Successful deployments ordered by the time they succeeded.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Bound;

use chrono::{DateTime, Utc};

use crate::cache::DeploymentCache;
use crate::error::Error;
use crate::model::{Deployment, DeploymentId, TimeWindow};
use crate::repository::Repository;
use crate::resolver::{Resolution, SuccessResolver};

type Key = (Reverse<DateTime<Utc>>, Reverse<DeploymentId>);

/// The key sorting after every entry which succeeded at or after `at`.
fn last_key_at(at: DateTime<Utc>) -> Key {
    (Reverse(at), Reverse(DeploymentId::MIN))
}

/// Success times for deployments in a [DeploymentCache], newest first.
///
/// The index only stores IDs and success times. Deployments are read back
/// out of the cache when queried, so the two can't disagree.
#[derive(Debug, Default)]
pub struct RangeIndex {
    order: BTreeSet<Key>,
    succeeded: HashMap<DeploymentId, DateTime<Utc>>,
    unsuccessful: HashSet<DeploymentId>,
}

impl RangeIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful deployments indexed.
    pub fn len(&self) -> usize {
        self.succeeded.len()
    }

    /// Is the index empty?
    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty()
    }

    /// Is this deployment known to have succeeded?
    pub fn contains(&self, id: DeploymentId) -> bool {
        self.succeeded.contains_key(&id)
    }

    /// When this deployment succeeded, if it is indexed.
    pub fn succeeded_at(&self, id: DeploymentId) -> Option<DateTime<Utc>> {
        self.succeeded.get(&id).copied()
    }

    /// Has this deployment's outcome been settled, one way or the other?
    pub fn is_settled(&self, id: DeploymentId) -> bool {
        self.contains(id) || self.unsuccessful.contains(&id)
    }

    /// Record that `id` succeeded at `at`.
    ///
    /// The first success time recorded for a deployment is kept.
    pub fn insert(&mut self, id: DeploymentId, at: DateTime<Utc>) -> bool {
        if self.succeeded.contains_key(&id) {
            return false;
        }
        self.succeeded.insert(id, at);
        self.order.insert((Reverse(at), Reverse(id)));
        true
    }

    /// Resolve every unsettled candidate for `window`, growing the index.
    ///
    /// Returns the number of deployments newly found successful.
    #[tracing::instrument(skip_all, fields(from = %window.from, to = %window.to))]
    pub async fn load_successful_in_range<R>(
        &mut self,
        repository: &R,
        cache: &DeploymentCache,
        resolver: &SuccessResolver,
        window: &TimeWindow,
    ) -> Result<usize, Error>
    where
        R: Repository + ?Sized,
    {
        let candidates: Vec<DeploymentId> = cache
            .iter()
            .filter(|deployment| window.is_candidate(deployment))
            .map(|deployment| deployment.id)
            .filter(|&id| !self.is_settled(id))
            .collect();

        let mut found = 0;
        for &id in &candidates {
            match resolver.resolve(repository, id).await? {
                Resolution::Succeeded(at) => {
                    if self.insert(id, at) {
                        found += 1;
                    }
                }
                Resolution::Unsuccessful => {
                    self.unsuccessful.insert(id);
                }
                Resolution::Pending => {}
            }
        }

        tracing::debug!(
            candidates = candidates.len(),
            found,
            indexed = self.len(),
            "Resolved candidates"
        );
        Ok(found)
    }

    /// Successful deployments which succeeded strictly inside `window`, newest first.
    pub fn query_in_range(&self, cache: &DeploymentCache, window: &TimeWindow) -> Vec<Deployment> {
        self.order
            .range((Bound::Excluded(last_key_at(window.to)), Bound::Unbounded))
            .take_while(|(Reverse(at), _)| *at > window.from)
            .filter_map(|&(Reverse(at), Reverse(id))| materialize(cache, id, at))
            .collect()
    }

    /// The newest deployment which succeeded strictly before `from`.
    ///
    /// This is the deployment that was active when a window starting at
    /// `from` opened. It is `None` only when nothing succeeded before `from`.
    pub fn predecessor(&self, cache: &DeploymentCache, from: DateTime<Utc>) -> Option<Deployment> {
        self.order
            .range((Bound::Excluded(last_key_at(from)), Bound::Unbounded))
            .find_map(|&(Reverse(at), Reverse(id))| materialize(cache, id, at))
    }
}

fn materialize(cache: &DeploymentCache, id: DeploymentId, at: DateTime<Utc>) -> Option<Deployment> {
    let mut deployment = cache.get(id)?.clone();
    deployment.succeeded_at = Some(at);
    Some(deployment)
}
