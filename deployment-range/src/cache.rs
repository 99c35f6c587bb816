//! Incrementally refreshed cache of every deployment in a repository.

use std::collections::{HashMap, HashSet};

use api_client::{ListOptions, RateLimit};

use crate::error::Error;
use crate::model::{Deployment, DeploymentId};
use crate::repository::{RawDeployment, Repository};

/// Deployments requested per listing page.
pub const PER_PAGE: u32 = 100;

/// Listing stops with [Error::RateLimited] once this few requests remain.
pub const RATE_LIMIT_FLOOR: u32 = 10;

/// Every deployment seen so far, as an append-only log.
///
/// The log is stored oldest first so that refreshes only ever push onto the
/// end. The marker is the newest entry: a refresh scans the remote listing
/// from the newest deployment until it meets the marker, then appends what it
/// found in front of it.
#[derive(Debug, Default)]
pub struct DeploymentCache {
    log: Vec<Deployment>,
    positions: HashMap<DeploymentId, usize>,
}

impl DeploymentCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached deployments.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Has nothing been loaded yet?
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// ID of the newest cached deployment.
    pub fn marker(&self) -> Option<DeploymentId> {
        self.log.last().map(|deployment| deployment.id)
    }

    /// Look up a cached deployment.
    pub fn get(&self, id: DeploymentId) -> Option<&Deployment> {
        self.positions.get(&id).map(|&position| &self.log[position])
    }

    /// Is this deployment cached?
    pub fn contains(&self, id: DeploymentId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Cached deployments, newest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Deployment> + '_ {
        self.log.iter().rev()
    }

    /// Bring the cache up to date with the remote listing.
    ///
    /// Returns the number of deployments added. Cached deployments met on the
    /// pages read have their `updated_at` refreshed in place. Nothing changes
    /// unless the whole refresh succeeds.
    #[tracing::instrument(skip_all, fields(marker = ?self.marker()))]
    pub async fn ensure_loaded<R>(&mut self, repository: &R) -> Result<usize, Error>
    where
        R: Repository + ?Sized,
    {
        let marker = self.marker();
        let mut fresh: Vec<RawDeployment> = Vec::new();
        let mut touched = Vec::new();
        let mut seen = HashSet::new();
        let mut found = false;
        let mut page = 1;

        loop {
            let listing = repository
                .list_deployments(ListOptions::new(page, PER_PAGE))
                .await
                .map_err(|source| Error::ListDeployments { page, source })?;

            for raw in listing.items {
                if Some(raw.id) == marker {
                    found = true;
                }

                if let Some(&position) = self.positions.get(&raw.id) {
                    touched.push((position, raw.updated_at));
                    continue;
                }

                if found {
                    tracing::debug!(id = raw.id, page, "Ignoring uncached deployment past the marker");
                    continue;
                }

                if !seen.insert(raw.id) {
                    tracing::warn!(id = raw.id, page, "Ignoring repeated deployment");
                    continue;
                }

                fresh.push(raw);
            }

            check_rate_limit(listing.rate.as_ref())?;

            match listing.next {
                Some(next) if !found && next > page => page = next,
                _ => break,
            }
        }

        if let Some(marker) = marker {
            if !found {
                return Err(Error::MissingSentinel(marker));
            }
        }

        for (position, updated_at) in touched {
            self.log[position].updated_at = updated_at;
        }

        let added = fresh.len();
        for raw in fresh.into_iter().rev() {
            self.positions.insert(raw.id, self.log.len());
            self.log.push(Deployment::from(&raw));
        }

        tracing::debug!(added, total = self.log.len(), "Deployment cache loaded");
        Ok(added)
    }
}

fn check_rate_limit(rate: Option<&RateLimit>) -> Result<(), Error> {
    match rate {
        Some(rate) if rate.remaining <= RATE_LIMIT_FLOOR => {
            tracing::warn!(remaining = rate.remaining, reset = %rate.reset, "Rate limit nearly exhausted");
            Err(Error::RateLimited {
                remaining: rate.remaining,
                reset: rate.reset,
            })
        }
        _ => Ok(()),
    }
}
