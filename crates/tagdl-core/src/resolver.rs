//! Tag resolution: how much the remote has, what is already on disk.
//!
//! Leaf component with no retrieval logic of its own. `plan` combines the
//! remote count and the local acquired set into everything the paginated
//! retriever needs for one tag run.

use std::collections::HashSet;

use crate::remote::{RemoteClient, RemoteError, ORDERED_FETCH_THRESHOLD};
use crate::store::AcquisitionStore;

/// Inputs for one retrieval pass over a tag.
#[derive(Debug, Clone)]
pub struct RetrievalPlan {
    /// Items still wanted: explicit limit, or remote count minus acquired.
    pub desired: u64,
    /// IDs already complete on disk (scan ∪ manifest).
    pub acquired: HashSet<u64>,
    /// When set, pages are requested oldest-first starting at this ID,
    /// skipping everything already acquired server-side.
    pub min_id: Option<u64>,
    /// Remote total, when the count query was issued.
    pub remote_count: Option<u64>,
}

/// Resolves a tag against the remote index and local storage.
pub struct TagResolver<'a> {
    client: &'a RemoteClient,
    store: &'a AcquisitionStore,
}

impl<'a> TagResolver<'a> {
    pub fn new(client: &'a RemoteClient, store: &'a AcquisitionStore) -> Self {
        Self { client, store }
    }

    /// Total known post count for `tag`. Propagates shape mismatches as
    /// [`RemoteError`]; never guesses a default.
    pub fn remote_count(&self, tag: &str) -> Result<u64, RemoteError> {
        self.client.post_count(tag)
    }

    /// IDs of completed acquisitions for `tag`, optionally rating-scoped.
    pub fn acquired_ids(&self, tag: &str, rating: Option<&str>) -> HashSet<u64> {
        self.store.acquired_ids(tag, rating)
    }

    /// Builds the plan for one run. An explicit `limit` skips the count
    /// query entirely (so `--limit 0` issues no remote requests at all).
    ///
    /// The ordered fetch is only planned when the desired count is below
    /// [`ORDERED_FETCH_THRESHOLD`] and something is already acquired;
    /// `min_id` is the highest acquired ID plus one, so only strictly newer
    /// posts are requested.
    pub fn plan(
        &self,
        tag: &str,
        rating: Option<&str>,
        limit: Option<u64>,
    ) -> Result<RetrievalPlan, RemoteError> {
        let acquired = self.acquired_ids(tag, rating);
        let (desired, remote_count) = match limit {
            Some(n) => (n, None),
            None => {
                let count = self.remote_count(tag)?;
                tracing::info!(tag, count, acquired = acquired.len(), "resolved tag");
                (count.saturating_sub(acquired.len() as u64), Some(count))
            }
        };
        let min_id = if desired > 0 && desired < ORDERED_FETCH_THRESHOLD {
            acquired.iter().max().map(|max| max + 1)
        } else {
            None
        };
        Ok(RetrievalPlan {
            desired,
            acquired,
            min_id,
            remote_count,
        })
    }
}
