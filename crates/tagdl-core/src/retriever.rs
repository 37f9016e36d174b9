//! Paginated retrieval: build the work list for one tag.
//!
//! Walks posts pages of a fixed size until the page budget (derived from the
//! plan's desired count) is spent or the remote returns an empty page. Pages
//! that keep failing are skipped, not retried forever: losing one page is
//! preferred over stalling the run. Filtering keeps the work list free of
//! unavailable, malformed, and already-acquired posts.

use std::collections::HashSet;

use crate::post::PostRecord;
use crate::remote::{PageQuery, MAX_ITEMS_PER_PAGE};
use crate::resolver::RetrievalPlan;
use crate::retry::{FetchState, PageError, SkipPolicy};

/// Supplies result pages. The production implementation is
/// [`RemoteClient`](crate::remote::RemoteClient); tests script pages in
/// memory.
pub trait PageSource {
    fn fetch_page(&self, query: &PageQuery) -> Result<Vec<PostRecord>, PageError>;
}

/// Posts selected for acquisition, in the order the remote reported them.
/// An ID set rides along so duplicate suppression is O(1); the remote does
/// occasionally repeat posts across page boundaries.
#[derive(Debug, Default)]
pub struct WorkList {
    items: Vec<PostRecord>,
    ids: HashSet<u64>,
}

impl WorkList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PostRecord> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<PostRecord> {
        self.items
    }

    fn push(&mut self, id: u64, record: PostRecord) {
        self.ids.insert(id);
        self.items.push(record);
    }
}

/// Counters for one retrieval pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalStats {
    /// Pages fetched successfully.
    pub pages_fetched: u32,
    /// Pages abandoned after the successive-error budget ran out.
    pub pages_skipped: u32,
    /// Failed attempts that were retried.
    pub retries: u32,
    /// Records without an asset URL (deleted/restricted upstream).
    pub unavailable: u64,
    /// Records missing a required field.
    pub malformed: u64,
    /// Records already acquired or already in the work list.
    pub duplicates: u64,
}

/// Result of one retrieval pass.
#[derive(Debug)]
pub struct Retrieval {
    pub work: WorkList,
    pub stats: RetrievalStats,
}

/// Items to request for `page` (1-based) so that the final page exactly
/// fills the remaining desired count.
fn page_size(desired: u64, page: u64) -> u64 {
    desired
        .saturating_sub(MAX_ITEMS_PER_PAGE * (page - 1))
        .min(MAX_ITEMS_PER_PAGE)
}

/// Builds the work list for `tag` according to `plan`.
///
/// A desired count of zero issues no page requests. The successive-error
/// counter is shared by transport and status failures and resets on any
/// successful fetch and on any skip decision; the page counter only ever
/// moves forward.
pub fn collect_work_list(
    source: &impl PageSource,
    tag: &str,
    rating: Option<&str>,
    plan: &RetrievalPlan,
    policy: SkipPolicy,
) -> Retrieval {
    let mut work = WorkList::default();
    let mut stats = RetrievalStats::default();

    let page_limit = plan.desired.div_ceil(MAX_ITEMS_PER_PAGE);
    let mut page = 1u64;
    let mut state = FetchState::Fetching;

    while page <= page_limit {
        let query = PageQuery {
            tag: tag.to_string(),
            rating: rating.map(str::to_string),
            min_id: plan.min_id,
            page,
            limit: page_size(plan.desired, page),
        };
        let items = match source.fetch_page(&query) {
            Ok(items) => items,
            Err(err) => {
                state = policy.on_error(state);
                match state {
                    FetchState::Retrying(n) => {
                        tracing::warn!(tag, page, failures = n, %err, "page fetch failed, retrying");
                        stats.retries += 1;
                    }
                    FetchState::Skipped => {
                        tracing::warn!(tag, page, %err, "error budget spent, skipping page");
                        stats.pages_skipped += 1;
                        state = FetchState::Fetching;
                        page += 1;
                    }
                    FetchState::Fetching => unreachable!("on_error never yields Fetching"),
                }
                continue;
            }
        };

        state = FetchState::Fetching;
        stats.pages_fetched += 1;
        if items.is_empty() {
            tracing::debug!(tag, page, "empty page, no more results");
            break;
        }

        for item in items {
            if item.is_unavailable() {
                tracing::debug!(id = item.id, "post has no asset URL, skipped");
                stats.unavailable += 1;
                continue;
            }
            let id = match item.fields() {
                Ok(fields) => fields.id,
                Err(err) => {
                    tracing::debug!(%err, "malformed post record discarded");
                    stats.malformed += 1;
                    continue;
                }
            };
            if plan.acquired.contains(&id) || work.contains(id) {
                tracing::debug!(id, "post already acquired or queued");
                stats.duplicates += 1;
                continue;
            }
            work.push(id, item);
        }

        tracing::info!(tag, page, queued = work.len(), "page processed");
        page += 1;
    }

    Retrieval { work, stats }
}
