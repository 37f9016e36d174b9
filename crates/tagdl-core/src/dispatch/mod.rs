//! Fetch dispatcher: bounded worker pool over the work list.
//!
//! Workers pop posts from a shared deque and send per-item outcomes over a
//! channel. One failing download never aborts the pool; each item writes a
//! distinct file set, so the only shared mutable state is the work deque
//! and the (append-only) manifest.

mod fetch;

pub use fetch::{FetchOptions, ItemOutcome};

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

use crate::post::PostRecord;
use crate::remote::RemoteClient;
use crate::store::AcquisitionStore;

/// Snapshot sent to the progress channel after each item settles.
#[derive(Debug, Clone, Copy)]
pub struct FetchProgress {
    pub done: usize,
    pub total: usize,
}

/// Per-tag totals for one dispatch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Items fetched and persisted this run.
    pub acquired: u64,
    /// Items whose files were already all on disk.
    pub already_complete: u64,
    /// Items skipped by the extension policy.
    pub skipped_extension: u64,
    /// Items abandoned after fetch or storage failures.
    pub failed: u64,
}

impl DispatchSummary {
    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Acquired => self.acquired += 1,
            ItemOutcome::AlreadyComplete => self.already_complete += 1,
            ItemOutcome::SkippedExtension => self.skipped_extension += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
    }
}

/// Fetches every post in `work` using up to `workers` threads.
///
/// Progress snapshots go to `progress` (when given) as items settle;
/// outcomes are aggregated into the returned summary.
pub fn run_dispatch(
    client: &RemoteClient,
    store: &AcquisitionStore,
    tag: &str,
    work: Vec<PostRecord>,
    opts: &FetchOptions,
    workers: usize,
    progress: Option<&mpsc::Sender<FetchProgress>>,
) -> DispatchSummary {
    let total = work.len();
    let mut summary = DispatchSummary::default();
    if total == 0 {
        return summary;
    }

    let queue = Mutex::new(work.into_iter().collect::<VecDeque<_>>());
    let (tx, rx) = mpsc::channel::<ItemOutcome>();
    let worker_count = workers.max(1).min(total);

    thread::scope(|scope| {
        for _ in 0..worker_count {
            let tx = tx.clone();
            let queue = &queue;
            scope.spawn(move || loop {
                let Some(item) = queue.lock().unwrap().pop_front() else {
                    break;
                };
                let outcome = fetch::fetch_one(client, store, tag, &item, opts);
                if tx.send(outcome).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        let mut done = 0usize;
        for outcome in rx {
            done += 1;
            summary.record(outcome);
            if let Some(progress) = progress {
                let _ = progress.send(FetchProgress { done, total });
            }
        }
    });

    tracing::info!(
        tag,
        acquired = summary.acquired,
        already_complete = summary.already_complete,
        skipped = summary.skipped_extension,
        failed = summary.failed,
        "dispatch finished"
    );
    summary
}
