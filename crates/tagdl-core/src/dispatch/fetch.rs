//! Fetch-and-save for one work list item.

use std::fs;

use crate::post::PostRecord;
use crate::remote::RemoteClient;
use crate::retry::{FetchState, SkipPolicy};
use crate::store::{ensure_dir, AcquisitionStore};

/// Dispatcher behavior knobs, resolved from config and the tag request.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Write tag list and metadata only; no asset fetch.
    pub only_infos: bool,
    /// Extensions to skip entirely (e.g. `mp4`, `zip`).
    pub skip_extensions: Vec<String>,
    /// Whether the skip list matches extensions case-insensitively.
    pub skip_extensions_ignore_case: bool,
    /// Successive-error budget for the asset fetch.
    pub retry: SkipPolicy,
}

impl FetchOptions {
    fn skips_extension(&self, ext: &str) -> bool {
        self.skip_extensions.iter().any(|s| {
            if self.skip_extensions_ignore_case {
                s.eq_ignore_ascii_case(ext)
            } else {
                s == ext
            }
        })
    }
}

/// How one item settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Acquired,
    AlreadyComplete,
    SkippedExtension,
    Failed,
}

/// Fetches and persists one post. Failures are logged and contained: the
/// caller only sees the outcome, never an abort.
pub(super) fn fetch_one(
    client: &RemoteClient,
    store: &AcquisitionStore,
    tag: &str,
    item: &PostRecord,
    opts: &FetchOptions,
) -> ItemOutcome {
    // The work list only holds validated records, but the dispatcher does
    // not rely on that: a malformed record is dropped here too.
    let fields = match item.fields() {
        Ok(f) => f,
        Err(err) => {
            tracing::debug!(%err, "record not persistable");
            return ItemOutcome::Failed;
        }
    };
    let paths = store.paths(tag, fields.rating, fields.id, fields.file_ext);

    let asset_done = opts.only_infos || paths.image.exists();
    if asset_done && paths.tags.exists() && paths.infos.exists() {
        tracing::debug!(id = fields.id, "already on disk");
        return ItemOutcome::AlreadyComplete;
    }

    if opts.skips_extension(fields.file_ext) {
        tracing::debug!(id = fields.id, ext = fields.file_ext, "extension skipped");
        return ItemOutcome::SkippedExtension;
    }

    // Workers race to create the rating directory; AlreadyExists is fine.
    if let Err(err) = ensure_dir(&store.rating_dir(tag, fields.rating)) {
        tracing::warn!(id = fields.id, %err, "could not create output directory");
        return ItemOutcome::Failed;
    }

    if !opts.only_infos {
        let bytes = match fetch_asset_with_retry(client, fields.file_url, opts.retry) {
            Some(bytes) => bytes,
            None => return ItemOutcome::Failed,
        };
        if let Err(err) = fs::write(&paths.image, bytes) {
            tracing::warn!(id = fields.id, %err, "asset write failed");
            return ItemOutcome::Failed;
        }
    }

    let tag_lines = item.tags().collect::<Vec<_>>().join("\n");
    if let Err(err) = fs::write(&paths.tags, tag_lines) {
        tracing::warn!(id = fields.id, %err, "tag list write failed");
        return ItemOutcome::Failed;
    }
    let infos = match serde_json::to_string_pretty(item) {
        Ok(s) => s,
        Err(err) => {
            tracing::warn!(id = fields.id, %err, "record serialization failed");
            return ItemOutcome::Failed;
        }
    };
    if let Err(err) = fs::write(&paths.infos, infos) {
        tracing::warn!(id = fields.id, %err, "metadata write failed");
        return ItemOutcome::Failed;
    }
    if let Err(err) = store.append_manifest(tag, fields.rating, fields.id) {
        // The manifest is a fast-path index; the scan still finds the item.
        tracing::warn!(id = fields.id, %err, "manifest append failed");
    }

    tracing::debug!(id = fields.id, "acquired");
    ItemOutcome::Acquired
}

/// Asset GET under the shared retry-then-skip budget.
fn fetch_asset_with_retry(
    client: &RemoteClient,
    url: &str,
    policy: SkipPolicy,
) -> Option<Vec<u8>> {
    let mut state = FetchState::Fetching;
    loop {
        match client.fetch_asset(url) {
            Ok(bytes) => return Some(bytes),
            Err(err) => {
                state = policy.on_error(state);
                match state {
                    FetchState::Retrying(n) => {
                        tracing::debug!(url, failures = n, %err, "asset fetch failed, retrying");
                    }
                    FetchState::Skipped => {
                        tracing::warn!(url, %err, "asset abandoned after repeated failures");
                        return None;
                    }
                    FetchState::Fetching => unreachable!("on_error never yields Fetching"),
                }
            }
        }
    }
}
