//! `tagdl fetch <tag>` – retrieve and download a single tag.

use anyhow::Result;

use tagdl_core::config::TagdlConfig;
use tagdl_core::remote::RemoteClient;
use tagdl_core::store::AcquisitionStore;

use super::{login_from_env, process_tag};

pub fn run_fetch(
    client: &RemoteClient,
    store: &AcquisitionStore,
    cfg: &TagdlConfig,
    tag: &str,
    rating: Option<&str>,
    limit: Option<u64>,
    only_infos: bool,
    workers: Option<usize>,
) -> Result<()> {
    login_from_env(client)?;
    let workers = workers.unwrap_or_else(|| cfg.effective_workers());
    process_tag(client, store, cfg, tag, rating, limit, only_infos, workers)
}
