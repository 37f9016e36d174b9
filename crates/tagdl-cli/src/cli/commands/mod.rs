//! Subcommand implementations plus the shared per-tag pipeline.

mod count;
mod fetch;
mod run;
mod status;

pub use count::run_count;
pub use fetch::run_fetch;
pub use run::run_tag_file;
pub use status::run_status;

use anyhow::Result;
use std::io::Write;
use std::sync::mpsc;
use std::thread;

use tagdl_core::config::TagdlConfig;
use tagdl_core::dispatch::{run_dispatch, FetchOptions, FetchProgress};
use tagdl_core::remote::{Credentials, RemoteClient};
use tagdl_core::resolver::TagResolver;
use tagdl_core::retriever::collect_work_list;
use tagdl_core::retry::SkipPolicy;
use tagdl_core::store::AcquisitionStore;

/// Verifies credentials from `TAGDL_LOGIN`/`TAGDL_API_KEY` when both are
/// set. A rejection is fatal to the whole run; absent credentials mean
/// anonymous access.
pub(crate) fn login_from_env(client: &RemoteClient) -> Result<()> {
    match (std::env::var("TAGDL_LOGIN"), std::env::var("TAGDL_API_KEY")) {
        (Ok(login), Ok(api_key)) => {
            client.verify_login(&Credentials { login, api_key })?;
            tracing::info!("login verified");
        }
        _ => {
            tracing::info!("TAGDL_LOGIN/TAGDL_API_KEY not set, continuing anonymously");
        }
    }
    Ok(())
}

/// Resolve → retrieve → dispatch for one tag, with live item progress on
/// stdout and a newly-acquired summary at the end.
pub(crate) fn process_tag(
    client: &RemoteClient,
    store: &AcquisitionStore,
    cfg: &TagdlConfig,
    tag: &str,
    rating: Option<&str>,
    limit: Option<u64>,
    only_infos: bool,
    workers: usize,
) -> Result<()> {
    let policy = SkipPolicy::new(cfg.successive_error_limit);
    let plan = TagResolver::new(client, store).plan(tag, rating, limit)?;
    if let Some(count) = plan.remote_count {
        println!(
            "Tag '{tag}': {count} post(s) known remotely, {} already acquired.",
            plan.acquired.len()
        );
    }

    let retrieval = collect_work_list(client, tag, rating, &plan, policy);
    let stats = retrieval.stats;
    println!(
        "{} item(s) queued for '{tag}' ({} page(s) fetched, {} skipped).",
        retrieval.work.len(),
        stats.pages_fetched,
        stats.pages_skipped
    );
    if retrieval.work.is_empty() {
        println!("Nothing new to download for '{tag}'.");
        return Ok(());
    }

    let opts = FetchOptions {
        only_infos,
        skip_extensions: cfg.skip_extensions.clone(),
        skip_extensions_ignore_case: cfg.skip_extensions_ignore_case,
        retry: policy,
    };

    let (progress_tx, progress_rx) = mpsc::channel::<FetchProgress>();
    let printer = thread::spawn(move || {
        for p in progress_rx {
            print!("\r  {}/{} item(s)", p.done, p.total);
            let _ = std::io::stdout().flush();
        }
        println!();
    });

    let summary = run_dispatch(
        client,
        store,
        tag,
        retrieval.work.into_items(),
        &opts,
        workers,
        Some(&progress_tx),
    );
    drop(progress_tx);
    let _ = printer.join();

    println!(
        "{} newly acquired for '{tag}' ({} already on disk, {} skipped by extension, {} failed).",
        summary.acquired, summary.already_complete, summary.skipped_extension, summary.failed
    );
    Ok(())
}
