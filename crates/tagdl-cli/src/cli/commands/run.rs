//! `tagdl run` – process a tag list file end to end.

use anyhow::{Context, Result};
use std::path::Path;

use tagdl_core::config::TagdlConfig;
use tagdl_core::remote::RemoteClient;
use tagdl_core::store::AcquisitionStore;
use tagdl_core::taglist;

use super::{login_from_env, process_tag};

pub fn run_tag_file(
    client: &RemoteClient,
    store: &AcquisitionStore,
    cfg: &TagdlConfig,
    file: Option<&Path>,
    workers: Option<usize>,
) -> Result<()> {
    login_from_env(client)?;

    let default_path = cfg.input_dir.join("tags.txt");
    let path = file.unwrap_or(&default_path);
    let requests = taglist::parse_tag_file(path)
        .with_context(|| format!("could not read tag list {}", path.display()))?;
    if requests.is_empty() {
        println!("No tags in {}.", path.display());
        return Ok(());
    }

    println!("Tags to process ('*' = metadata only):");
    for req in &requests {
        println!("  - {}{}", if req.only_infos { "*" } else { "" }, req.tag);
    }

    let workers = workers.unwrap_or_else(|| cfg.effective_workers());
    for req in &requests {
        process_tag(
            client,
            store,
            cfg,
            &req.tag,
            None,
            None,
            req.only_infos,
            workers,
        )?;
    }
    Ok(())
}
