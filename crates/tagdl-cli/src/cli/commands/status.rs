//! `tagdl status` – summarize local acquisitions.

use anyhow::Result;
use std::fs;

use tagdl_core::store::AcquisitionStore;

pub fn run_status(store: &AcquisitionStore) -> Result<()> {
    let entries = match fs::read_dir(store.root()) {
        Ok(entries) => entries,
        Err(_) => {
            println!("No acquisitions under {}.", store.root().display());
            return Ok(());
        }
    };

    let mut tags: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    tags.sort();

    if tags.is_empty() {
        println!("No acquisitions under {}.", store.root().display());
        return Ok(());
    }

    println!("{:<40} {:<8} {}", "TAG", "RATING", "ACQUIRED");
    for tag in tags {
        let Ok(ratings) = fs::read_dir(store.root().join(&tag)) else {
            continue;
        };
        let mut rating_names: Vec<String> = ratings
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        rating_names.sort();
        for rating in rating_names {
            // Directory names are already sanitized; sanitization is
            // idempotent, so they can be fed back in as tags.
            let count = store.acquired_ids(&tag, Some(&rating)).len();
            println!("{:<40} {:<8} {}", tag, rating, count);
        }
    }
    Ok(())
}
