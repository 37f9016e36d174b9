//! CLI for the TagDL bulk image board downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tagdl_core::config;
use tagdl_core::remote::RemoteClient;
use tagdl_core::store::AcquisitionStore;

use commands::{run_count, run_fetch, run_status, run_tag_file};

/// Top-level CLI for the TagDL downloader.
#[derive(Debug, Parser)]
#[command(name = "tagdl")]
#[command(about = "TagDL: bulk tag-based image board downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Process a tag list file (one tag per line, `*` prefix = metadata only).
    Run {
        /// Tag list file; defaults to `tags.txt` in the configured input dir.
        file: Option<PathBuf>,
        /// Override the configured worker count.
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
    },

    /// Retrieve and download a single tag.
    Fetch {
        /// Tag to search for.
        tag: String,
        /// Restrict to one content rating (e.g. g, s, q, e).
        #[arg(long)]
        rating: Option<String>,
        /// Cap the number of items (skips the remote count query).
        #[arg(long)]
        limit: Option<u64>,
        /// Write tag lists and metadata only; no asset downloads.
        #[arg(long)]
        only_infos: bool,
        /// Override the configured worker count.
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
    },

    /// Query the remote index for a tag's total post count.
    Count {
        /// Tag to look up.
        tag: String,
    },

    /// Summarize local acquisitions per tag and rating.
    Status,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let client = RemoteClient::new(&cfg.base_url)?;
        let store = AcquisitionStore::new(&cfg.output_dir);

        match cli.command {
            CliCommand::Run { file, workers } => {
                run_tag_file(&client, &store, &cfg, file.as_deref(), workers)?
            }
            CliCommand::Fetch {
                tag,
                rating,
                limit,
                only_infos,
                workers,
            } => run_fetch(
                &client,
                &store,
                &cfg,
                &tag,
                rating.as_deref(),
                limit,
                only_infos,
                workers,
            )?,
            CliCommand::Count { tag } => run_count(&client, &tag)?,
            CliCommand::Status => run_status(&store)?,
        }

        Ok(())
    }
}
