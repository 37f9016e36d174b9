//! Logging init: file under XDG state dir, or graceful fallback to stderr.
//!
//! The CLI draws live progress on stdout, so tracing output goes to a file
//! by default and only lands on stderr when the state dir is unusable.

use anyhow::Result;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Per-write sink: the cloned log file, or stderr when cloning fails.
enum LogSink {
    File(fs::File),
    Stderr,
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tagdl=debug"))
}

/// Initialize structured logging to `~/.local/state/tagdl/tagdl.log`.
/// Returns Err when the log file cannot be opened so the caller can fall
/// back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tagdl")?;
    let log_dir = xdg_dirs.get_state_home().join("tagdl");
    fs::create_dir_all(&log_dir)?;
    let log_file_path: PathBuf = log_dir.join("tagdl.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(move || {
            file.try_clone()
                .map(LogSink::File)
                .unwrap_or(LogSink::Stderr)
        })
        .with_ansi(false)
        .init();

    tracing::info!("tagdl logging initialized at {}", log_file_path.display());
    Ok(())
}

/// Initialize logging to stderr only. Use when [`init_logging`] fails so
/// the CLI still reports what it is doing.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
