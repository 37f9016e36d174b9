use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/tagdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagdlConfig {
    /// Remote index to download from.
    pub base_url: String,
    /// Where tag list files are looked up.
    pub input_dir: PathBuf,
    /// Root of the acquisition storage layout.
    pub output_dir: PathBuf,
    /// Successive failures tolerated before a page or asset is skipped.
    pub successive_error_limit: u32,
    /// Parallel fetch workers; 0 means one per available CPU.
    pub workers: usize,
    /// File extensions never fetched (e.g. "mp4", "zip").
    pub skip_extensions: Vec<String>,
    /// Whether `skip_extensions` matches case-insensitively.
    pub skip_extensions_ignore_case: bool,
}

impl Default for TagdlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://danbooru.donmai.us".to_string(),
            input_dir: PathBuf::from("./inputs"),
            output_dir: PathBuf::from("./outputs"),
            successive_error_limit: 5,
            workers: 0,
            skip_extensions: Vec::new(),
            skip_extensions_ignore_case: true,
        }
    }
}

impl TagdlConfig {
    /// Worker count with the `0 = all cores` rule applied.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(1)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tagdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TagdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TagdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: TagdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
