//! Local acquisition storage.
//!
//! Layout: `{root}/{sanitized_tag}/{rating}/` holds, per post, an asset file
//! (`{id}_image.{ext}`), a tag list (`{id}_tags.txt`), and the full record
//! (`{id}_infos.json`). An item is complete when all three exist. Each
//! rating directory may carry a `manifest.txt` — an append-only list of
//! acquired IDs used as a fast-path index; it also covers metadata-only
//! acquisitions, which never get an asset file.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::sanitize::sanitize_tag_dir;

/// Manifest file name inside each rating directory.
pub const MANIFEST_FILE: &str = "manifest.txt";

/// Paths for one acquisition.
#[derive(Debug, Clone)]
pub struct AcquisitionPaths {
    pub image: PathBuf,
    pub tags: PathBuf,
    pub infos: PathBuf,
}

/// Storage root plus the layout rules above.
#[derive(Debug, Clone)]
pub struct AcquisitionStore {
    root: PathBuf,
}

impl AcquisitionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tag_dir(&self, tag: &str) -> PathBuf {
        self.root.join(sanitize_tag_dir(tag))
    }

    pub fn rating_dir(&self, tag: &str, rating: &str) -> PathBuf {
        self.tag_dir(tag).join(rating)
    }

    pub fn manifest_path(&self, tag: &str, rating: &str) -> PathBuf {
        self.rating_dir(tag, rating).join(MANIFEST_FILE)
    }

    pub fn paths(&self, tag: &str, rating: &str, id: u64, ext: &str) -> AcquisitionPaths {
        let dir = self.rating_dir(tag, rating);
        AcquisitionPaths {
            image: dir.join(format!("{id}_image.{ext}")),
            tags: dir.join(format!("{id}_tags.txt")),
            infos: dir.join(format!("{id}_infos.json")),
        }
    }

    /// IDs of completed acquisitions under `tag`, optionally scoped to one
    /// rating. Unions the directory scan with manifest entries; a missing
    /// directory or manifest means "nothing acquired", not an error.
    pub fn acquired_ids(&self, tag: &str, rating: Option<&str>) -> HashSet<u64> {
        let dirs: Vec<PathBuf> = match rating {
            Some(r) => vec![self.rating_dir(tag, r)],
            None => subdirs(&self.tag_dir(tag)),
        };
        let mut ids = HashSet::new();
        for dir in dirs {
            scan_rating_dir(&dir, &mut ids);
        }
        ids
    }

    /// Appends one ID to the rating directory's manifest.
    pub fn append_manifest(&self, tag: &str, rating: &str, id: u64) -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.manifest_path(tag, rating))?;
        writeln!(file, "{id}")
    }
}

/// Creates a directory path, treating "already exists" as success.
/// Concurrent fetch workers race to create the same rating directory.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

fn subdirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect()
}

/// Collects completed IDs from one rating directory: an ID counts when its
/// infos, tags, and image files are all present, or when it is listed in
/// the manifest.
fn scan_rating_dir(dir: &Path, ids: &mut HashSet<u64>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut with_infos = HashSet::new();
    let mut with_tags = HashSet::new();
    let mut with_image = HashSet::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name == MANIFEST_FILE {
            read_manifest(&entry.path(), ids);
            continue;
        }
        let Some((id_part, rest)) = name.split_once('_') else {
            continue;
        };
        let Ok(id) = id_part.parse::<u64>() else {
            continue;
        };
        if rest == "infos.json" {
            with_infos.insert(id);
        } else if rest == "tags.txt" {
            with_tags.insert(id);
        } else if rest.starts_with("image.") {
            with_image.insert(id);
        }
    }
    ids.extend(
        with_infos
            .iter()
            .filter(|id| with_tags.contains(id) && with_image.contains(id)),
    );
}

fn read_manifest(path: &Path, ids: &mut HashSet<u64>) {
    let Ok(text) = fs::read_to_string(path) else {
        return;
    };
    ids.extend(text.lines().filter_map(|line| line.trim().parse::<u64>().ok()));
}
