//! Tag list input file: one tag per line, `*` prefix = metadata only.

use std::fs;
use std::io;
use std::path::Path;

/// One line of the tag list file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRequest {
    pub tag: String,
    /// Acquire tag list and metadata only; skip the asset fetch.
    pub only_infos: bool,
}

/// Parses a tag list file. Blank lines are skipped.
pub fn parse_tag_file(path: &Path) -> io::Result<Vec<TagRequest>> {
    Ok(parse_tag_lines(&fs::read_to_string(path)?))
}

pub fn parse_tag_lines(text: &str) -> Vec<TagRequest> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.strip_prefix('*') {
            Some(rest) => TagRequest {
                tag: rest.trim().to_string(),
                only_infos: true,
            },
            None => TagRequest {
                tag: line.to_string(),
                only_infos: false,
            },
        })
        .filter(|req| !req.tag.is_empty())
        .collect()
}
