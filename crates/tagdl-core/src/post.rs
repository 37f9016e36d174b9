//! Post records returned by the remote index.
//!
//! The index is loose about shape: deleted, banned, or restricted posts come
//! back without `file_url`, and fields vary per instance. Everything beyond
//! the required five is kept in a flattened map so the metadata file
//! round-trips the record exactly as received.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One post as reported by the remote index. All required fields are
/// optional at the wire level; validation happens in [`PostRecord::fields`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    /// Every other field the remote sent, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A record missing one of the five required fields. Discarded, never
/// retried: a permanently malformed record will not fix itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("post record missing required field `{0}`")]
pub struct MalformedRecord(pub &'static str);

/// Borrowed view of a record once all required fields are known present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFields<'a> {
    pub id: u64,
    pub file_url: &'a str,
    pub file_ext: &'a str,
    pub tag_string: &'a str,
    pub rating: &'a str,
}

impl PostRecord {
    /// The remote omits `file_url` for posts it will not serve
    /// (deleted, banned, restricted). Such posts are skipped, not stored.
    pub fn is_unavailable(&self) -> bool {
        self.file_url.is_none()
    }

    /// Validates the required fields and returns a borrowed view of them.
    pub fn fields(&self) -> Result<PostFields<'_>, MalformedRecord> {
        Ok(PostFields {
            id: self.id.ok_or(MalformedRecord("id"))?,
            file_url: self.file_url.as_deref().ok_or(MalformedRecord("file_url"))?,
            file_ext: self.file_ext.as_deref().ok_or(MalformedRecord("file_ext"))?,
            tag_string: self
                .tag_string
                .as_deref()
                .ok_or(MalformedRecord("tag_string"))?,
            rating: self.rating.as_deref().ok_or(MalformedRecord("rating"))?,
        })
    }

    /// Individual tags from the whitespace-delimited tag string.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tag_string.as_deref().unwrap_or("").split_whitespace()
    }
}
