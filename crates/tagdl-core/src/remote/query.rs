//! Posts query construction.
//!
//! The query string is assembled by hand: tag values routinely contain
//! characters meaningful to the remote query grammar (`*`, `:`, parentheses)
//! and must reach the server unencoded, so a generic parameter serializer
//! cannot be used here.

/// Fixed page size for posts queries.
pub const MAX_ITEMS_PER_PAGE: u64 = 200;

/// Above this desired count the ordered fetch (`order:id`) is not requested:
/// ordering very large result sets by ID risks timeouts upstream.
pub const ORDERED_FETCH_THRESHOLD: u64 = 10_000;

/// One page request against the posts index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub tag: String,
    /// Optional rating filter, appended as `+rating:{r}`.
    pub rating: Option<String>,
    /// Ordered fetch: request IDs at or above this, oldest first.
    pub min_id: Option<u64>,
    /// 1-based page number.
    pub page: u64,
    /// Items requested for this page; the last page is sized to exactly
    /// fill the remaining desired count.
    pub limit: u64,
}

impl PageQuery {
    /// Renders `tags={tag}[+rating:{r}][+order:id][+id:>={min}]&limit={n}&page={p}`.
    pub fn query_string(&self) -> String {
        let mut q = String::from("tags=");
        q.push_str(&self.tag);
        if let Some(rating) = &self.rating {
            q.push_str("+rating:");
            q.push_str(rating);
        }
        if let Some(min_id) = self.min_id {
            q.push_str("+order:id+id:>=");
            q.push_str(&min_id.to_string());
        }
        q.push_str(&format!("&limit={}&page={}", self.limit, self.page));
        q
    }
}
