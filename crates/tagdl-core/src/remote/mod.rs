//! Blocking HTTP access to the remote index.
//!
//! Uses the curl crate (libcurl). One `Easy` handle per request; retrieval
//! is deliberately sequential, so there is nothing to pool. Body bytes are
//! collected into an owned buffer and parsed by the caller-facing methods.

mod query;

pub use query::{PageQuery, MAX_ITEMS_PER_PAGE, ORDERED_FETCH_THRESHOLD};

use std::time::Duration;

use thiserror::Error;

use crate::post::PostRecord;
use crate::retriever::PageSource;
use crate::retry::PageError;

/// Login credentials checked once at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub login: String,
    pub api_key: String,
}

/// Errors from index resolution (count query, login). These are shape or
/// auth problems that will not self-correct, so there is no retry path.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("invalid base URL `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("unsupported scheme in base URL `{0}`")]
    UnsupportedScheme(String),
    #[error("index request failed: {0}")]
    Transport(#[from] curl::Error),
    #[error("index request returned HTTP {0}")]
    Status(u32),
    #[error("index response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tag is unknown to the remote index")]
    UnknownTag,
    #[error("index response missing `{0}`")]
    MissingField(&'static str),
    #[error("login rejected (HTTP {0})")]
    LoginRejected(u32),
}

struct Response {
    status: u32,
    body: Vec<u8>,
}

/// Client for one remote index instance.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    base: String,
}

impl RemoteClient {
    /// Validates `base_url` (scheme + host) and keeps it without a trailing
    /// slash so paths can be appended directly.
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        let parsed = url::Url::parse(base_url).map_err(|source| RemoteError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RemoteError::UnsupportedScheme(base_url.to_string()));
        }
        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// GET an absolute URL into memory. `total_timeout` bounds the whole
    /// transfer; index responses are small, assets are not.
    fn get(&self, url: &str, total_timeout: Duration) -> Result<Response, curl::Error> {
        let mut body = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(Duration::from_secs(15))?;
        easy.timeout(total_timeout)?;
        easy.useragent(concat!("tagdl/", env!("CARGO_PKG_VERSION")))?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let status = easy.response_code()?;
        Ok(Response { status, body })
    }

    fn get_path(&self, path_and_query: &str) -> Result<Response, curl::Error> {
        self.get(
            &format!("{}{}", self.base, path_and_query),
            Duration::from_secs(60),
        )
    }

    /// Verifies credentials against `/users.json`. Any non-200 is a
    /// rejection; a rejection is fatal to the whole run.
    pub fn verify_login(&self, creds: &Credentials) -> Result<(), RemoteError> {
        let resp = self.get_path(&format!(
            "/users.json?login={}&api_key={}",
            creds.login, creds.api_key
        ))?;
        if resp.status != 200 {
            return Err(RemoteError::LoginRejected(resp.status));
        }
        Ok(())
    }

    /// Total known post count for `tag`, from the first element of the
    /// `/tags.json` search response. A missing element or field is a hard
    /// error, never defaulted.
    pub fn post_count(&self, tag: &str) -> Result<u64, RemoteError> {
        let resp = self.get_path(&format!("/tags.json?search[name]={tag}"))?;
        if resp.status != 200 {
            return Err(RemoteError::Status(resp.status));
        }
        let entries: Vec<serde_json::Value> = serde_json::from_slice(&resp.body)?;
        let first = entries.first().ok_or(RemoteError::UnknownTag)?;
        first
            .get("post_count")
            .and_then(serde_json::Value::as_u64)
            .ok_or(RemoteError::MissingField("post_count"))
    }

    /// Downloads one asset into memory. The body is buffered in full;
    /// nothing reaches disk until the transfer has succeeded.
    pub fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, PageError> {
        let resp = self.get(url, Duration::from_secs(600))?;
        if resp.status != 200 {
            return Err(PageError::Status(resp.status));
        }
        Ok(resp.body)
    }
}

impl PageSource for RemoteClient {
    fn fetch_page(&self, query: &PageQuery) -> Result<Vec<PostRecord>, PageError> {
        let resp = self.get_path(&format!("/posts.json?{}", query.query_string()))?;
        if resp.status != 200 {
            return Err(PageError::Status(resp.status));
        }
        Ok(serde_json::from_slice(&resp.body)?)
    }
}
