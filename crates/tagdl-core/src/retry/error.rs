//! Page/asset fetch error type for skip-policy classification.

use thiserror::Error;

/// Error from one page or asset fetch attempt. All variants are retryable
/// under the shared successive-error budget.
#[derive(Debug, Error)]
pub enum PageError {
    /// Connection-level failure (DNS, reset, timeout).
    #[error("connection failed: {0}")]
    Transport(#[from] curl::Error),
    /// Non-success HTTP status.
    #[error("HTTP {0}")]
    Status(u32),
    /// 200 response whose body could not be parsed; treated like transport
    /// corruption rather than a permanent shape mismatch.
    #[error("unreadable response body: {0}")]
    Body(#[from] serde_json::Error),
}
