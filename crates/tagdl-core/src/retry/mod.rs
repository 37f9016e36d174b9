//! Retry-then-skip policy for page and asset fetches.
//!
//! Transport failures and bad status codes share one successive-error
//! budget. When the budget is exhausted the current page (or asset) is
//! abandoned and processing moves on — losing one page is preferred over
//! stalling the whole run. The counter lives in the fetch loop as local
//! state, modeled here as an explicit state machine so the contract is
//! testable without a network.

mod error;
mod state;

pub use error::PageError;
pub use state::{FetchState, SkipPolicy};
