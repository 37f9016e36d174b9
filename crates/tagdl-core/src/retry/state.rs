//! Fetch state machine: Fetching → Retrying(n) → Skipped.

/// Where one page (or asset) fetch currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// No failures yet for the current target.
    Fetching,
    /// `n` successive failures so far; the same target is re-requested.
    Retrying(u32),
    /// Error budget exhausted; the target is abandoned.
    Skipped,
}

impl FetchState {
    /// Successive failures recorded so far.
    pub fn failures(self) -> u32 {
        match self {
            FetchState::Fetching => 0,
            FetchState::Retrying(n) => n,
            FetchState::Skipped => 0,
        }
    }
}

/// Successive-error limit shared by transport and status failures.
/// The counter resets on any success and on any skip decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipPolicy {
    /// Failures tolerated before the target is skipped.
    pub successive_error_limit: u32,
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self {
            successive_error_limit: 5,
        }
    }
}

impl SkipPolicy {
    pub fn new(successive_error_limit: u32) -> Self {
        Self {
            successive_error_limit,
        }
    }

    /// Advances the state machine after one failed attempt.
    pub fn on_error(self, state: FetchState) -> FetchState {
        let failures = state.failures() + 1;
        if failures >= self.successive_error_limit {
            FetchState::Skipped
        } else {
            FetchState::Retrying(failures)
        }
    }
}
