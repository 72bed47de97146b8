//! Simulator error types.

use thiserror::Error;

/// A protocol or accounting invariant was breached.
///
/// These are unreachable in a correct build; the invariant harness uses
/// them as its regression signal, and the CLI maps them to exit code 3.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invariant violated at {time_ms}ms: {detail}")]
pub struct InvariantViolation {
    /// Virtual time of the offending dispatch.
    pub time_ms: u64,
    /// Description of the offending state.
    pub detail: String,
}

impl InvariantViolation {
    pub fn new(time_ms: u64, detail: impl Into<String>) -> Self {
        Self {
            time_ms,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_time_and_state() {
        let err = InvariantViolation::new(250, "two nodes inside the CS");
        assert_eq!(
            err.to_string(),
            "invariant violated at 250ms: two nodes inside the CS"
        );
    }
}
