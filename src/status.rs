//! Structured status reporting for the publish loop.
//!
//! Every cycle ends in a [`CycleOutcome`]. The loop logs it and, when a
//! reporter channel is attached, forwards it as a [`StatusReport`] so callers
//! and tests can observe progress without scraping logs.

use std::fmt;

use crate::{SimError, Topic};

/// Stage at which a cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Broker endpoint lookup failed; nothing was published.
    EndpointResolution,
    /// The publish call failed.
    Publish,
    /// Anything else inside the cycle, e.g. payload encoding.
    Unexpected,
}

impl From<&SimError> for FailureKind {
    fn from(err: &SimError) -> Self {
        // ---
        match err {
            SimError::EndpointResolution(_) => FailureKind::EndpointResolution,
            SimError::Publish(_) => FailureKind::Publish,
            _ => FailureKind::Unexpected,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::EndpointResolution => "endpoint_resolution",
            FailureKind::Publish => "publish",
            FailureKind::Unexpected => "unexpected",
        };
        f.write_str(s)
    }
}

/// Result of a single cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Reading delivered. `total` is the success count including this one.
    Published { topic: Topic, total: u64 },

    /// Cycle failed; the success count is unchanged.
    Failed {
        topic: Topic,
        kind: FailureKind,
        reason: String,
    },
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Published { .. })
    }

    pub fn topic(&self) -> &Topic {
        match self {
            CycleOutcome::Published { topic, .. } | CycleOutcome::Failed { topic, .. } => topic,
        }
    }
}

/// Counters accumulated over one loop run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles attempted.
    pub cycles: u64,
    /// Cycles whose reading was delivered.
    pub successes: u64,
    /// Cycles that failed at any stage. Always `cycles - successes`.
    pub failures: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} messages published ({} cycles, {} failed)",
            self.successes, self.cycles, self.failures
        )
    }
}

/// Event forwarded on the optional status channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    /// One cycle finished. `cycle` is 1-based.
    Cycle { cycle: u64, outcome: CycleOutcome },

    /// The loop stopped; final counters.
    Stopped(RunSummary),
}
