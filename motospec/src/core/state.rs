//! Worker lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a worker is in its run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Waiting for the next input item.
    #[default]
    Idle,
    /// Running the stage on an item.
    Processing,
    /// Input exhausted, tearing down owned resources.
    Draining,
    /// Fully terminated.
    Closed,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Processing => write!(f, "processing"),
            Self::Draining => write!(f, "draining"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Why a worker's run loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Upstream closed the input channel.
    InputExhausted,
    /// The shared cancellation token fired.
    Cancelled,
    /// Downstream stopped accepting items.
    DownstreamClosed,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputExhausted => write!(f, "input exhausted"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::DownstreamClosed => write!(f, "downstream closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display_and_default() {
        assert_eq!(WorkerState::default(), WorkerState::Idle);
        assert_eq!(WorkerState::Draining.to_string(), "draining");
        assert_eq!(ExitReason::DownstreamClosed.to_string(), "downstream closed");
    }

    #[test]
    fn test_exit_reason_serde() {
        let json = serde_json::to_string(&ExitReason::InputExhausted).unwrap();
        assert_eq!(json, "\"input_exhausted\"");
    }
}
