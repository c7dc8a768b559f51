//! Call lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one call session
///
/// Transitions are monotonic along the main path, with the dialogue loop
/// `Speaking -> AwaitingSupplierInput` as the only cycle. `Failed` and
/// `TimedOut` are reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    /// Created, not yet greeted
    Initiated,
    /// Synthesizing the opening utterance
    Greeting,
    /// Waiting for the provider to deliver a recorded response
    AwaitingSupplierInput,
    /// Transcribing a recorded response
    Transcribing,
    /// Asking the dialogue engine for the next move
    GeneratingReply,
    /// An agent utterance instruction has been issued
    Speaking,
    /// Reducing the history to a structured finding
    Extracting,
    /// Terminal: finding available
    Completed,
    /// Terminal: unrecoverable provider error
    Failed,
    /// Terminal: wall-clock cap reached
    TimedOut,
}

impl CallState {
    /// Terminal states accept no further events and append no further turns
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallState::Completed | CallState::Failed | CallState::TimedOut
        )
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Initiated => "initiated",
            CallState::Greeting => "greeting",
            CallState::AwaitingSupplierInput => "awaiting_supplier_input",
            CallState::Transcribing => "transcribing",
            CallState::GeneratingReply => "generating_reply",
            CallState::Speaking => "speaking",
            CallState::Extracting => "extracting",
            CallState::Completed => "completed",
            CallState::Failed => "failed",
            CallState::TimedOut => "timed_out",
        };
        write!(f, "{}", name)
    }
}
