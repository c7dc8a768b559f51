//! Instructions the state machine issues to the telephony layer

use serde::{Deserialize, Serialize};

/// One step the telephony provider should perform on the live call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelephonyInstruction {
    /// Speak the text, then record the supplier's response
    SpeakThenGather { text: String },
    /// Speak the text without gathering a response
    Speak { text: String },
    /// Terminate the call
    Hangup,
}

impl TelephonyInstruction {
    /// The spoken text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            TelephonyInstruction::SpeakThenGather { text }
            | TelephonyInstruction::Speak { text } => Some(text),
            TelephonyInstruction::Hangup => None,
        }
    }
}
