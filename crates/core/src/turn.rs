//! Conversation turn types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The calling agent (synthesized speech)
    Agent,
    /// The supplier on the line (transcribed speech)
    Supplier,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Agent => write!(f, "agent"),
            Speaker::Supplier => write!(f, "supplier"),
        }
    }
}

/// One utterance in a call's conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke
    pub speaker: Speaker,

    /// Utterance content; empty for unintelligible supplier input
    pub text: String,

    /// Position in the conversation, assigned at append time starting at 1
    pub sequence: u32,

    /// When the turn was appended
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn with the given sequence number
    pub fn new(speaker: Speaker, text: impl Into<String>, sequence: u32) -> Self {
        Self {
            speaker,
            text: text.into(),
            sequence,
            timestamp: Utc::now(),
        }
    }

    /// True for supplier turns whose transcription came back empty
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_creation() {
        let turn = Turn::new(Speaker::Agent, "Hello", 1);
        assert_eq!(turn.sequence, 1);
        assert_eq!(turn.speaker, Speaker::Agent);
        assert!(!turn.is_empty());
    }

    #[test]
    fn test_empty_turn() {
        let turn = Turn::new(Speaker::Supplier, "   ", 2);
        assert!(turn.is_empty());
    }

    #[test]
    fn test_speaker_serde() {
        let json = serde_json::to_string(&Speaker::Supplier).unwrap();
        assert_eq!(json, "\"supplier\"");
    }
}
