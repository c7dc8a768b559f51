//! Capability contracts the call session depends on

use async_trait::async_trait;
use std::sync::Arc;

use supplier_voice_core::{InquiryContext, SupplierFinding, Turn};

use crate::EngineError;

/// Result of transcribing one recorded supplier utterance
#[derive(Debug, Clone)]
pub struct Transcription {
    /// Transcribed text, empty when nothing intelligible was heard
    pub text: String,

    /// False for silence, noise, or a transcription backend outage
    pub ok: bool,
}

impl Transcription {
    /// A transcription carrying text; `ok` reflects whether it is non-empty
    pub fn of(text: impl Into<String>) -> Self {
        let text = text.into();
        let ok = !text.trim().is_empty();
        Self { text, ok }
    }

    /// The empty transcription used for silence and backend failures
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            ok: false,
        }
    }
}

/// Converts a recorded audio segment into text
///
/// Total: unintelligible input and backend outages yield `ok = false`,
/// never an error.
#[async_trait]
pub trait TranscriptionGateway: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Transcription;
}

/// What the dialogue engine decided to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueOutcome {
    /// Speak this utterance and gather the supplier's response
    Utterance(String),
    /// Enough information has been gathered; stop asking
    Done,
}

/// Produces the next spoken turn, or signals that the inquiry is complete
///
/// Depends only on the inquiry context and the history passed in; holds no
/// state across calls.
#[async_trait]
pub trait DialogueEngine: Send + Sync {
    async fn next_turn(
        &self,
        inquiry: &InquiryContext,
        history: &[Turn],
    ) -> Result<DialogueOutcome, EngineError>;
}

/// Reduces a full conversation history to a structured finding
///
/// Total: always returns a finding, defaulting unresolved fields to
/// unknown rather than failing.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    async fn extract(&self, inquiry: &InquiryContext, history: &[Turn]) -> SupplierFinding;
}

/// The three stateless engines a session draws on
#[derive(Clone)]
pub struct EngineSet {
    pub transcription: Arc<dyn TranscriptionGateway>,
    pub dialogue: Arc<dyn DialogueEngine>,
    pub extraction: Arc<dyn ExtractionEngine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_flags() {
        assert!(Transcription::of("Yes, we have chairs").ok);
        assert!(!Transcription::of("   ").ok);
        assert!(!Transcription::empty().ok);
    }
}
