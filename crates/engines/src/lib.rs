//! Engine contracts and backends
//!
//! The state machine depends on three pluggable capabilities:
//! - Transcription gateway (audio -> text)
//! - Dialogue engine (history -> next utterance or completion)
//! - Extraction engine (history -> structured supplier finding)
//!
//! The Groq-backed implementations live in `groq`; any implementation
//! satisfying the contracts is substitutable.

pub mod contracts;
pub mod groq;
pub mod prompt;

pub use contracts::{
    DialogueEngine, DialogueOutcome, EngineSet, ExtractionEngine, Transcription,
    TranscriptionGateway,
};
pub use groq::{GroqClient, GroqDialogueEngine, GroqExtractionEngine, GroqTranscriptionGateway};

use thiserror::Error;

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Backend returned an empty completion")]
    EmptyCompletion,

    #[error("Backend is not configured: {0}")]
    NotConfigured(String),
}
