//! Telephony provider integration
//!
//! Wraps the provider's REST API (dialing, mid-call redirects, recording
//! download), renders instruction lists to TwiML, and models the webhook
//! payloads the provider posts back.

pub mod client;
pub mod twiml;
pub mod webhook;

pub use client::{DialOutcome, TelephonyClient};
pub use twiml::render_instructions;
pub use webhook::{webhook_event, RecordingCallback, StatusCallback, StatusKind};

use thiserror::Error;

/// Telephony errors
///
/// `Rejected` is permanent (invalid number, call refused); everything else
/// is treated as transient.
#[derive(Error, Debug)]
pub enum TelephonyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Provider unavailable ({status}): {body}")]
    Unavailable { status: u16, body: String },

    #[error("Provider is not configured: {0}")]
    NotConfigured(String),
}
