//! Webhook payloads posted by the provider

use serde::Deserialize;

/// Call status callback payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusCallback {
    pub call_sid: String,
    pub call_status: String,
}

/// Recording-ready callback payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordingCallback {
    pub call_sid: String,
    #[serde(default)]
    pub recording_sid: Option<String>,
    #[serde(default)]
    pub recording_url: Option<String>,
    #[serde(default)]
    pub recording_duration: Option<String>,
    #[serde(default)]
    pub recording_status: Option<String>,
}

/// What a provider call status means for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// The supplier picked up
    Answered,
    /// The call finished normally
    Ended,
    /// The call could not be completed; permanent
    Failed,
    /// Intermediate status with no session-level meaning
    Ignorable,
}

/// Map a provider call status string to its session-level meaning
pub fn webhook_event(call_status: &str) -> StatusKind {
    match call_status {
        "in-progress" | "answered" => StatusKind::Answered,
        "completed" | "canceled" => StatusKind::Ended,
        "busy" | "failed" | "no-answer" => StatusKind::Failed,
        _ => StatusKind::Ignorable,
    }
}
