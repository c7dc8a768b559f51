//! Events delivered into a call session

/// One externally-triggered event for a session
///
/// Webhook events and the timer firing arrive through the same per-session
/// mailbox, so they can never race with an in-flight transition.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The supplier picked up; the greeting TwiML is already running
    CallAnswered,
    /// A recorded supplier response is ready
    RecordingReady {
        /// Provider recording identifier, used for duplicate suppression
        recording_id: String,
        /// Downloaded audio; empty when the download failed
        audio: Vec<u8>,
    },
    /// Recording lifecycle notification, informational only
    RecordingStatus { recording_id: String, status: String },
    /// The provider reports the call finished
    CallEnded,
    /// The provider reports a permanent failure (busy, rejected, no answer)
    ProviderFailed { reason: String },
    /// The call timer fired
    DeadlineElapsed,
}

impl SessionEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::CallAnswered => "call_answered",
            SessionEvent::RecordingReady { .. } => "recording_ready",
            SessionEvent::RecordingStatus { .. } => "recording_status",
            SessionEvent::CallEnded => "call_ended",
            SessionEvent::ProviderFailed { .. } => "provider_failed",
            SessionEvent::DeadlineElapsed => "deadline_elapsed",
        }
    }
}
