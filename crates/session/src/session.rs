//! The call session state machine
//!
//! One `CallSession` per outbound inquiry call. Events are folded against
//! session state one at a time (the worker guarantees single-writer
//! access); each fold may call the transcription, dialogue, or extraction
//! engines and returns the telephony instructions to issue.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use supplier_voice_config::CallPolicyConfig;
use supplier_voice_core::{
    InquiryContext, Speaker, SupplierFinding, TelephonyInstruction, Turn,
};
use supplier_voice_engines::{prompt, DialogueOutcome, EngineSet};

use crate::event::SessionEvent;
use crate::state::CallState;

/// The complete lifecycle record of one outbound inquiry call
pub struct CallSession {
    call_id: String,
    inquiry: InquiryContext,
    policy: CallPolicyConfig,
    engines: EngineSet,
    history: Vec<Turn>,
    next_sequence: u32,
    state: CallState,
    started_at: DateTime<Utc>,
    extracted: Option<SupplierFinding>,
    failure_reason: Option<String>,
    consumed_recordings: HashSet<String>,
}

impl CallSession {
    /// Create a session in `Initiated`; call `open` to synthesize the
    /// greeting
    pub fn new(
        call_id: impl Into<String>,
        inquiry: InquiryContext,
        policy: CallPolicyConfig,
        engines: EngineSet,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            inquiry,
            policy,
            engines,
            history: Vec::new(),
            next_sequence: 1,
            state: CallState::Initiated,
            started_at: Utc::now(),
            extracted: None,
            failure_reason: None,
            consumed_recordings: HashSet::new(),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn inquiry(&self) -> &InquiryContext {
        &self.inquiry
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finding(&self) -> Option<&SupplierFinding> {
        self.extracted.as_ref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    fn supplier_turns(&self) -> u32 {
        self.history
            .iter()
            .filter(|t| t.speaker == Speaker::Supplier)
            .count() as u32
    }

    fn append_turn(&mut self, speaker: Speaker, text: impl Into<String>) {
        let turn = Turn::new(speaker, text, self.next_sequence);
        self.next_sequence += 1;
        tracing::debug!(
            call_id = %self.call_id,
            speaker = %turn.speaker,
            sequence = turn.sequence,
            "Turn appended"
        );
        self.history.push(turn);
    }

    /// Synthesize the opening utterance and move to waiting for input
    ///
    /// The dialogue engine is asked with an empty history; if it is
    /// unreachable the scripted greeting keeps the dial-out alive.
    pub async fn open(&mut self) -> Vec<TelephonyInstruction> {
        if self.state != CallState::Initiated {
            return Vec::new();
        }
        self.state = CallState::Greeting;

        let greeting = match self.engines.dialogue.next_turn(&self.inquiry, &[]).await {
            Ok(DialogueOutcome::Utterance(text)) => text,
            Ok(DialogueOutcome::Done) | Err(_) => prompt::greeting_utterance(&self.inquiry),
        };

        self.append_turn(Speaker::Agent, greeting.clone());
        self.state = CallState::AwaitingSupplierInput;

        vec![TelephonyInstruction::SpeakThenGather { text: greeting }]
    }

    /// Fold one event against the session
    ///
    /// Duplicate deliveries and events arriving in the wrong state are
    /// acknowledged as no-ops; terminal sessions ignore everything.
    pub async fn handle_event(&mut self, event: SessionEvent) -> Vec<TelephonyInstruction> {
        if self.state.is_terminal() {
            tracing::debug!(
                call_id = %self.call_id,
                event = event.kind(),
                state = %self.state,
                "Event for terminal session acknowledged as no-op"
            );
            return Vec::new();
        }

        match event {
            SessionEvent::CallAnswered => {
                tracing::info!(call_id = %self.call_id, "Call answered");
                Vec::new()
            }

            SessionEvent::RecordingStatus {
                recording_id,
                status,
            } => {
                tracing::debug!(
                    call_id = %self.call_id,
                    recording_id = %recording_id,
                    status = %status,
                    "Recording status"
                );
                Vec::new()
            }

            SessionEvent::RecordingReady {
                recording_id,
                audio,
            } => self.on_recording(recording_id, audio).await,

            SessionEvent::CallEnded => {
                tracing::info!(call_id = %self.call_id, "Provider reports call ended");
                self.run_extraction().await;
                self.state = CallState::Completed;
                Vec::new()
            }

            SessionEvent::ProviderFailed { reason } => {
                tracing::warn!(call_id = %self.call_id, reason = %reason, "Call failed");
                self.failure_reason = Some(reason);
                self.state = CallState::Failed;
                Vec::new()
            }

            SessionEvent::DeadlineElapsed => {
                tracing::info!(call_id = %self.call_id, "Call duration cap reached");
                self.run_extraction().await;
                self.state = CallState::TimedOut;
                vec![
                    TelephonyInstruction::Speak {
                        text: prompt::timeout_utterance(),
                    },
                    TelephonyInstruction::Hangup,
                ]
            }
        }
    }

    async fn on_recording(
        &mut self,
        recording_id: String,
        audio: Vec<u8>,
    ) -> Vec<TelephonyInstruction> {
        if self.state != CallState::AwaitingSupplierInput {
            tracing::debug!(
                call_id = %self.call_id,
                state = %self.state,
                "Recording event outside AwaitingSupplierInput, ignored"
            );
            return Vec::new();
        }
        if !self.consumed_recordings.insert(recording_id.clone()) {
            tracing::debug!(
                call_id = %self.call_id,
                recording_id = %recording_id,
                "Duplicate recording delivery ignored"
            );
            return Vec::new();
        }

        self.state = CallState::Transcribing;
        let transcription = self.engines.transcription.transcribe(&audio).await;

        // Silence and transcription outages become an empty supplier turn;
        // the dialogue engine re-prompts instead of the call failing.
        if transcription.ok {
            self.append_turn(Speaker::Supplier, transcription.text);
        } else {
            self.append_turn(Speaker::Supplier, "");
        }

        self.state = CallState::GeneratingReply;

        if self.supplier_turns() >= self.policy.max_supplier_turns {
            tracing::info!(
                call_id = %self.call_id,
                cap = self.policy.max_supplier_turns,
                "Turn cap reached, forcing extraction"
            );
            return self.finish_call().await;
        }

        match self
            .engines
            .dialogue
            .next_turn(&self.inquiry, &self.history)
            .await
        {
            Ok(DialogueOutcome::Utterance(text)) => self.speak_and_gather(text),
            Ok(DialogueOutcome::Done) => self.finish_call().await,
            Err(e) => {
                // Transient backend outage: substitute the scripted
                // re-prompt rather than failing the call.
                tracing::warn!(call_id = %self.call_id, "Dialogue backend failed: {}", e);
                self.speak_and_gather(prompt::trouble_utterance())
            }
        }
    }

    fn speak_and_gather(&mut self, text: String) -> Vec<TelephonyInstruction> {
        self.append_turn(Speaker::Agent, text.clone());
        self.state = CallState::Speaking;
        let instructions = vec![TelephonyInstruction::SpeakThenGather { text }];
        self.state = CallState::AwaitingSupplierInput;
        instructions
    }

    /// Close out a call whose dialogue is finished
    async fn finish_call(&mut self) -> Vec<TelephonyInstruction> {
        self.run_extraction().await;
        self.state = CallState::Completed;
        vec![
            TelephonyInstruction::Speak {
                text: prompt::closing_utterance(),
            },
            TelephonyInstruction::Hangup,
        ]
    }

    /// Run the extraction engine over the history, exactly once
    ///
    /// The engine contract is total, so this can never leave the session
    /// stuck without a finding.
    async fn run_extraction(&mut self) {
        if self.extracted.is_some() {
            return;
        }
        self.state = CallState::Extracting;
        let finding = self
            .engines
            .extraction
            .extract(&self.inquiry, &self.history)
            .await;
        tracing::info!(
            call_id = %self.call_id,
            availability = %finding.availability,
            "Extraction complete"
        );
        self.extracted = Some(finding);
    }
}
