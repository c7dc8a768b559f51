//! End-to-end session flows through the registry and worker

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use supplier_voice_config::CallPolicyConfig;
use supplier_voice_core::{
    Availability, InquiryContext, Speaker, SupplierFinding, TelephonyInstruction, Turn,
};
use supplier_voice_engines::{
    DialogueEngine, DialogueOutcome, EngineError, EngineSet, ExtractionEngine, Transcription,
    TranscriptionGateway,
};
use supplier_voice_session::{
    CallState, InstructionSink, SessionEvent, SessionRegistry, SessionSnapshot,
};

struct Utf8Transcription;

#[async_trait]
impl TranscriptionGateway for Utf8Transcription {
    async fn transcribe(&self, audio: &[u8]) -> Transcription {
        match std::str::from_utf8(audio) {
            Ok(text) => Transcription::of(text),
            Err(_) => Transcription::empty(),
        }
    }
}

struct ScriptedDialogue {
    outcomes: Mutex<VecDeque<Result<DialogueOutcome, EngineError>>>,
}

impl ScriptedDialogue {
    fn new(outcomes: Vec<Result<DialogueOutcome, EngineError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
        }
    }
}

#[async_trait]
impl DialogueEngine for ScriptedDialogue {
    async fn next_turn(
        &self,
        _inquiry: &InquiryContext,
        _history: &[Turn],
    ) -> Result<DialogueOutcome, EngineError> {
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or(Ok(DialogueOutcome::Done))
    }
}

/// Flags availability when any supplier turn says "yes"
struct KeywordExtraction;

#[async_trait]
impl ExtractionEngine for KeywordExtraction {
    async fn extract(&self, _inquiry: &InquiryContext, history: &[Turn]) -> SupplierFinding {
        let said_yes = history
            .iter()
            .filter(|t| t.speaker == Speaker::Supplier)
            .any(|t| t.text.to_lowercase().contains("yes"));
        if said_yes {
            SupplierFinding {
                availability: Availability::Available,
                price: Some("$120".to_string()),
                notes: "supplier confirmed stock".to_string(),
            }
        } else {
            SupplierFinding::unknown()
        }
    }
}

#[derive(Default)]
struct CapturingSink {
    delivered: Mutex<Vec<(String, Vec<TelephonyInstruction>)>>,
}

#[async_trait]
impl InstructionSink for CapturingSink {
    async fn deliver(&self, snapshot: &SessionSnapshot, instructions: Vec<TelephonyInstruction>) {
        self.delivered
            .lock()
            .push((snapshot.call_id.clone(), instructions));
    }
}

fn registry(
    dialogue: ScriptedDialogue,
    policy: CallPolicyConfig,
    sink: Arc<CapturingSink>,
) -> Arc<SessionRegistry> {
    Arc::new(SessionRegistry::new(
        EngineSet {
            transcription: Arc::new(Utf8Transcription),
            dialogue: Arc::new(dialogue),
            extraction: Arc::new(KeywordExtraction),
        },
        policy,
        sink,
    ))
}

fn recording(id: &str, text: &str) -> SessionEvent {
    SessionEvent::RecordingReady {
        recording_id: id.to_string(),
        audio: text.as_bytes().to_vec(),
    }
}

#[tokio::test]
async fn test_happy_path_inquiry_to_finding() {
    let sink = Arc::new(CapturingSink::default());
    let registry = registry(
        ScriptedDialogue::new(vec![
            Ok(DialogueOutcome::Utterance(
                "Hello, do you stock 50 office chairs?".to_string(),
            )),
            Ok(DialogueOutcome::Utterance("What do they cost?".to_string())),
            Ok(DialogueOutcome::Done),
        ]),
        CallPolicyConfig::default(),
        Arc::clone(&sink),
    );

    let (handle, greeting) = registry
        .open_session("CA-happy", InquiryContext::new("+155500", "50 office chairs"))
        .await;
    assert!(matches!(
        &greeting[0],
        TelephonyInstruction::SpeakThenGather { text } if text.contains("chairs")
    ));

    handle.deliver(SessionEvent::CallAnswered).await.unwrap();

    let reply = handle
        .deliver(recording("RE1", "Yes we have those in stock"))
        .await
        .unwrap();
    assert!(matches!(
        &reply[0],
        TelephonyInstruction::SpeakThenGather { text } if text.contains("cost")
    ));

    let closing = handle
        .deliver(recording("RE2", "They are 120 dollars each"))
        .await
        .unwrap();
    assert!(matches!(closing.last(), Some(TelephonyInstruction::Hangup)));

    let snap = handle.snapshot();
    assert_eq!(snap.state, CallState::Completed);
    let finding = snap.finding.expect("finding after completion");
    assert_eq!(finding.availability, Availability::Available);
    assert_eq!(finding.price.as_deref(), Some("$120"));

    // greeting + supplier + question + supplier
    assert_eq!(snap.turn_count, 4);

    // Late provider status webhook is acknowledged without effect.
    let late = handle.deliver(SessionEvent::CallEnded).await.unwrap();
    assert!(late.is_empty());
    assert_eq!(handle.snapshot().state, CallState::Completed);
}

#[tokio::test]
async fn test_unintelligible_response_recovers() {
    let sink = Arc::new(CapturingSink::default());
    let registry = registry(
        ScriptedDialogue::new(vec![
            Ok(DialogueOutcome::Utterance("Hello, quick question.".to_string())),
            Ok(DialogueOutcome::Utterance(
                "I didn't catch that. Could you please repeat?".to_string(),
            )),
            Ok(DialogueOutcome::Done),
        ]),
        CallPolicyConfig::default(),
        Arc::clone(&sink),
    );

    let (handle, _) = registry
        .open_session("CA-garbled", InquiryContext::new("+155501", "bolt cutters"))
        .await;

    let reprompt = handle
        .deliver(SessionEvent::RecordingReady {
            recording_id: "RE1".to_string(),
            audio: vec![0xFF, 0xFE, 0x00],
        })
        .await
        .unwrap();
    assert!(matches!(
        &reprompt[0],
        TelephonyInstruction::SpeakThenGather { text } if text.contains("repeat")
    ));
    assert_eq!(handle.snapshot().state, CallState::AwaitingSupplierInput);

    let closing = handle
        .deliver(recording("RE2", "Sorry, yes we carry them"))
        .await
        .unwrap();
    assert!(matches!(closing.last(), Some(TelephonyInstruction::Hangup)));
    assert_eq!(handle.snapshot().state, CallState::Completed);
}

#[tokio::test]
async fn test_duplicate_webhooks_do_not_advance_dialogue() {
    let sink = Arc::new(CapturingSink::default());
    let registry = registry(
        ScriptedDialogue::new(vec![
            Ok(DialogueOutcome::Utterance("Hello.".to_string())),
            Ok(DialogueOutcome::Utterance("Second question?".to_string())),
            Ok(DialogueOutcome::Utterance("Third question?".to_string())),
        ]),
        CallPolicyConfig::default(),
        Arc::clone(&sink),
    );

    let (handle, _) = registry
        .open_session("CA-dup", InquiryContext::new("+155502", "ring binders"))
        .await;

    handle.deliver(recording("RE1", "yes")).await.unwrap();
    let before = handle.snapshot();

    // Same recording id redelivered twice.
    for _ in 0..2 {
        let dup = handle.deliver(recording("RE1", "yes")).await.unwrap();
        assert!(dup.is_empty());
    }

    let after = handle.snapshot();
    assert_eq!(after.turn_count, before.turn_count);
    assert_eq!(after.state, CallState::AwaitingSupplierInput);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_mid_call_still_extracts() {
    let mut policy = CallPolicyConfig::default();
    policy.max_duration_secs = 120;

    let sink = Arc::new(CapturingSink::default());
    let registry = registry(
        ScriptedDialogue::new(vec![
            Ok(DialogueOutcome::Utterance("Hello.".to_string())),
            Ok(DialogueOutcome::Utterance("And your lead time?".to_string())),
        ]),
        policy,
        Arc::clone(&sink),
    );

    let (handle, _) = registry
        .open_session("CA-slow", InquiryContext::new("+155503", "steel beams"))
        .await;

    handle.deliver(recording("RE1", "Yes, we roll those")).await.unwrap();

    tokio::time::advance(Duration::from_secs(121)).await;
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    let snap = handle.snapshot();
    assert_eq!(snap.state, CallState::TimedOut);
    // The partial transcript still produced a finding.
    assert_eq!(
        snap.finding.expect("finding after timeout").availability,
        Availability::Available
    );

    let delivered = sink.delivered.lock();
    let (call_id, instructions) = &delivered[0];
    assert_eq!(call_id, "CA-slow");
    assert!(matches!(
        &instructions[0],
        TelephonyInstruction::Speak { text } if text.contains("end this call")
    ));
    assert!(matches!(instructions.last(), Some(TelephonyInstruction::Hangup)));
}

#[tokio::test]
async fn test_provider_failure_is_terminal_without_finding() {
    let sink = Arc::new(CapturingSink::default());
    let registry = registry(
        ScriptedDialogue::new(vec![Ok(DialogueOutcome::Utterance("Hello.".to_string()))]),
        CallPolicyConfig::default(),
        Arc::clone(&sink),
    );

    let (handle, _) = registry
        .open_session("CA-busy", InquiryContext::new("+155504", "anything"))
        .await;

    handle
        .deliver(SessionEvent::ProviderFailed {
            reason: "busy".to_string(),
        })
        .await
        .unwrap();

    let snap = handle.snapshot();
    assert_eq!(snap.state, CallState::Failed);
    assert!(snap.finding.is_none());
    assert_eq!(snap.failure_reason.as_deref(), Some("busy"));
}
