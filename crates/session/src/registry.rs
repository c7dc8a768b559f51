//! Registry of live call sessions
//!
//! Keyed by call id; the registry creates the session, issues its greeting,
//! and hands the state machine to a dedicated worker. Terminal sessions are
//! retained for a grace window so late status webhooks and readout requests
//! still resolve, then reaped by the cleanup task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;

use supplier_voice_config::CallPolicyConfig;
use supplier_voice_core::{InquiryContext, TelephonyInstruction};
use supplier_voice_engines::EngineSet;

use crate::session::CallSession;
use crate::timer::CallTimer;
use crate::worker::{self, InstructionSink, SessionHandle, SessionSnapshot};

/// Owns every live call session
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
    engines: EngineSet,
    policy: CallPolicyConfig,
    sink: Arc<dyn InstructionSink>,
    cleanup_interval: Duration,
}

impl SessionRegistry {
    pub fn new(
        engines: EngineSet,
        policy: CallPolicyConfig,
        sink: Arc<dyn InstructionSink>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            engines,
            policy,
            sink,
            cleanup_interval: Duration::from_secs(30),
        }
    }

    /// Create a session, issue its greeting, and start its worker
    ///
    /// Returns the instructions for the opening utterance. Registering an
    /// id that is already live returns the existing handle and no
    /// instructions, so a retried create request does not greet twice.
    pub async fn open_session(
        &self,
        call_id: &str,
        inquiry: InquiryContext,
    ) -> (Arc<SessionHandle>, Vec<TelephonyInstruction>) {
        if let Some(existing) = self.get(call_id) {
            tracing::debug!(call_id, "Session already registered");
            return (existing, Vec::new());
        }

        let mut session = CallSession::new(
            call_id,
            inquiry,
            self.policy.clone(),
            self.engines.clone(),
        );
        let instructions = session.open().await;
        let timer = CallTimer::new(Duration::from_secs(self.policy.max_duration_secs));
        let handle = worker::spawn(session, timer, Arc::clone(&self.sink));

        let mut sessions = self.sessions.write();
        // A concurrent registration of the same id wins; drop ours.
        let handle = sessions
            .entry(call_id.to_string())
            .or_insert_with(|| Arc::clone(&handle))
            .clone();
        drop(sessions);

        tracing::info!(call_id, "Call session registered");
        (handle, instructions)
    }

    /// Look up a live session
    pub fn get(&self, call_id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.read().get(call_id).cloned()
    }

    /// Remove a session; dropping the handle stops its worker
    pub fn remove(&self, call_id: &str) {
        if self.sessions.write().remove(call_id).is_some() {
            tracing::info!(call_id, "Call session removed");
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Reap sessions that have been terminal longer than the retention
    /// window
    pub fn cleanup_expired(&self) {
        let retention = Duration::from_secs(self.policy.terminal_retention_secs);
        let now = tokio::time::Instant::now();

        let expired: Vec<String> = {
            let sessions = self.sessions.read();
            sessions
                .iter()
                .filter(|(_, handle)| {
                    handle
                        .snapshot()
                        .terminal_at
                        .is_some_and(|at| now.duration_since(at) >= retention)
                })
                .map(|(id, _)| id.clone())
                .collect()
        };

        if expired.is_empty() {
            return;
        }

        let mut sessions = self.sessions.write();
        for id in expired {
            sessions.remove(&id);
            tracing::info!(call_id = %id, "Terminal session reaped");
        }
    }

    /// Start the periodic reaper; returns its shutdown switch
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let registry = Arc::clone(self);
        let interval = registry.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let before = registry.count();
                        registry.cleanup_expired();
                        let after = registry.count();
                        if before != after {
                            tracing::info!(
                                "Session cleanup: reaped {} sessions ({} remaining)",
                                before - after,
                                after
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SessionEvent;
    use crate::state::CallState;
    use async_trait::async_trait;
    use supplier_voice_core::{SupplierFinding, Turn};
    use supplier_voice_engines::{
        DialogueEngine, DialogueOutcome, EngineError, ExtractionEngine, Transcription,
        TranscriptionGateway,
    };

    struct NullTranscription;

    #[async_trait]
    impl TranscriptionGateway for NullTranscription {
        async fn transcribe(&self, _audio: &[u8]) -> Transcription {
            Transcription::empty()
        }
    }

    struct GreetOnly;

    #[async_trait]
    impl DialogueEngine for GreetOnly {
        async fn next_turn(
            &self,
            _inquiry: &InquiryContext,
            history: &[Turn],
        ) -> Result<DialogueOutcome, EngineError> {
            if history.is_empty() {
                Ok(DialogueOutcome::Utterance("Hello, can you help?".to_string()))
            } else {
                Ok(DialogueOutcome::Done)
            }
        }
    }

    struct UnknownExtraction;

    #[async_trait]
    impl ExtractionEngine for UnknownExtraction {
        async fn extract(&self, _inquiry: &InquiryContext, _history: &[Turn]) -> SupplierFinding {
            SupplierFinding::unknown()
        }
    }

    struct NullSink;

    #[async_trait]
    impl InstructionSink for NullSink {
        async fn deliver(&self, _snapshot: &SessionSnapshot, _instructions: Vec<TelephonyInstruction>) {}
    }

    fn registry(policy: CallPolicyConfig) -> Arc<SessionRegistry> {
        Arc::new(SessionRegistry::new(
            EngineSet {
                transcription: Arc::new(NullTranscription),
                dialogue: Arc::new(GreetOnly),
                extraction: Arc::new(UnknownExtraction),
            },
            policy,
            Arc::new(NullSink),
        ))
    }

    fn inquiry() -> InquiryContext {
        InquiryContext::new("+15550003333", "pallet jacks")
    }

    #[tokio::test]
    async fn test_open_session_greets_once() {
        let registry = registry(CallPolicyConfig::default());

        let (_, first) = registry.open_session("CA1", inquiry()).await;
        assert_eq!(first.len(), 1);
        assert_eq!(registry.count(), 1);

        let (_, second) = registry.open_session("CA1", inquiry()).await;
        assert!(second.is_empty());
        assert_eq!(registry.count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_and_remove() {
        let registry = registry(CallPolicyConfig::default());
        registry.open_session("CA1", inquiry()).await;

        assert!(registry.get("CA1").is_some());
        assert!(registry.get("CA2").is_none());

        registry.remove("CA1");
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_reaps_only_expired_terminals() {
        let mut policy = CallPolicyConfig::default();
        policy.terminal_retention_secs = 60;
        let registry = registry(policy);

        let (done, _) = registry.open_session("CA-done", inquiry()).await;
        registry.open_session("CA-live", inquiry()).await;
        done.deliver(SessionEvent::CallEnded).await.unwrap();
        assert_eq!(done.snapshot().state, CallState::Completed);

        registry.cleanup_expired();
        assert_eq!(registry.count(), 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        registry.cleanup_expired();
        assert_eq!(registry.count(), 1);
        assert!(registry.get("CA-live").is_some());
        assert!(registry.get("CA-done").is_none());
    }
}
