//! Per-session worker task
//!
//! Each live call gets one tokio task owning its `CallSession` outright.
//! Webhook events and the duration timer are funneled through a single
//! mailbox, which gives single-writer semantics without locks around the
//! state machine. A timer that has already expired takes precedence over
//! any webhook still queued behind it.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

use chrono::{DateTime, Utc};
use supplier_voice_core::{InquiryContext, SupplierFinding, TelephonyInstruction, Turn};

use crate::event::SessionEvent;
use crate::session::CallSession;
use crate::state::CallState;
use crate::timer::CallTimer;
use crate::SessionError;

const MAILBOX_DEPTH: usize = 32;

/// Cheap read-only view of a session, refreshed by its worker
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub call_id: String,
    /// Call SID the provider assigned once dialing succeeded
    pub provider_sid: Option<String>,
    pub inquiry: InquiryContext,
    pub state: CallState,
    pub started_at: DateTime<Utc>,
    pub history: Vec<Turn>,
    pub turn_count: usize,
    pub finding: Option<SupplierFinding>,
    pub failure_reason: Option<String>,
    /// When the session became terminal, for retention cleanup
    pub terminal_at: Option<tokio::time::Instant>,
}

/// Receives instructions the session produced without a webhook to answer
///
/// The timer path has no pending HTTP response, so its instructions are
/// pushed out-of-band (a live-call redirect at the telephony provider).
/// The snapshot carries the provider SID the redirect must address.
#[async_trait]
pub trait InstructionSink: Send + Sync {
    async fn deliver(&self, snapshot: &SessionSnapshot, instructions: Vec<TelephonyInstruction>);
}

struct Envelope {
    event: SessionEvent,
    /// Present for webhook-driven events that owe an HTTP response
    reply: Option<oneshot::Sender<Vec<TelephonyInstruction>>>,
}

/// Client half of one session worker
pub struct SessionHandle {
    call_id: String,
    tx: mpsc::Sender<Envelope>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
}

impl SessionHandle {
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Deliver an event and wait for the instructions it produced
    pub async fn deliver(
        &self,
        event: SessionEvent,
    ) -> Result<Vec<TelephonyInstruction>, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| SessionError::Closed(self.call_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Closed(self.call_id.clone()))
    }

    /// Deliver an event without waiting for instructions
    pub async fn notify(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.tx
            .send(Envelope { event, reply: None })
            .await
            .map_err(|_| SessionError::Closed(self.call_id.clone()))
    }

    /// Record the call SID the provider assigned for this session
    ///
    /// Out-of-band instruction delivery addresses the live call by this
    /// SID, not by the service-side call id.
    pub fn set_provider_sid(&self, sid: impl Into<String>) {
        self.snapshot.write().provider_sid = Some(sid.into());
    }

    /// Current state, history size, and finding without touching the worker
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }
}

/// Start the worker task for a session and return its handle
///
/// The session must already be opened (greeting issued); the worker takes
/// over from the first webhook onward.
pub fn spawn(
    session: CallSession,
    timer: CallTimer,
    sink: Arc<dyn InstructionSink>,
) -> Arc<SessionHandle> {
    let call_id = session.call_id().to_string();
    let (tx, rx) = mpsc::channel(MAILBOX_DEPTH);
    let snapshot = Arc::new(RwLock::new(snapshot_of(&session)));

    let handle = Arc::new(SessionHandle {
        call_id: call_id.clone(),
        tx,
        snapshot: Arc::clone(&snapshot),
    });

    tokio::spawn(run(session, timer, rx, snapshot, sink));

    handle
}

fn snapshot_of(session: &CallSession) -> SessionSnapshot {
    SessionSnapshot {
        call_id: session.call_id().to_string(),
        provider_sid: None,
        inquiry: session.inquiry().clone(),
        state: session.state(),
        started_at: session.started_at(),
        history: session.history().to_vec(),
        turn_count: session.history().len(),
        finding: session.finding().cloned(),
        failure_reason: session.failure_reason().map(str::to_string),
        terminal_at: None,
    }
}

async fn run(
    mut session: CallSession,
    mut timer: CallTimer,
    mut rx: mpsc::Receiver<Envelope>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    sink: Arc<dyn InstructionSink>,
) {
    loop {
        tokio::select! {
            // The timer branch wins ties so an expired deadline is applied
            // before any webhook still queued in the mailbox.
            biased;

            _ = tokio::time::sleep_until(timer.deadline()), if timer.is_armed() => {
                timer.disarm();
                let instructions = session.handle_event(SessionEvent::DeadlineElapsed).await;
                publish(&snapshot, &session, &mut timer);
                if !instructions.is_empty() {
                    let view = snapshot.read().clone();
                    sink.deliver(&view, instructions).await;
                }
            }

            envelope = rx.recv() => {
                let Some(Envelope { event, reply }) = envelope else {
                    break;
                };

                // A webhook that raced past an expired timer is superseded
                // by the timeout transition.
                let event = if timer.expired() {
                    timer.disarm();
                    tracing::debug!(
                        call_id = session.call_id(),
                        superseded = event.kind(),
                        "Deadline elapsed before queued event, applying timeout"
                    );
                    SessionEvent::DeadlineElapsed
                } else {
                    event
                };

                let instructions = session.handle_event(event).await;
                publish(&snapshot, &session, &mut timer);

                if let Some(reply) = reply {
                    // The webhook handler may have given up waiting.
                    let _ = reply.send(instructions);
                } else if !instructions.is_empty() {
                    let view = snapshot.read().clone();
                    sink.deliver(&view, instructions).await;
                }
            }
        }
    }

    tracing::debug!(call_id = session.call_id(), "Session worker stopped");
}

fn publish(snapshot: &RwLock<SessionSnapshot>, session: &CallSession, timer: &mut CallTimer) {
    let mut guard = snapshot.write();
    let was_terminal = guard.terminal_at.is_some();
    guard.state = session.state();
    guard.history = session.history().to_vec();
    guard.turn_count = session.history().len();
    guard.finding = session.finding().cloned();
    guard.failure_reason = session.failure_reason().map(str::to_string);
    if session.state().is_terminal() {
        timer.disarm();
        if !was_terminal {
            guard.terminal_at = Some(tokio::time::Instant::now());
        }
    }
}
