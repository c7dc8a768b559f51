//! Call session state machine
//!
//! Owns one outbound inquiry call from creation through termination:
//! - `CallSession`: the event-sourced state machine itself
//! - `CallTimer`: the hard wall-clock cap per call
//! - Per-session worker: single-writer serialization of webhook and timer
//!   events
//! - `SessionRegistry`: the keyed map of live sessions

pub mod event;
pub mod registry;
pub mod session;
pub mod state;
pub mod timer;
pub mod worker;

pub use event::SessionEvent;
pub use registry::SessionRegistry;
pub use session::CallSession;
pub use state::CallState;
pub use timer::CallTimer;
pub use worker::{InstructionSink, SessionHandle, SessionSnapshot};

use thiserror::Error;

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session worker for {0} is gone")]
    Closed(String),
}
