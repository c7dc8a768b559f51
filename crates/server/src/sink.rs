//! Out-of-band instruction delivery
//!
//! Timer-driven instructions have no webhook response to ride on; this sink
//! renders them to TwiML and redirects the live call at the provider.

use async_trait::async_trait;

use supplier_voice_core::TelephonyInstruction;
use supplier_voice_session::{InstructionSink, SessionSnapshot};
use supplier_voice_telephony::{twiml, TelephonyClient};

pub struct RedirectSink {
    telephony: TelephonyClient,
    public_base_url: String,
    record_max_secs: u32,
}

impl RedirectSink {
    pub fn new(telephony: TelephonyClient, public_base_url: String, record_max_secs: u32) -> Self {
        Self {
            telephony,
            public_base_url,
            record_max_secs,
        }
    }
}

#[async_trait]
impl InstructionSink for RedirectSink {
    async fn deliver(&self, snapshot: &SessionSnapshot, instructions: Vec<TelephonyInstruction>) {
        // The provider addresses a live call by the SID it assigned at
        // dial time, not by our call id.
        let Some(sid) = snapshot.provider_sid.as_deref() else {
            tracing::warn!(
                call_id = %snapshot.call_id,
                "No provider SID recorded, dropping out-of-band instructions"
            );
            return;
        };

        let document = twiml::render_instructions(
            &instructions,
            &self.public_base_url,
            &snapshot.call_id,
            self.record_max_secs,
        );

        // The call may already be gone when the redirect lands; that is
        // normal at timeout and not worth more than a warning.
        if let Err(e) = self.telephony.redirect_call(sid, &document).await {
            tracing::warn!(call_id = %snapshot.call_id, call_sid = %sid, "Live-call redirect failed: {}", e);
        }
    }
}
