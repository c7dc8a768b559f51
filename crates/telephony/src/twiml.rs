//! TwiML rendering
//!
//! Turns the state machine's instruction list into the XML document the
//! provider executes on the live call.

use supplier_voice_core::TelephonyInstruction;

/// Escape text for inclusion in an XML element
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an instruction list to a TwiML document
///
/// `public_base_url` is the externally reachable server address; recording
/// callbacks for `call_id` are routed back through it. `record_max_secs`
/// caps a single supplier utterance.
pub fn render_instructions(
    instructions: &[TelephonyInstruction],
    public_base_url: &str,
    call_id: &str,
    record_max_secs: u32,
) -> String {
    let mut doc = String::from("<Response>");

    for instruction in instructions {
        match instruction {
            TelephonyInstruction::Speak { text } => {
                doc.push_str(&format!("<Say voice=\"alice\">{}</Say>", escape(text)));
            }
            TelephonyInstruction::SpeakThenGather { text } => {
                doc.push_str(&format!("<Say voice=\"alice\">{}</Say>", escape(text)));
                doc.push_str(&format!(
                    "<Record action=\"{base}/telephony/webhook/{call_id}\" method=\"POST\" \
maxLength=\"{max}\" playBeep=\"false\" trim=\"trim-silence\" \
recordingStatusCallback=\"{base}/telephony/recording-status/{call_id}\" \
recordingStatusCallbackMethod=\"POST\"/>",
                    base = public_base_url,
                    call_id = call_id,
                    max = record_max_secs,
                ));
            }
            TelephonyInstruction::Hangup => {
                doc.push_str("<Hangup/>");
            }
        }
    }

    doc.push_str("</Response>");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speak_then_gather() {
        let twiml = render_instructions(
            &[TelephonyInstruction::SpeakThenGather {
                text: "Can you help?".to_string(),
            }],
            "https://example.com",
            "CA123",
            30,
        );

        assert!(twiml.starts_with("<Response>"));
        assert!(twiml.contains("<Say voice=\"alice\">Can you help?</Say>"));
        assert!(twiml.contains("action=\"https://example.com/telephony/webhook/CA123\""));
        assert!(twiml.contains("maxLength=\"30\""));
        assert!(twiml.ends_with("</Response>"));
    }

    #[test]
    fn test_hangup_sequence() {
        let twiml = render_instructions(
            &[
                TelephonyInstruction::Speak {
                    text: "Goodbye".to_string(),
                },
                TelephonyInstruction::Hangup,
            ],
            "https://example.com",
            "CA123",
            30,
        );

        let say = twiml.find("<Say").unwrap();
        let hangup = twiml.find("<Hangup/>").unwrap();
        assert!(say < hangup);
        assert!(!twiml.contains("<Record"));
    }

    #[test]
    fn test_xml_escaping() {
        let twiml = render_instructions(
            &[TelephonyInstruction::Speak {
                text: "Chairs <$200 & tables>".to_string(),
            }],
            "https://example.com",
            "CA123",
            30,
        );

        assert!(twiml.contains("Chairs &lt;$200 &amp; tables&gt;"));
        assert!(!twiml.contains("<$200"));
    }
}
