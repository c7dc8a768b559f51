//! Groq-backed engine implementations
//!
//! Speech-to-text via the audio transcription endpoint, dialogue and
//! extraction via chat completions on the OpenAI-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::{Deserialize, Serialize};

use supplier_voice_config::GroqConfig;
use supplier_voice_core::{Availability, InquiryContext, Speaker, SupplierFinding, Turn};

use crate::contracts::{
    DialogueEngine, DialogueOutcome, ExtractionEngine, Transcription, TranscriptionGateway,
};
use crate::{prompt, EngineError};

/// How many recent turns are sent to the dialogue model
const HISTORY_WINDOW: usize = 10;

/// Chat message in the OpenAI wire format
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Thin client over the Groq HTTP API
#[derive(Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    config: GroqConfig,
}

impl GroqClient {
    pub fn new(config: GroqConfig) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn check_configured(&self) -> Result<(), EngineError> {
        if self.config.api_key.is_empty() {
            return Err(EngineError::NotConfigured("groq.api_key".to_string()));
        }
        Ok(())
    }

    /// Run a non-streaming chat completion and return the reply text
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, EngineError> {
        self.check_configured()?;

        let request = ChatRequest {
            model: self.config.chat_model.clone(),
            messages,
            temperature,
            max_tokens,
            stream: false,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or(EngineError::EmptyCompletion)?;

        if content.is_empty() {
            return Err(EngineError::EmptyCompletion);
        }

        Ok(content)
    }

    /// Transcribe a WAV segment with the configured STT model
    pub async fn transcribe_wav(&self, audio: Vec<u8>) -> Result<String, EngineError> {
        self.check_configured()?;

        let part = multipart::Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.config.stt_model.clone());

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let transcription: TranscriptionResponse = response.json().await?;
        Ok(transcription.text.trim().to_string())
    }
}

/// Whisper-backed transcription gateway
pub struct GroqTranscriptionGateway {
    client: GroqClient,
}

impl GroqTranscriptionGateway {
    pub fn new(client: GroqClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranscriptionGateway for GroqTranscriptionGateway {
    async fn transcribe(&self, audio: &[u8]) -> Transcription {
        if audio.is_empty() {
            return Transcription::empty();
        }

        match self.client.transcribe_wav(audio.to_vec()).await {
            Ok(text) => Transcription::of(text),
            Err(e) => {
                tracing::warn!("Transcription backend failed, treating as silence: {}", e);
                Transcription::empty()
            }
        }
    }
}

/// Chat-completion dialogue engine
pub struct GroqDialogueEngine {
    client: GroqClient,
    temperature: f32,
    reply_max_tokens: u32,
}

impl GroqDialogueEngine {
    pub fn new(client: GroqClient) -> Self {
        let temperature = client.config.temperature;
        let reply_max_tokens = client.config.reply_max_tokens;
        Self {
            client,
            temperature,
            reply_max_tokens,
        }
    }

    fn history_messages(inquiry: &InquiryContext, history: &[Turn]) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: prompt::conversation_prompt(inquiry),
        }];

        let window_start = history.len().saturating_sub(HISTORY_WINDOW);
        for turn in &history[window_start..] {
            messages.push(ChatMessage {
                role: match turn.speaker {
                    Speaker::Agent => "assistant",
                    Speaker::Supplier => "user",
                },
                content: turn.text.clone(),
            });
        }

        messages
    }
}

#[async_trait]
impl DialogueEngine for GroqDialogueEngine {
    async fn next_turn(
        &self,
        inquiry: &InquiryContext,
        history: &[Turn],
    ) -> Result<DialogueOutcome, EngineError> {
        // The opening line is a deterministic template over the request
        // prompt, so a cold backend cannot delay the dial-out.
        if history.is_empty() {
            return Ok(DialogueOutcome::Utterance(prompt::greeting_utterance(
                inquiry,
            )));
        }

        // Silence or unintelligible audio gets a scripted re-prompt.
        if history
            .last()
            .map(|t| t.speaker == Speaker::Supplier && t.is_empty())
            .unwrap_or(false)
        {
            return Ok(DialogueOutcome::Utterance(prompt::clarification_utterance()));
        }

        let messages = Self::history_messages(inquiry, history);
        let reply = self
            .client
            .chat(messages, self.temperature, self.reply_max_tokens)
            .await?;

        if reply.contains(prompt::DONE_MARKER) {
            return Ok(DialogueOutcome::Done);
        }

        Ok(DialogueOutcome::Utterance(reply))
    }
}

/// Chat-completion extraction engine
pub struct GroqExtractionEngine {
    client: GroqClient,
    max_tokens: u32,
}

impl GroqExtractionEngine {
    pub fn new(client: GroqClient) -> Self {
        let max_tokens = client.config.extraction_max_tokens;
        Self { client, max_tokens }
    }
}

#[async_trait]
impl ExtractionEngine for GroqExtractionEngine {
    async fn extract(&self, inquiry: &InquiryContext, history: &[Turn]) -> SupplierFinding {
        let transcript: Vec<&str> = history
            .iter()
            .filter(|t| t.speaker == Speaker::Supplier && !t.is_empty())
            .map(|t| t.text.as_str())
            .collect();

        if transcript.is_empty() {
            return SupplierFinding::unknown();
        }

        let messages = vec![ChatMessage {
            role: "system",
            content: prompt::extraction_prompt(inquiry, &transcript.join(" ")),
        }];

        let raw = match self.client.chat(messages, 0.0, self.max_tokens).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Extraction backend failed: {}", e);
                return SupplierFinding {
                    notes: "Extraction failed".to_string(),
                    ..SupplierFinding::unknown()
                };
            }
        };

        match parse_finding(&raw) {
            Some(finding) => finding,
            None => {
                tracing::error!("Failed to parse extraction output: {}", raw);
                SupplierFinding {
                    notes: "Failed to parse supplier response".to_string(),
                    ..SupplierFinding::unknown()
                }
            }
        }
    }
}

#[derive(Deserialize)]
struct RawFinding {
    available: Option<bool>,
    price: Option<serde_json::Value>,
    #[serde(default)]
    comments: Vec<RawComment>,
}

#[derive(Deserialize)]
struct RawComment {
    #[serde(default)]
    content: Option<String>,
}

/// Parse the extraction model's JSON reply into a finding
///
/// Tolerates markdown fences and surrounding prose; returns None when no
/// JSON object can be recovered.
fn parse_finding(raw: &str) -> Option<SupplierFinding> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let parsed: RawFinding = serde_json::from_str(&raw[start..=end]).ok()?;

    let availability = match parsed.available {
        Some(true) => Availability::Available,
        Some(false) => Availability::Unavailable,
        None => Availability::Unknown,
    };

    let price = match parsed.price {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let notes = parsed
        .comments
        .into_iter()
        .filter_map(|c| c.content)
        .collect::<Vec<_>>()
        .join("; ");

    Some(SupplierFinding {
        availability,
        price,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_finding_full() {
        let raw = r#"{"available": true, "price": 150.5, "comments": [{"type": "note", "content": "Delivery included"}]}"#;
        let finding = parse_finding(raw).unwrap();
        assert_eq!(finding.availability, Availability::Available);
        assert_eq!(finding.price.as_deref(), Some("150.5"));
        assert_eq!(finding.notes, "Delivery included");
    }

    #[test]
    fn test_parse_finding_string_price() {
        let raw = r#"{"available": true, "price": "$200 each", "comments": []}"#;
        let finding = parse_finding(raw).unwrap();
        assert_eq!(finding.price.as_deref(), Some("$200 each"));
    }

    #[test]
    fn test_parse_finding_unavailable() {
        let raw = r#"{"available": false, "price": null, "comments": []}"#;
        let finding = parse_finding(raw).unwrap();
        assert_eq!(finding.availability, Availability::Unavailable);
        assert!(finding.price.is_none());
    }

    #[test]
    fn test_parse_finding_fenced() {
        let raw = "```json\n{\"available\": null, \"price\": null, \"comments\": []}\n```";
        let finding = parse_finding(raw).unwrap();
        assert_eq!(finding.availability, Availability::Unknown);
    }

    #[test]
    fn test_parse_finding_garbage() {
        assert!(parse_finding("no json here").is_none());
    }
}
