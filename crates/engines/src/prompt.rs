//! Prompt construction and scripted utterances
//!
//! The scripted lines double as fallbacks when the dialogue backend is
//! unreachable, so a transient outage never fails the call.

use supplier_voice_core::InquiryContext;

/// Marker the dialogue model emits once availability and price are settled
pub const DONE_MARKER: &str = "[DONE]";

/// System prompt for the supplier inquiry conversation
pub fn conversation_prompt(inquiry: &InquiryContext) -> String {
    format!(
        "You are an AI assistant calling a supplier to gather specific information \
about a product or service request.

REQUEST DETAILS: {request}

YOUR GOALS:
1. FIRST PRIORITY: Determine if the supplier can provide the requested \
product/service in the specified amount, date, and location.
   - If they CANNOT provide it, politely thank them and reply with {done}.
   - If they CAN provide it, proceed to the price inquiry.
2. SECOND PRIORITY: Get the exact price for the requested product/service, \
including any additional costs, for the quantity and specifications in the request.
3. ADDITIONAL INFORMATION: Note any other relevant details the supplier offers.

CONVERSATION GUIDELINES:
- Be professional, polite, and concise.
- Use clear, direct questions.
- Keep every reply short enough to speak in under 30 seconds.
- Once you have both availability and price, reply with exactly {done}.",
        request = inquiry.request_prompt,
        done = DONE_MARKER,
    )
}

/// Opening utterance for a new call, synthesized from the request prompt
pub fn greeting_utterance(inquiry: &InquiryContext) -> String {
    format!(
        "Hello! I'm calling regarding a product or service inquiry. \
I have a request for: {}. Can you help me with this?",
        inquiry.request_prompt
    )
}

/// Re-prompt after silence or unintelligible audio
pub fn clarification_utterance() -> String {
    "I didn't catch that. Could you please repeat?".to_string()
}

/// Fallback when the dialogue backend is unreachable mid-call
pub fn trouble_utterance() -> String {
    "I'm sorry, I'm having trouble processing that. Could you please repeat?".to_string()
}

/// Polite closing before hanging up
pub fn closing_utterance() -> String {
    "Thank you for your time. Have a great day!".to_string()
}

/// Closing used when the call hits its duration cap
pub fn timeout_utterance() -> String {
    "Thank you for your time. I need to end this call now. Have a great day!".to_string()
}

/// Extraction prompt over the supplier side of the transcript
pub fn extraction_prompt(inquiry: &InquiryContext, transcript: &str) -> String {
    format!(
        "You are analyzing a conversation with a supplier about this request: {request}

CONVERSATION TRANSCRIPT: {transcript}

Extract the following information and respond ONLY with a JSON object:
{{
    \"available\": true/false/null (whether supplier can provide the service/product),
    \"price\": decimal or string or null (exact price, e.g. 150.50 or \"$200 each\"),
    \"comments\": [
        {{\"type\": \"string\", \"content\": \"string\"}}
    ] (any additional relevant information)
}}

RULES:
- If the supplier clearly says they CANNOT provide the service, set available to false.
- If the supplier says they CAN provide it, set available to true.
- Extract the exact price including currency if mentioned.
- Put any other relevant details in comments.
- If information is unclear, use null values.",
        request = inquiry.request_prompt,
        transcript = transcript,
    )
}
