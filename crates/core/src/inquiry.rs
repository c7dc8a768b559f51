//! Inquiry context fixed at call creation

use serde::{Deserialize, Serialize};

/// The immutable subject of an outbound inquiry call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryContext {
    /// Supplier phone number in E.164 format
    pub phone_number: String,

    /// Free-text description of what is being asked: product, quantity,
    /// delivery constraints
    pub request_prompt: String,
}

impl InquiryContext {
    pub fn new(phone_number: impl Into<String>, request_prompt: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            request_prompt: request_prompt.into(),
        }
    }
}
