//! Core types for the supplier inquiry voice agent
//!
//! This crate provides the domain types shared across all other crates:
//! - Conversation turns
//! - Structured supplier findings
//! - The immutable inquiry context of a call
//! - Instructions emitted toward the telephony layer

pub mod finding;
pub mod inquiry;
pub mod instruction;
pub mod turn;

pub use finding::{Availability, SupplierFinding};
pub use inquiry::InquiryContext;
pub use instruction::TelephonyInstruction;
pub use turn::{Speaker, Turn};
