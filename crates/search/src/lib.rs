//! Supplier web search
//!
//! Generates localized supplier queries, runs them against a SERP API, and
//! distills the raw hits into deduplicated supplier leads with extracted
//! contact details.

pub mod lead;
pub mod orchestrator;
pub mod query;
pub mod serp;

pub use lead::SupplierLead;
pub use orchestrator::{SearchOrchestrator, SearchOutcome, SupplierSearchRequest};
pub use query::SearchStrategy;
pub use serp::{SerpClient, SerpHit};

use thiserror::Error;

/// Search errors
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SERP API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("SERP API key is not configured")]
    NotConfigured,
}
