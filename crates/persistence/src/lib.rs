//! ScyllaDB persistence layer
//!
//! Provides persistent storage for:
//! - Call logs (transcript, terminal state, extracted finding)
//! - Supplier search sessions

pub mod call_log;
pub mod client;
pub mod error;
pub mod schema;
pub mod search_log;

pub use call_log::{CallLogStore, CallRecord, ScyllaCallLogStore};
pub use client::{ScyllaClient, ScyllaConfig};
pub use error::PersistenceError;
pub use search_log::{ScyllaSearchLogStore, SearchLogStore, SearchRecord};

/// Combined persistence layer
pub struct PersistenceLayer {
    pub calls: ScyllaCallLogStore,
    pub searches: ScyllaSearchLogStore,
}

/// Connect, ensure the schema, and hand back the stores
pub async fn init(config: ScyllaConfig) -> Result<PersistenceLayer, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    Ok(PersistenceLayer {
        calls: ScyllaCallLogStore::new(client.clone()),
        searches: ScyllaSearchLogStore::new(client),
    })
}
