//! Call log persistence using ScyllaDB

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplier_voice_core::{SupplierFinding, Turn};

use crate::{PersistenceError, ScyllaClient};

/// One finished call, as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: String,
    pub phone_number: String,
    pub request_prompt: String,
    pub final_state: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub history_json: String,
    pub finding_json: Option<String>,
    pub failure_reason: Option<String>,
}

impl CallRecord {
    /// Serialize the transcript and finding into a storable record
    pub fn build(
        call_id: &str,
        phone_number: &str,
        request_prompt: &str,
        final_state: &str,
        started_at: DateTime<Utc>,
        history: &[Turn],
        finding: Option<&SupplierFinding>,
        failure_reason: Option<&str>,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            call_id: call_id.to_string(),
            phone_number: phone_number.to_string(),
            request_prompt: request_prompt.to_string(),
            final_state: final_state.to_string(),
            started_at,
            ended_at: Utc::now(),
            history_json: serde_json::to_string(history)?,
            finding_json: finding.map(serde_json::to_string).transpose()?,
            failure_reason: failure_reason.map(str::to_string),
        })
    }
}

/// Call log store trait for abstraction
#[async_trait]
pub trait CallLogStore: Send + Sync {
    async fn record(&self, call: &CallRecord) -> Result<(), PersistenceError>;
    async fn get(&self, call_id: &str) -> Result<Option<CallRecord>, PersistenceError>;
    async fn list_recent(&self, limit: i32) -> Result<Vec<CallRecord>, PersistenceError>;
}

/// ScyllaDB implementation of the call log store
#[derive(Clone)]
pub struct ScyllaCallLogStore {
    client: ScyllaClient,
}

impl ScyllaCallLogStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

type CallRow = (
    String,
    String,
    String,
    String,
    i64,
    i64,
    String,
    Option<String>,
    Option<String>,
);

fn record_from_row(row: CallRow) -> CallRecord {
    let (
        call_id,
        phone_number,
        request_prompt,
        final_state,
        started_at,
        ended_at,
        history_json,
        finding_json,
        failure_reason,
    ) = row;
    CallRecord {
        call_id,
        phone_number,
        request_prompt,
        final_state,
        started_at: DateTime::from_timestamp_millis(started_at).unwrap_or_else(Utc::now),
        ended_at: DateTime::from_timestamp_millis(ended_at).unwrap_or_else(Utc::now),
        history_json,
        finding_json,
        failure_reason,
    }
}

const CALL_COLUMNS: &str = "call_id, phone_number, request_prompt, final_state, \
                            started_at, ended_at, history_json, finding_json, failure_reason";

#[async_trait]
impl CallLogStore for ScyllaCallLogStore {
    async fn record(&self, call: &CallRecord) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.call_logs ({CALL_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &call.call_id,
                    &call.phone_number,
                    &call.request_prompt,
                    &call.final_state,
                    call.started_at.timestamp_millis(),
                    call.ended_at.timestamp_millis(),
                    &call.history_json,
                    &call.finding_json,
                    &call.failure_reason,
                ),
            )
            .await?;

        tracing::debug!(call_id = %call.call_id, "Call recorded in ScyllaDB");
        Ok(())
    }

    async fn get(&self, call_id: &str) -> Result<Option<CallRecord>, PersistenceError> {
        let query = format!(
            "SELECT {CALL_COLUMNS} FROM {}.call_logs WHERE call_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (call_id,))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let typed: CallRow = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                return Ok(Some(record_from_row(typed)));
            }
        }

        Ok(None)
    }

    async fn list_recent(&self, limit: i32) -> Result<Vec<CallRecord>, PersistenceError> {
        let query = format!(
            "SELECT {CALL_COLUMNS} FROM {}.call_logs LIMIT ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (limit,))
            .await?;

        let mut records = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                let typed: CallRow = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                records.push(record_from_row(typed));
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supplier_voice_core::{Availability, Speaker};

    #[test]
    fn test_call_record_build() {
        let history = vec![
            Turn::new(Speaker::Agent, "Hello", 1),
            Turn::new(Speaker::Supplier, "Yes", 2),
        ];
        let finding = SupplierFinding {
            availability: Availability::Available,
            price: Some("$200".to_string()),
            notes: String::new(),
        };

        let record = CallRecord::build(
            "CA1",
            "+15550001111",
            "50 chairs",
            "completed",
            Utc::now(),
            &history,
            Some(&finding),
            None,
        )
        .unwrap();

        assert_eq!(record.final_state, "completed");
        assert!(record.history_json.contains("\"sequence\":1"));
        assert!(record.finding_json.unwrap().contains("available"));
        assert!(record.failure_reason.is_none());
    }
}
