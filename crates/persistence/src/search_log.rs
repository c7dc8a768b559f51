//! Search session persistence using ScyllaDB

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PersistenceError, ScyllaClient};

/// One supplier search session, as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub search_id: String,
    pub created_at: DateTime<Utc>,
    pub search_query: String,
    pub strategy: String,
    pub queries_json: String,
    pub leads_json: String,
    pub total_leads: i32,
    pub elapsed_ms: i64,
}

impl SearchRecord {
    pub fn new(
        search_query: &str,
        strategy: &str,
        queries: &[String],
        leads_json: String,
        total_leads: i32,
        elapsed_ms: i64,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            search_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            search_query: search_query.to_string(),
            strategy: strategy.to_string(),
            queries_json: serde_json::to_string(queries)?,
            leads_json,
            total_leads,
            elapsed_ms,
        })
    }
}

/// Search log store trait for abstraction
#[async_trait]
pub trait SearchLogStore: Send + Sync {
    async fn record(&self, search: &SearchRecord) -> Result<(), PersistenceError>;
    async fn get(&self, search_id: &str) -> Result<Option<SearchRecord>, PersistenceError>;
}

/// ScyllaDB implementation of the search log store
#[derive(Clone)]
pub struct ScyllaSearchLogStore {
    client: ScyllaClient,
}

impl ScyllaSearchLogStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

const SEARCH_COLUMNS: &str =
    "search_id, created_at, search_query, strategy, queries_json, leads_json, total_leads, elapsed_ms";

#[async_trait]
impl SearchLogStore for ScyllaSearchLogStore {
    async fn record(&self, search: &SearchRecord) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.search_logs ({SEARCH_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &search.search_id,
                    search.created_at.timestamp_millis(),
                    &search.search_query,
                    &search.strategy,
                    &search.queries_json,
                    &search.leads_json,
                    search.total_leads,
                    search.elapsed_ms,
                ),
            )
            .await?;

        tracing::debug!(search_id = %search.search_id, "Search session recorded in ScyllaDB");
        Ok(())
    }

    async fn get(&self, search_id: &str) -> Result<Option<SearchRecord>, PersistenceError> {
        let query = format!(
            "SELECT {SEARCH_COLUMNS} FROM {}.search_logs WHERE search_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (search_id,))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (
                    search_id,
                    created_at,
                    search_query,
                    strategy,
                    queries_json,
                    leads_json,
                    total_leads,
                    elapsed_ms,
                ): (String, i64, String, String, String, String, i32, i64) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

                return Ok(Some(SearchRecord {
                    search_id,
                    created_at: DateTime::from_timestamp_millis(created_at)
                        .unwrap_or_else(Utc::now),
                    search_query,
                    strategy,
                    queries_json,
                    leads_json,
                    total_leads,
                    elapsed_ms,
                }));
            }
        }

        Ok(None)
    }
}
