//! Keyspace and table DDL

use scylla::Session;

use crate::error::PersistenceError;

pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let ddl = format!(
        "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH replication = \
         {{'class': 'NetworkTopologyStrategy', 'replication_factor': {replication_factor}}}"
    );
    session
        .query_unpaged(ddl, ())
        .await
        .map_err(|e| PersistenceError::SchemaError(e.to_string()))?;
    Ok(())
}

pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    let call_logs = format!(
        "CREATE TABLE IF NOT EXISTS {keyspace}.call_logs (
            call_id text PRIMARY KEY,
            phone_number text,
            request_prompt text,
            final_state text,
            started_at bigint,
            ended_at bigint,
            history_json text,
            finding_json text,
            failure_reason text
        )"
    );
    let search_logs = format!(
        "CREATE TABLE IF NOT EXISTS {keyspace}.search_logs (
            search_id text PRIMARY KEY,
            created_at bigint,
            search_query text,
            strategy text,
            queries_json text,
            leads_json text,
            total_leads int,
            elapsed_ms bigint
        )"
    );

    for ddl in [call_logs, search_logs] {
        session
            .query_unpaged(ddl, ())
            .await
            .map_err(|e| PersistenceError::SchemaError(e.to_string()))?;
    }
    Ok(())
}
