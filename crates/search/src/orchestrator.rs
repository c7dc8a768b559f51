//! Supplier search orchestration

use std::time::Instant;

use serde::{Deserialize, Serialize};

use supplier_voice_config::SearchConfig;

use crate::lead::{self, SupplierLead};
use crate::query::{self, SearchStrategy};
use crate::serp::{SerpClient, SerpHit};
use crate::SearchError;

/// One supplier search request
#[derive(Debug, Clone, Deserialize)]
pub struct SupplierSearchRequest {
    pub search_query: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub strategy: SearchStrategy,
    #[serde(default)]
    pub max_results: Option<u32>,
}

/// What a supplier search produced
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub leads: Vec<SupplierLead>,
    pub queries_used: Vec<String>,
    pub elapsed_ms: u64,
}

/// Runs the generate-search-analyze pipeline
pub struct SearchOrchestrator {
    serp: SerpClient,
    config: SearchConfig,
}

impl SearchOrchestrator {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let serp = SerpClient::new(config.clone())?;
        Ok(Self { serp, config })
    }

    /// Run every generated query and distill the combined hits into leads
    ///
    /// Individual query failures are logged and skipped; the outcome
    /// reflects whatever queries did succeed.
    pub async fn search_suppliers(
        &self,
        request: &SupplierSearchRequest,
    ) -> Result<SearchOutcome, SearchError> {
        if !self.serp.is_configured() {
            return Err(SearchError::NotConfigured);
        }

        let started = Instant::now();
        let max_results = request.max_results.unwrap_or(self.config.max_results);
        let queries = query::build_queries(
            &request.search_query,
            request.amount.as_deref(),
            &self.config.country_code,
            request.strategy,
        );

        let mut hits: Vec<SerpHit> = Vec::new();
        for q in &queries {
            match self.serp.search(q, max_results).await {
                Ok(batch) => {
                    tracing::debug!(query = %q, hits = batch.len(), "SERP query done");
                    hits.extend(batch);
                }
                Err(e) => {
                    tracing::warn!(query = %q, "SERP query failed: {}", e);
                }
            }
        }

        let leads = lead::analyze_hits(&hits, &self.config.country_code);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            queries = queries.len(),
            raw_hits = hits.len(),
            leads = leads.len(),
            elapsed_ms,
            "Supplier search complete"
        );

        Ok(SearchOutcome {
            leads,
            queries_used: queries,
            elapsed_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: SupplierSearchRequest =
            serde_json::from_str(r#"{"search_query": "офисные стулья"}"#).unwrap();
        assert_eq!(request.strategy, SearchStrategy::Direct);
        assert!(request.amount.is_none());
        assert!(request.max_results.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_search_errors() {
        let orchestrator = SearchOrchestrator::new(SearchConfig::default()).unwrap();
        let request = SupplierSearchRequest {
            search_query: "стулья".to_string(),
            amount: None,
            strategy: SearchStrategy::Direct,
            max_results: None,
        };
        let result = orchestrator.search_suppliers(&request).await;
        assert!(matches!(result, Err(SearchError::NotConfigured)));
    }
}
