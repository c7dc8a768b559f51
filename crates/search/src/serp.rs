//! SERP API client

use std::time::Duration;

use serde::Deserialize;

use supplier_voice_config::SearchConfig;

use crate::SearchError;

const SERP_ENGINE: &str = "google";

/// One organic web result
#[derive(Debug, Clone, Deserialize)]
pub struct SerpHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<SerpHit>,
}

/// Thin client over the SERP API web endpoint
pub struct SerpClient {
    http: reqwest::Client,
    config: SearchConfig,
}

impl SerpClient {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn is_configured(&self) -> bool {
        !self.config.serp_api_key.is_empty()
    }

    /// Run one query, returning at most `max_results` organic hits
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SerpHit>, SearchError> {
        if !self.is_configured() {
            return Err(SearchError::NotConfigured);
        }

        let num = max_results.min(self.config.max_results).to_string();
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("api_key", self.config.serp_api_key.as_str()),
                ("engine", SERP_ENGINE),
                ("q", query),
                ("num", num.as_str()),
                ("gl", self.config.country_code.as_str()),
                ("hl", self.config.language.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SerpResponse = response.json().await?;
        let mut hits = parsed.organic_results;
        hits.truncate(max_results as usize);
        Ok(hits)
    }
}
