//! Tavily Search Provider implementation

use super::error::{Result, TavilyError};
use super::types::{SearchRequest, SearchResponse};
use crate::config::FileSearchConfig;
use async_trait::async_trait;
use council_application::{SearchError, SearchProvider};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_API_URL: &str = "https://api.tavily.com/search";

/// Search Provider backed by the Tavily HTTP API
#[derive(Clone)]
pub struct TavilySearch {
    client: Client,
    api_url: String,
    api_key: String,
    max_results: usize,
}

impl TavilySearch {
    pub fn new(
        api_url: impl Into<String>,
        api_key: &str,
        max_results: usize,
        request_timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(TavilyError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TavilyError::ClientBuild(e.to_string()))?;

        let api_url = api_url.into();
        info!("TavilySearch initialized ({})", api_url);

        Ok(Self {
            client,
            api_url,
            api_key: api_key.to_string(),
            max_results,
        })
    }

    /// Create a provider from the `[search]` section, or `None` when no key is set
    pub fn from_config(config: &FileSearchConfig) -> Result<Option<Self>> {
        let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };
        Self::new(
            config.api_url.clone(),
            key,
            config.max_results,
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }

    async fn query(&self, query: &str) -> Result<SearchResponse> {
        let request = SearchRequest::basic(&self.api_key, query, self.max_results);
        let response = self.client.post(&self.api_url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TavilyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str) -> std::result::Result<String, SearchError> {
        match self.query(query).await {
            Ok(response) => {
                debug!("Search returned {} results", response.results.len());
                Ok(response.format(self.max_results))
            }
            Err(e) => {
                warn!("Tavily search failed: {}", e);
                Err(e.into())
            }
        }
    }
}
