//! OpenRouter Model Gateway implementation

use super::error::{OpenRouterError, Result};
use super::types::{ApiErrorBody, ChatContent, ChatRequest, ChatResponse};
use crate::config::FileGatewayConfig;
use async_trait::async_trait;
use council_application::{GatewayError, InvokeOptions, ModelGateway, ModelReply};
use council_domain::{ChatMessage, Model};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Model Gateway backed by the OpenRouter HTTP API
#[derive(Clone)]
pub struct OpenRouterGateway {
    client: Client,
    api_url: String,
}

impl OpenRouterGateway {
    /// Create a gateway with an explicit endpoint and key
    pub fn new(
        api_url: impl Into<String>,
        api_key: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let key = api_key.trim();
        if key.is_empty() {
            return Err(OpenRouterError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|_| OpenRouterError::InvalidApiKey)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| OpenRouterError::ClientBuild(e.to_string()))?;

        let api_url = api_url.into();
        info!("OpenRouterGateway initialized ({})", api_url);

        Ok(Self { client, api_url })
    }

    /// Create a gateway from the `[gateway]` config section
    pub fn from_config(config: &FileGatewayConfig) -> Result<Self> {
        let key = config
            .api_key
            .as_deref()
            .ok_or(OpenRouterError::MissingApiKey)?;
        Self::new(
            config.api_url.clone(),
            key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn complete(
        &self,
        model: &Model,
        messages: &[ChatMessage],
        options: InvokeOptions,
    ) -> Result<ChatContent> {
        let mut request = ChatRequest::new(model.as_str(), messages);
        if options.generate_images {
            request = request.with_images();
        }

        let response = self.client.post(&self.api_url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(OpenRouterError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        body.into_content().ok_or(OpenRouterError::EmptyResponse)
    }
}

#[async_trait]
impl ModelGateway for OpenRouterGateway {
    async fn invoke(
        &self,
        model: &Model,
        messages: &[ChatMessage],
    ) -> std::result::Result<String, GatewayError> {
        self.invoke_with(model, messages, InvokeOptions::default())
            .await
            .map(|reply| reply.content)
    }

    async fn invoke_with(
        &self,
        model: &Model,
        messages: &[ChatMessage],
        options: InvokeOptions,
    ) -> std::result::Result<ModelReply, GatewayError> {
        let started = Instant::now();
        debug!("Querying {} ({} messages)", model, messages.len());

        match self.complete(model, messages, options).await {
            Ok(content) => {
                debug!("{} answered in {:?}", model, started.elapsed());
                // Images only count when they were asked for
                let images = if options.generate_images {
                    content.images
                } else {
                    Vec::new()
                };
                if !images.is_empty() {
                    debug!("{} generated {} image(s)", model, images.len());
                }
                Ok(ModelReply {
                    content: content.text,
                    images,
                })
            }
            Err(e) => {
                warn!("OpenRouter request for {} failed: {}", model, e);
                Err(e.into())
            }
        }
    }
}
