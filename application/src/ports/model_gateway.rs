//! Model Gateway port
//!
//! Defines the interface for communicating with LLM providers.

use async_trait::async_trait;
use council_domain::{ChatMessage, Model};
use thiserror::Error;

/// Errors that can occur during model gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GatewayError::Cancelled)
    }
}

/// Per-call options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Ask the provider for image output alongside text
    pub generate_images: bool,
}

impl InvokeOptions {
    pub fn images() -> Self {
        Self {
            generate_images: true,
        }
    }
}

/// A complete answer, possibly with generated images as `data:` URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelReply {
    pub content: String,
    pub images: Vec<String>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            images: Vec::new(),
        }
    }
}

/// Gateway for LLM communication
///
/// One call, one complete answer: `invoke(model, messages) -> text | error`.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn invoke(
        &self,
        model: &Model,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError>;

    /// Invoke with options. Text-only gateways ignore them.
    async fn invoke_with(
        &self,
        model: &Model,
        messages: &[ChatMessage],
        _options: InvokeOptions,
    ) -> Result<ModelReply, GatewayError> {
        self.invoke(model, messages).await.map(ModelReply::text)
    }
}
