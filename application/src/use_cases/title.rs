//! Conversation title generation
//!
//! Best-effort side task: asks a fast model for a 3-5 word summary of the
//! first question in a conversation.

use crate::config::ExecutionParams;
use crate::ports::model_gateway::{GatewayError, ModelGateway};
use council_domain::core::string::{strip_quotes, truncate};
use council_domain::{ChatMessage, CouncilPrompt, Model};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Maximum title length in bytes, ellipsis included
pub const MAX_TITLE_LEN: usize = 50;

/// Use case for summarizing a question into a conversation title
pub struct GenerateTitleUseCase<G: ModelGateway + 'static> {
    gateway: Arc<G>,
    model: Model,
    timeout: Duration,
}

impl<G: ModelGateway + 'static> Clone for GenerateTitleUseCase<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            model: self.model.clone(),
            timeout: self.timeout,
        }
    }
}

impl<G: ModelGateway + 'static> GenerateTitleUseCase<G> {
    pub fn new(gateway: Arc<G>, params: &ExecutionParams) -> Self {
        Self {
            gateway,
            model: params.title_model.clone(),
            timeout: params.title_timeout,
        }
    }

    pub async fn execute(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, GatewayError> {
        let messages = [ChatMessage::user(CouncilPrompt::title_prompt(question))];

        let call = self.gateway.invoke(&self.model, &messages);
        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            result = tokio::time::timeout(self.timeout, call) => {
                result.unwrap_or(Err(GatewayError::Timeout))?
            }
        };

        let title = clean_title(&raw);
        if title.is_empty() {
            return Err(GatewayError::InvalidResponse("empty title".to_string()));
        }
        debug!("Generated title: {}", title);
        Ok(title)
    }
}

/// Trim, strip surrounding quotes and cap the length
pub fn clean_title(raw: &str) -> String {
    truncate(strip_quotes(raw), MAX_TITLE_LEN)
}
