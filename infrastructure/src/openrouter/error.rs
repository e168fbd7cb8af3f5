//! Error types for the OpenRouter adapter

use council_application::GatewayError;
use thiserror::Error;

/// Result type alias for OpenRouter operations
pub type Result<T> = std::result::Result<T, OpenRouterError>;

/// Errors that can occur when talking to OpenRouter
#[derive(Error, Debug)]
pub enum OpenRouterError {
    #[error("OPENROUTER_API_KEY is not set (or gateway.api_key in config)")]
    MissingApiKey,

    #[error("API key contains invalid characters")]
    InvalidApiKey,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response contained no message content")]
    EmptyResponse,
}

impl From<OpenRouterError> for GatewayError {
    fn from(e: OpenRouterError) -> Self {
        match e {
            OpenRouterError::Http(ref err) if err.is_timeout() => GatewayError::Timeout,
            OpenRouterError::Http(ref err) if err.is_connect() => {
                GatewayError::ConnectionError(e.to_string())
            }
            OpenRouterError::Http(ref err) if err.is_decode() => {
                GatewayError::InvalidResponse(e.to_string())
            }
            OpenRouterError::Api { status: 404, message } => {
                GatewayError::ModelNotAvailable(message)
            }
            OpenRouterError::Api {
                status: 408 | 504, ..
            } => GatewayError::Timeout,
            OpenRouterError::EmptyResponse => GatewayError::InvalidResponse(e.to_string()),
            other => GatewayError::RequestFailed(other.to_string()),
        }
    }
}
