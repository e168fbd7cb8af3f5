//! Error types for the Tavily adapter

use council_application::SearchError;
use thiserror::Error;

/// Result type alias for Tavily operations
pub type Result<T> = std::result::Result<T, TavilyError>;

/// Errors that can occur when talking to Tavily
#[derive(Error, Debug)]
pub enum TavilyError {
    #[error("TAVILY_API_KEY is not set (or search.api_key in config)")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<TavilyError> for SearchError {
    fn from(e: TavilyError) -> Self {
        match e {
            TavilyError::Http(ref err) if err.is_timeout() => SearchError::Timeout,
            TavilyError::Http(ref err) if err.is_decode() => {
                SearchError::InvalidResponse(e.to_string())
            }
            other => SearchError::RequestFailed(other.to_string()),
        }
    }
}
