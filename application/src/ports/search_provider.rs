//! Web search port
//!
//! Supplies Stage 1 with a formatted block of current search results.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a search backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid search response: {0}")]
    InvalidResponse(String),

    #[error("Search timed out")]
    Timeout,
}

/// Web search backend
///
/// Returns results already formatted as prompt context.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, SearchError>;
}
