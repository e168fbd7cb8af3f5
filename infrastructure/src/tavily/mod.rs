//! Tavily adapter
//!
//! Implements the [`SearchProvider`](council_application::SearchProvider)
//! port over Tavily's search API.
//!
//! ```text
//! TavilySearch ──POST {api_key, query, max_results, ...}──▶ api_url
//!              ◀── {answer, results: [{title, content, url}]}
//! ```

pub mod error;
pub mod provider;
pub mod types;

pub use error::TavilyError;
pub use provider::TavilySearch;
