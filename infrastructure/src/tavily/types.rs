//! Wire types for the search endpoint

use serde::{Deserialize, Serialize};

/// Characters kept from each result snippet
const SNIPPET_CHARS: usize = 500;

/// Request body; Tavily takes the key in the body
#[derive(Serialize)]
pub struct SearchRequest<'a> {
    pub api_key: &'a str,
    pub query: &'a str,
    pub max_results: usize,
    pub include_answer: bool,
    pub include_raw_content: bool,
    pub search_depth: &'static str,
}

impl<'a> SearchRequest<'a> {
    pub fn basic(api_key: &'a str, query: &'a str, max_results: usize) -> Self {
        Self {
            api_key,
            query,
            max_results,
            include_answer: true,
            include_raw_content: false,
            search_depth: "basic",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
}

impl SearchResponse {
    /// Render the answer and up to `limit` hits as prompt context
    pub fn format(&self, limit: usize) -> String {
        let mut parts = Vec::new();

        if let Some(answer) = self.answer.as_deref().filter(|a| !a.is_empty()) {
            parts.push(format!("**Quick Answer:** {}", answer));
        }

        if !self.results.is_empty() {
            parts.push("\n**Web Search Results:**".to_string());
            for (i, hit) in self.results.iter().take(limit).enumerate() {
                let title = hit.title.as_deref().unwrap_or("No title");
                let snippet: String = hit.content.chars().take(SNIPPET_CHARS).collect();
                parts.push(format!("\n{}. **{}**", i + 1, title));
                parts.push(format!("   {}", snippet));
                if !hit.url.is_empty() {
                    parts.push(format!("   Source: {}", hit.url));
                }
            }
        }

        parts.join("\n")
    }
}
