//! Web search trigger
//!
//! Questions about current events, prices or anything time-sensitive get a
//! web search before Stage 1. The decision is a plain keyword match.

use regex::Regex;
use std::sync::LazyLock;

static SEARCH_TRIGGERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(today|tonight|yesterday|this week|this month|this year)\b",
        r"\b(latest|recent|current|new|breaking|update)\b",
        r"\b(2024|2025|2026)\b",
        r"\b(price|cost|stock|weather|news|score|result)\b",
        r"\b(who is|what is the current|what happened)\b",
        r"\b(how much does|where can i buy|is .+ open)\b",
    ]
    .into_iter()
    .map(|pattern| Regex::new(&format!("(?i){pattern}")).expect("valid search trigger"))
    .collect()
});

/// Whether `query` likely needs fresh information from the web
pub fn needs_web_search(query: &str) -> bool {
    let query = query.to_lowercase();
    SEARCH_TRIGGERS.iter().any(|re| re.is_match(&query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_sensitive_questions_trigger_search() {
        assert!(needs_web_search("What's the weather in Tokyo?"));
        assert!(needs_web_search("Bitcoin PRICE today"));
        assert!(needs_web_search("Who is the CEO of OpenAI?"));
        assert!(needs_web_search("Is the Louvre open on Mondays?"));
        assert!(needs_web_search("Best laptops of 2025"));
    }

    #[test]
    fn test_timeless_questions_skip_search() {
        assert!(!needs_web_search("Explain Rust lifetimes"));
        assert!(!needs_web_search("Write a haiku about autumn"));
        // Whole words only
        assert!(!needs_web_search("Describe the newt life cycle"));
    }
}
