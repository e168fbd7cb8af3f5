//! OpenRouter adapter
//!
//! Implements the [`ModelGateway`](council_application::ModelGateway) port
//! over OpenRouter's OpenAI-compatible chat completions endpoint.
//!
//! ```text
//! OpenRouterGateway ──POST {model, messages, modalities?}──▶ api_url
//!                   ◀── choices[0].message.content (text or blocks)
//! ```
//!
//! Image output arrives as `data:image/...` URLs, either in `image_url` /
//! `image` content blocks or embedded in plain text.

pub mod error;
pub mod gateway;
pub mod types;

pub use error::OpenRouterError;
pub use gateway::OpenRouterGateway;
