//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: OpenRouter model identifiers (GPT, Gemini, Claude, ...)
//! - [`question::Question`]: a validated question to pose to the council
//! - [`message::ChatMessage`]: one role-tagged message sent to a model
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod message;
pub mod model;
pub mod question;
pub mod string;
