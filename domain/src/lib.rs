//! Domain layer for llm-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council turn answers one question in three stages:
//!
//! - **Stage 1**: every council model answers independently
//! - **Stage 2**: every answering model ranks the anonymized answers
//! - **Stage 3**: the chairman synthesizes a final answer
//!
//! ## Anonymization
//!
//! Answers are relabeled `Response A`, `Response B`, ... before peer review so
//! that evaluators cannot favor a known vendor. The [`LabelMap`] is released
//! together with the Stage 2 results.

pub mod conversation;
pub mod core;
pub mod council;
pub mod prompt;

// Re-export commonly used types
pub use conversation::entities::{Conversation, ConversationMetadata, DEFAULT_TITLE, Message};
pub use core::{
    error::DomainError,
    message::{ChatMessage, Role},
    model::Model,
    question::Question,
};
pub use council::{
    aggregate::{AggregateRankingEntry, aggregate_rankings, format_aggregate},
    event::{CouncilEvent, Stage2Metadata, TitlePayload},
    label::{Label, LabelMap},
    mode::CouncilMode,
    ranking::{FINAL_RANKING_MARKER, RankingParse, RankingSubmission, parse_ranking},
    search::needs_web_search,
    turn::{Stage, TurnState},
    value_objects::{FinalResponse, ModelResponse, image_note},
};
pub use prompt::CouncilPrompt;
