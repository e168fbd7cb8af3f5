//! The council: anonymized peer ranking and chairman synthesis.
//!
//! - [`mode`]: roster/prompt preset (`chat`, `code`, `image`)
//! - [`value_objects`]: Stage 1 answers and the Stage 3 synthesis
//! - [`label`]: the Anonymizer ([`Label`](label::Label), [`LabelMap`](label::LabelMap))
//! - [`ranking`]: Stage 2 submissions and the free-text Rank Parser
//! - [`aggregate`]: the Rank Aggregator
//! - [`turn`]: stages and the turn state machine
//! - [`event`]: the streamed event protocol
//! - [`search`]: when a question needs a web search

pub mod aggregate;
pub mod event;
pub mod label;
pub mod mode;
pub mod ranking;
pub mod search;
pub mod turn;
pub mod value_objects;
