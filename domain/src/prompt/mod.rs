//! Prompt templates for the three council stages and title generation.

pub mod template;

pub use template::CouncilPrompt;
