//! Infrastructure layer for llm-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the OpenRouter gateway, Tavily web search,
//! JSON conversation storage and configuration file loading.

pub mod config;
pub mod openrouter;
pub mod storage;
pub mod tavily;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileExecutionConfig, FileGatewayConfig,
    FileModeConfig, FileSearchConfig, FileServerConfig, FileStorageConfig, StaticCouncilConfig,
};
pub use openrouter::{OpenRouterError, OpenRouterGateway};
pub use storage::JsonConversationStore;
pub use tavily::{TavilyError, TavilySearch};
