//! Application layer for llm-council
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ExecutionParams;
pub use ports::{
    conversation_store::{ConversationStore, StoreError},
    council_config::{CouncilConfigPort, ModeConfig},
    model_gateway::{GatewayError, InvokeOptions, ModelGateway, ModelReply},
    progress::{NoProgress, ProgressNotifier},
    search_provider::{SearchError, SearchProvider},
};
pub use use_cases::dispatch::{DispatchError, DispatchOutcome, StageDispatcher};
pub use use_cases::run_turn::{RunTurnError, RunTurnInput, RunTurnUseCase, TurnOutcome};
pub use use_cases::stream::{EventSink, StreamClosed, TurnStream, event_channel};
pub use use_cases::title::GenerateTitleUseCase;
