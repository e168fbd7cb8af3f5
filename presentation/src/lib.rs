//! Presentation layer for llm-council
//!
//! This crate contains the CLI definitions, the HTTP/SSE server,
//! console output formatting and progress reporting.

pub mod cli;
pub mod output;
pub mod progress;
pub mod server;

// Re-export commonly used types
pub use cli::commands::{AskArgs, Cli, Command, OutputFormat, ServeArgs};
pub use output::console::ConsoleFormatter;
pub use output::transcript::TurnTranscript;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
pub use server::{ApiError, AppState, build_router, serve};
