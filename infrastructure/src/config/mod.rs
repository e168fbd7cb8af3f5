//! Configuration file loading for llm-council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `COUNCIL_*` environment variables (`COUNCIL_SERVER__PORT=9000`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./council.toml` or `./.council.toml`
//! 4. Global: `~/.config/llm-council/config.toml`
//! 5. `OPENROUTER_API_KEY` and `TAVILY_API_KEY` (for `gateway.api_key` and `search.api_key`)
//! 6. Default values

mod council;
mod file_config;
mod loader;

pub use council::StaticCouncilConfig;
pub use file_config::{
    ConfigValidationError, FileConfig, FileExecutionConfig, FileGatewayConfig, FileModeConfig,
    FileModesConfig, FileSearchConfig, FileServerConfig, FileStorageConfig,
};
pub use loader::ConfigLoader;
