//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

use crate::openrouter::gateway::DEFAULT_API_URL;
use crate::tavily::provider::DEFAULT_API_URL as DEFAULT_SEARCH_URL;
use council_application::{ExecutionParams, ModeConfig};
use council_domain::{CouncilMode, Model};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("modes.{0}: council_models must not be empty")]
    EmptyCouncil(String),

    #[error("modes.{0}: unknown mode (expected chat, code or image)")]
    UnknownMode(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("gateway.api_url must not be empty")]
    EmptyApiUrl,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// OpenRouter connection
    pub gateway: FileGatewayConfig,
    /// Deadlines, retries and buffering
    pub execution: FileExecutionConfig,
    /// Roster presets keyed by mode name
    pub modes: FileModesConfig,
    /// HTTP server
    pub server: FileServerConfig,
    /// Conversation storage
    pub storage: FileStorageConfig,
    /// Web search for time-sensitive questions
    pub search: FileSearchConfig,
}

impl FileConfig {
    /// Validate the configuration, returning the first problem found
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.gateway.api_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyApiUrl);
        }
        if self.execution.call_timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroValue("execution.call_timeout_secs"));
        }
        if self.execution.title_timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroValue("execution.title_timeout_secs"));
        }
        if self.execution.event_buffer == 0 {
            return Err(ConfigValidationError::ZeroValue("execution.event_buffer"));
        }
        if self.search.max_results == 0 {
            return Err(ConfigValidationError::ZeroValue("search.max_results"));
        }
        if self.search.timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroValue("search.timeout_secs"));
        }
        for (name, mode) in &self.modes.0 {
            if !CouncilMode::ALL.iter().any(|m| m.as_str() == name) {
                return Err(ConfigValidationError::UnknownMode(name.clone()));
            }
            if mode.council_models.is_empty() {
                return Err(ConfigValidationError::EmptyCouncil(name.clone()));
            }
        }
        Ok(())
    }

    /// Execution parameters, including the search deadline
    pub fn execution_params(&self) -> ExecutionParams {
        self.execution
            .to_params()
            .with_search_timeout(Duration::from_secs(self.search.timeout_secs))
    }
}

/// `[gateway]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    /// Chat completions endpoint
    pub api_url: String,
    /// API key (usually supplied through `OPENROUTER_API_KEY`)
    pub api_key: Option<String>,
    /// HTTP-level request timeout
    pub request_timeout_secs: u64,
}

impl Default for FileGatewayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            request_timeout_secs: 120,
        }
    }
}

/// `[execution]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    pub call_timeout_secs: u64,
    pub max_retries: usize,
    pub retry_backoff_ms: u64,
    pub event_buffer: usize,
    pub title_model: Model,
    pub title_timeout_secs: u64,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            call_timeout_secs: params.call_timeout.as_secs(),
            max_retries: params.max_retries,
            retry_backoff_ms: params.retry_backoff.as_millis() as u64,
            event_buffer: params.event_buffer,
            title_model: params.title_model,
            title_timeout_secs: params.title_timeout.as_secs(),
        }
    }
}

impl FileExecutionConfig {
    pub fn to_params(&self) -> ExecutionParams {
        ExecutionParams::default()
            .with_call_timeout(Duration::from_secs(self.call_timeout_secs))
            .with_max_retries(self.max_retries)
            .with_retry_backoff(Duration::from_millis(self.retry_backoff_ms))
            .with_event_buffer(self.event_buffer)
            .with_title_model(self.title_model.clone())
            .with_title_timeout(Duration::from_secs(self.title_timeout_secs))
    }
}

/// `[modes.<name>]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileModeConfig {
    pub council_models: Vec<Model>,
    pub chairman_model: Model,
}

impl From<&FileModeConfig> for ModeConfig {
    fn from(file: &FileModeConfig) -> Self {
        ModeConfig::new(file.council_models.clone(), file.chairman_model.clone())
    }
}

/// `[modes]` table, prefilled with the built-in presets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileModesConfig(pub BTreeMap<String, FileModeConfig>);

impl Default for FileModesConfig {
    fn default() -> Self {
        Self(
            CouncilMode::ALL
                .iter()
                .map(|mode| (mode.as_str().to_string(), builtin_preset(*mode)))
                .collect(),
        )
    }
}

impl FileModesConfig {
    pub fn get(&self, mode: CouncilMode) -> Option<&FileModeConfig> {
        self.0.get(mode.as_str())
    }
}

/// Built-in roster for a mode
pub fn builtin_preset(mode: CouncilMode) -> FileModeConfig {
    match mode {
        CouncilMode::Chat => FileModeConfig {
            council_models: vec![
                Model::Gpt51,
                Model::Gemini3Pro,
                Model::ClaudeSonnet45,
                Model::Grok4,
            ],
            chairman_model: Model::Gemini3Pro,
        },
        CouncilMode::Code => FileModeConfig {
            council_models: vec![
                Model::ClaudeSonnet45,
                Model::Qwen3Coder,
                Model::DeepSeekR1DistillQwen32b,
                Model::Gpt51,
            ],
            chairman_model: Model::ClaudeSonnet45,
        },
        CouncilMode::Image => FileModeConfig {
            council_models: vec![
                Model::Gpt5Image,
                Model::Gemini3ProImage,
                Model::Gemini25FlashImage,
                Model::QwenVlMax,
            ],
            chairman_model: Model::Gemini3ProImage,
        },
    }
}

/// `[server]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    pub bind: String,
    pub port: u16,
    /// Origins allowed by CORS; empty allows none
    pub allowed_origins: Vec<String>,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8001,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

/// `[search]` section
///
/// Search stays off until an API key is set, usually through `TAVILY_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSearchConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for FileSearchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_SEARCH_URL.to_string(),
            api_key: None,
            max_results: 5,
            timeout_secs: 30,
        }
    }
}

/// `[storage]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    pub data_dir: String,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/conversations".to_string(),
        }
    }
}
