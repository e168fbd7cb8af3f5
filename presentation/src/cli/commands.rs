//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for `ask`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every stage as it completes
    Full,
    /// Only the chairman's final answer
    Final,
    /// JSON with all stages and metadata
    Json,
}

/// CLI arguments for llm-council
#[derive(Parser, Debug)]
#[command(name = "llm-council")]
#[command(author, version)]
#[command(about = "LLM Council - models answer, rank each other anonymously, then a chair sums up")]
#[command(long_about = r#"
LLM Council sends one question to several models and combines their answers.

Each turn has three stages:
1. Responses: every council model answers independently
2. Rankings: every model ranks the anonymized answers ("Response A", "Response B", ...)
3. Synthesis: the chairman model writes the final answer from the answers and rankings

Configuration files are loaded from (in priority order):
1. COUNCIL_* environment variables
2. --config <path>     Explicit config file
3. ./council.toml      Project-level config
4. ~/.config/llm-council/config.toml   Global config

The OpenRouter API key is read from OPENROUTER_API_KEY. Setting TAVILY_API_KEY
enables web search for time-sensitive questions in chat mode.

Example:
  llm-council serve --port 8001
  llm-council ask "What's the best way to handle errors in Rust?"
  llm-council ask --mode code -m qwen/qwen3-coder -m openai/gpt-5.1 "Review this function"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API server
    Serve(ServeArgs),
    /// Ask the council one question in the terminal
    Ask(AskArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides server.bind)
    #[arg(long)]
    pub bind: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to ask the council
    pub question: String,

    /// Council mode: chat, code or image
    #[arg(long, default_value = "chat")]
    pub mode: String,

    /// Models to include in the council (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Model to use as chairman for the final synthesis
    #[arg(long, value_name = "MODEL")]
    pub chairman: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "full")]
    pub output: OutputFormat,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}
