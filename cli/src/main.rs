//! CLI entrypoint for LLM Council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::{CommandFactory, Parser};
use council_application::{
    ConversationStore, NoProgress, ProgressNotifier, RunTurnInput, RunTurnUseCase,
};
use council_domain::{CouncilMode, Model, Question};
use council_infrastructure::{
    ConfigLoader, FileConfig, JsonConversationStore, OpenRouterGateway, StaticCouncilConfig,
    TavilySearch,
};
use council_presentation::{
    AppState, AskArgs, Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, ServeArgs,
    SimpleProgress, TurnTranscript, build_router, serve,
};
use futures::StreamExt;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting LLM Council");

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    config.validate().context("Invalid configuration")?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Serve(args) => run_server(config, args).await,
        Command::Ask(args) => run_ask(config, args).await,
    }
}

/// Initialize logging based on verbosity level, optionally teeing to a file
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Build the turn use case from configuration
fn build_turns(
    config: &FileConfig,
    store: Option<Arc<dyn ConversationStore>>,
) -> Result<RunTurnUseCase<OpenRouterGateway>> {
    // === Dependency Injection ===
    let gateway = Arc::new(
        OpenRouterGateway::from_config(&config.gateway)
            .context("Set OPENROUTER_API_KEY or gateway.api_key")?,
    );
    let council = Arc::new(StaticCouncilConfig::from_file(config));

    let mut turns = RunTurnUseCase::new(gateway, council).with_params(config.execution_params());
    if let Some(store) = store {
        turns = turns.with_store(store);
    }
    match TavilySearch::from_config(&config.search).context("Invalid [search] configuration")? {
        Some(search) => turns = turns.with_search(Arc::new(search)),
        None => info!("Web search disabled (no TAVILY_API_KEY)"),
    }
    Ok(turns)
}

/// Cancel `token` on Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            token.cancel();
        }
    });
}

async fn run_server(config: FileConfig, args: ServeArgs) -> Result<()> {
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid server address {}:{}", bind, port))?;

    let store: Arc<dyn ConversationStore> =
        Arc::new(JsonConversationStore::new(&config.storage.data_dir));
    let turns = Arc::new(build_turns(&config, Some(Arc::clone(&store)))?);
    info!("Conversations stored in {}", config.storage.data_dir);

    let router = build_router(AppState::new(turns, store), &config.server.allowed_origins);

    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());

    serve(router, addr, shutdown).await?;
    Ok(())
}

async fn run_ask(config: FileConfig, args: AskArgs) -> Result<()> {
    let mode = CouncilMode::from_name(&args.mode);
    let mut input = RunTurnInput::new(Question::new(args.question.clone())?, mode);
    if !args.model.is_empty() {
        input = input.with_models(args.model.iter().map(|m| Model::from(m.as_str())).collect());
    }
    if let Some(chairman) = &args.chairman {
        input = input.with_chairman(Model::from(chairman.as_str()));
    }

    let turns = Arc::new(build_turns(&config, None)?);

    if !args.quiet {
        let (roster, chairman) = turns.resolve_roster(&input);
        println!();
        print!("{}", ConsoleFormatter::header(&args.question));
        println!(
            "Mode: {}  Council: {}  Chairman: {}",
            mode.display_name(),
            roster
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            chairman
        );
    }

    let progress: Arc<dyn ProgressNotifier> = if args.quiet {
        Arc::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(SimpleProgress)
    };

    let mut stream = turns.start_with_progress(input, progress);
    cancel_on_ctrl_c(stream.canceller());

    let mut transcript = TurnTranscript::new();
    while let Some(event) = stream.next().await {
        if args.output == OutputFormat::Full
            && let Some(text) = ConsoleFormatter::format_event(&event)
        {
            print!("{}", text);
        }
        transcript.record(&event);
    }

    if let Some(message) = transcript.error() {
        bail!("{}", message);
    }
    if !transcript.is_complete() {
        bail!("Turn cancelled");
    }

    let Some(outcome) = transcript.into_outcome() else {
        bail!("Turn ended without a final answer");
    };

    match args.output {
        OutputFormat::Full => {}
        OutputFormat::Final => {
            println!("{}", ConsoleFormatter::format_final(&args.question, &outcome))
        }
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&outcome)),
    }

    Ok(())
}
