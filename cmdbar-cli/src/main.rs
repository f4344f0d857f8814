//! cmdbar CLI - Terminal console for a command backend.
//!
//! Starts the interactive console by default; subcommands cover one-shot
//! execution, registry listing, and configuration.

mod commands;
mod keys;
mod render;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use cmdbar_core::{ConsoleConfig, ConsoleSession, HttpBackend};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// cmdbar: an interactive command console with completion and history
#[derive(Parser, Debug)]
#[command(name = "cmdbar", version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides configuration)
    #[arg(short, long)]
    url: Option<String>,

    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path (replaces the layered lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Quote character used when splitting the input into tokens
    #[arg(long)]
    quote: Option<char>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List the commands the backend offers
    #[command(name = "commands")]
    List,
    /// Execute a single command line and print its result
    Exec {
        /// The command line, e.g. "set console_eventlog_verbosity info"
        line: String,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create default configuration file
    Init,
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "cmdbar", "cmdbar")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "cmdbar.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    // Resolve workspace
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = resolve_config(&cli, &workspace)?;
    tracing::debug!(base_url = %config.backend.base_url, "Configuration loaded");

    if let Some(command) = cli.command {
        return commands::handle_command(command, &config, &workspace).await;
    }

    let backend = HttpBackend::new(&config.backend)?;
    let mut session = ConsoleSession::new(Arc::new(backend), config.tokenizer.tokenizer());
    if let Err(e) = session.activate().await {
        eprintln!("Could not load the command registry: {e}");
        eprintln!("Commands can still be submitted; completion stays empty.");
    }
    repl::run(&mut session, &config.ui).await
}

/// Load configuration and apply command-line overrides on top.
fn resolve_config(cli: &Cli, workspace: &std::path::Path) -> cmdbar_core::Result<ConsoleConfig> {
    let mut config = match &cli.config {
        Some(path) => cmdbar_core::load_config_file(path),
        None => cmdbar_core::load_config(Some(workspace), None),
    }?;

    if let Some(url) = &cli.url {
        config.backend.base_url = url.clone();
    }
    if let Some(quote) = cli.quote {
        config.tokenizer.quote = quote;
    }
    config.validate()?;
    Ok(config)
}
