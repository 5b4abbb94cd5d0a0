//! Claude Query - run a prompt through Claude Code from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use claude_query::config::ConfigLoader;
use claude_query::display;
use claude_query::{query, query_stream, QueryRequest};

#[derive(Parser)]
#[command(
    name = "claude-query",
    about = "Run a prompt through the Claude Code CLI",
    version
)]
struct Cli {
    /// The prompt to send.
    prompt: String,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to load instead of the default search paths.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model override.
    #[arg(long)]
    model: Option<String>,

    /// MCP server configuration file.
    #[arg(long)]
    mcp_config: Option<PathBuf>,

    /// Path to the Claude Code binary.
    #[arg(long)]
    cli_path: Option<PathBuf>,

    /// Print messages as they arrive instead of only the final answer.
    #[arg(long)]
    stream: bool,

    /// Do not truncate tool inputs and show unrendered events.
    #[arg(long)]
    raw: bool,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let mut options = config.to_options();
    if cli.model.is_some() {
        options.model = cli.model;
    }
    if cli.mcp_config.is_some() {
        options.mcp_config = cli.mcp_config;
    }
    if cli.cli_path.is_some() {
        options.cli_path = cli.cli_path;
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling");
            ctrl_c.cancel();
        }
    });

    tracing::info!(stream = cli.stream, model = ?options.model, "Starting query");

    if cli.stream {
        let (mut messages, errors) = query_stream(cancel, QueryRequest::new(cli.prompt, options));
        while let Some(slot) = messages.recv().await {
            match slot {
                Ok(event) => display::print_event(&event, cli.raw),
                Err(e) => display::print_decode_error(&e, cli.raw),
            }
        }
        return match errors.await {
            Ok(None) => ExitCode::SUCCESS,
            Ok(Some(e)) => {
                display::print_query_error(&e);
                ExitCode::FAILURE
            }
            Err(_) => {
                display::print_error("query task ended without a verdict");
                ExitCode::FAILURE
            }
        };
    }

    match query(&cancel, &cli.prompt, &options).await {
        Ok(result) => {
            for e in &result.decode_errors {
                display::print_decode_error(e, cli.raw);
            }
            display::print_text(result.answer());
            println!();
            if result.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            display::print_query_error(&e);
            ExitCode::FAILURE
        }
    }
}
