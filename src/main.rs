//! shalom MCP Server & CLI
//!
//! Dual-mode application:
//! - MCP Server Mode (default): Model Context Protocol server using stdio
//! - CLI Mode: Command-line utility for direct tool execution
//!
//! Tools: `quote`, `search`, `suggest`, `track`, `route`, `notify`, `report`.

mod cli;
mod config;
mod error;
mod mcp;
mod notify;
mod reports;
mod search;
mod tariff;
mod tools;
mod tracking;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::AppConfig;
use error::AppError;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Detect mode: CLI if args present, MCP server otherwise
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        run_cli_mode()
    } else {
        run_mcp_mode().await
    }
}

/// Run in CLI mode
fn run_cli_mode() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(5);
        }
    };

    let Some(command) = cli.command else {
        eprintln!("Error: No command specified. Use --help for usage information.");
        std::process::exit(1);
    };

    match execute_command(command, &config) {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e.message());
            std::process::exit(e.exit_code());
        }
    }
}

/// Execute one CLI command with engines built from `config`
fn execute_command(command: Commands, config: &AppConfig) -> Result<String, AppError> {
    let result = match command {
        Commands::Quote(args) => {
            let engine = tariff::RateEngine::new(config.tariffs.clone())?;
            tools::quote::execute_quote(&engine, args)?
        }
        Commands::Search(args) => {
            let mut engine = search::SearchEngine::with_config(&config.search)?;
            tools::search::execute_search(&mut engine, args)?
        }
        Commands::Track(args) => return execute_track_cli(args, config),
        Commands::Notify(args) => {
            let mut notifier = notify::Notifier::default();
            tools::notify::execute_notify(&mut notifier, args)?
        }
        Commands::Report(args) => tools::report::execute_report(args)?,
    };
    Ok(result.into_text())
}

/// Replay a fixes file and print the route of each package
fn execute_track_cli(args: cli::TrackReplayArgs, config: &AppConfig) -> Result<String, AppError> {
    let reports: Vec<tracking::FixReport> = tools::util::load_json_file(&args.fixes)?;
    let mut tracker = tracking::GpsTracker::new(&config.tracking);

    for report in reports {
        tools::track::execute_track(
            &mut tracker,
            cli::TrackArgs {
                code: report.code,
                latitude: report.latitude,
                longitude: report.longitude,
                timestamp: report.timestamp,
            },
        )?;
    }

    let codes: Vec<String> = match args.code {
        Some(code) => vec![code],
        None => tracker.packages().into_iter().map(str::to_string).collect(),
    };
    if codes.is_empty() {
        return Err(AppError::NotFound(format!(
            "No fixes in {}",
            args.fixes.display()
        )));
    }

    let mut sections = Vec::with_capacity(codes.len());
    for code in codes {
        let route = tools::track::execute_route(&tracker, cli::RouteArgs { code })?;
        sections.push(route.into_text());
    }
    Ok(sections.join("\n"))
}

/// Run in MCP server mode
async fn run_mcp_mode() -> Result<()> {
    // stdout carries protocol frames, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting shalom MCP Server");

    // No CLI flags in this mode; the config path can still come from the environment
    let config_path = std::env::var_os("SHALOM_CONFIG").map(std::path::PathBuf::from);
    let config = config::load_config(config_path.as_deref())?;
    let context = mcp::ServerContext::new(&config)?;

    mcp::handle_stdio(context).await?;

    Ok(())
}
