//! Smartcab CLI - Train and test a Q-learning cab in a simulated grid world

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use smartcab_core::util::load_env_file;
use smartcab_sim::Config;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{config, report, run};

#[derive(Parser)]
#[command(name = "smartcab")]
#[command(author, version, about = "Smartcab - a self-driving cab that learns traffic rules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train and test an agent
    Run(run::RunArgs),

    /// Grade the testing trials of a metrics log
    Report(report::ReportArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

/// Level for smartcab's own targets: `--verbose` wins, then the configured
/// `simulation.log_level`, then `info`
fn default_log_level(verbose: bool, configured: Option<&str>) -> String {
    if verbose {
        return "debug".to_string();
    }
    configured.unwrap_or("info").to_lowercase()
}

/// Configured log level, read before the subscriber exists
fn configured_log_level(cli: &Cli) -> Option<String> {
    let config = match &cli.command {
        Commands::Run(args) if args.config.is_some() => Config::load_from(args.config.as_deref()),
        _ => Config::load(),
    };
    config.ok().map(|c| c.simulation.log_level)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from smartcab.env file (before parsing args)
    let env_file = load_env_file();

    let cli = Cli::parse();

    let log_level = default_log_level(cli.verbose, configured_log_level(&cli).as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("smartcab={log_level},smartcab_rl={log_level},smartcab_sim={log_level}")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some((path, applied)) = env_file {
        debug!("Loaded {} variable(s) from {}", applied, path.display());
    }

    match cli.command {
        Commands::Run(args) => {
            tokio::select! {
                result = run::run(args) => result,
                () = shutdown_signal() => {
                    error!("Interrupted, simulation aborted");
                    Ok(())
                }
            }
        }
        Commands::Report(args) => report::run(&args).await,
        Commands::Config(cmd) => config::run(cmd).await,
    }
}

/// Wait for shutdown signal (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}. Using Ctrl+C only.", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
