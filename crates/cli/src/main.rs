//! # Session Broker CLI
//!
//! Command-line interface for the Keystone session broker.
//!
//! ## Usage
//!
//! ```bash
//! session-broker serve      # Start the HTTP server
//! session-broker validate   # Check the environment configuration
//! session-broker --help     # Show help
//! ```

mod commands;
mod config;
mod serve;

use clap::{CommandFactory as _, Parser};
use commands::Commands;
use error::Result;

/// Keystone session broker
#[derive(Parser, Debug)]
#[command(name = "session-broker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Output format (json, pretty, compact)
    #[arg(short, long, env = "BROKER_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    /// Also write logs to this file, rotated hourly
    #[arg(long, env = "BROKER_LOG_FILE")]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = logging::init(&cli.log_level, &cli.log_format, cli.log_file.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    logging::info!(target: "app", command = ?cli.command, "Session broker starting...");

    match cli.command {
        Commands::Serve(args) => serve::serve(&args).await?,
        Commands::Completions(args) => commands::completions::completions(args.shell, &mut Cli::command())?,
        Commands::Validate => commands::validate::validate()?,
    }

    logging::info!(target: "app", "Session broker stopped");
    Ok(())
}
