//! Cluster Capacity Report CLI
//!
//! Polls Prism Central instances, joins cluster inventory with grouped
//! metrics and RF2 storage figures, and writes one row per cluster.

mod commands;
mod config;
mod export;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{report, targets as target_list};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Cluster Capacity Report
#[derive(Parser)]
#[command(name = "ccr")]
#[command(author, version, about = "Cluster Capacity Report for Prism Central", long_about = None)]
pub struct Cli {
    /// Prism user for Central and Element endpoints
    #[arg(long, env = "CCR_USERNAME", default_value = "admin", global = true)]
    pub username: String,

    /// Prism password (prompted on stdin if not given)
    #[arg(long, env = "CCR_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Validate Prism TLS certificates (self-signed certificates are accepted by default)
    #[arg(long, global = true)]
    pub verify_tls: bool,

    /// Settings file (defaults to ./ccr.toml, then ~/.config/ccr/config.toml)
    #[arg(long, env = "CCR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll every target and write the capacity report
    Report {
        /// CSV file listing Prism Central addresses
        #[arg(long, short, env = "CCR_TARGETS", default_value = "targets.csv")]
        targets: PathBuf,

        /// Directory the report file is written to
        #[arg(long, short, env = "CCR_OUTPUT_DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Print the report without writing a file
        #[arg(long)]
        no_export: bool,
    },

    /// List the targets parsed from the targets file
    Targets {
        /// CSV file listing Prism Central addresses
        #[arg(long, short, env = "CCR_TARGETS", default_value = "targets.csv")]
        targets: PathBuf,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    match &cli.command {
        Commands::Report {
            targets,
            output_dir,
            no_export,
        } => {
            report::run_report(&cli, targets, output_dir, *no_export).await?;
        }
        Commands::Targets { targets } => {
            target_list::list_targets(targets, cli.format)?;
        }
    }

    Ok(())
}
