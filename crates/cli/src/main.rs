//! Energy Forecasting CLI
//!
//! A command-line tool for checking the forecasting API and requesting
//! predictions from it.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{predict, status};
use std::path::PathBuf;

/// Energy Forecasting CLI
#[derive(Parser)]
#[command(name = "forecast")]
#[command(author, version, about = "CLI for the Energy Forecasting API", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via FORECAST_API_URL env var)
    #[arg(long, env = "FORECAST_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show service health and model state
    Health,

    /// Show the served model version and endpoints
    Info,

    /// Request a forecast for one or more sequences
    Predict {
        /// Sequences as a JSON array of arrays, e.g. '[[0.1, 0.2, 0.3]]'
        #[arg(long, short, conflicts_with = "file", required_unless_present = "file")]
        sequences: Option<String>,

        /// Read the request body from a JSON file
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Health => status::show_health(&client, cli.format).await?,
        Commands::Info => status::show_info(&client, cli.format).await?,
        Commands::Predict { sequences, file } => {
            let source = match (sequences, file) {
                (Some(inline), _) => predict::Source::Inline(inline),
                (None, Some(path)) => predict::Source::File(path),
                (None, None) => anyhow::bail!("Either --sequences or --file is required"),
            };
            predict::run_prediction(&client, source, cli.format).await?;
        }
    }

    Ok(())
}
