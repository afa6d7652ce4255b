//! Health and info commands

use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, HealthResponse, InfoResponse};
use crate::output::{color_status, print_json, print_warning, OutputFormat};

/// Show service health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthResponse = client.get("health").await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("{}", "Service Health".bold());
            println!("{}", "=".repeat(50));
            println!("Status:                 {}", color_status(&health.status));
            println!("Model:                  {}", color_status(&health.model));
            println!("Model Version:          {}", health.model_version.cyan());
            println!("Checked At:             {}", health.timestamp);

            if health.model == "dummy" {
                println!();
                print_warning("No trained model is loaded; forecasts are random placeholders");
            }
        }
    }

    Ok(())
}

/// Show model and endpoint information
pub async fn show_info(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info: InfoResponse = client.get("info").await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            let loaded = if info.model_loaded {
                "yes".green()
            } else {
                "no".yellow()
            };

            println!("{}", "Model Information".bold());
            println!("{}", "=".repeat(50));
            println!("Model Version:          {}", info.model_version.cyan());
            println!("Model Loaded:           {}", loaded);
            println!("Tracking URI:           {}", info.tracking_uri);
            println!();
            println!("{}", "Endpoints".bold());
            println!("{}", "-".repeat(50));
            for endpoint in &info.endpoints {
                println!("  {}", endpoint);
            }
        }
    }

    Ok(())
}
