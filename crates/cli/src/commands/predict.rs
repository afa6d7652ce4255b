//! Prediction command

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tabled::Tabled;

use crate::client::{ApiClient, PredictionResponse};
use crate::output::{format_value, print_info, print_json, print_table, OutputFormat};

/// Where the sequences come from
pub enum Source {
    /// JSON array of arrays given on the command line
    Inline(String),
    /// File holding either a full request body or a bare array
    File(PathBuf),
}

/// Row of the forecast summary table
#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Sequence")]
    sequence: usize,
    #[tabled(rename = "Steps")]
    steps: usize,
    #[tabled(rename = "First")]
    first: String,
    #[tabled(rename = "Last")]
    last: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
}

impl ForecastRow {
    fn from_prediction(sequence: usize, values: &[f32]) -> Self {
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let cell = |v: Option<f32>| v.map(format_value).unwrap_or_else(|| "-".to_string());

        Self {
            sequence,
            steps: values.len(),
            first: cell(values.first().copied()),
            last: cell(values.last().copied()),
            min: cell((!values.is_empty()).then_some(min)),
            max: cell((!values.is_empty()).then_some(max)),
        }
    }
}

/// Build the request body; a bare array is wrapped as `sequences`
fn request_body(source: Source) -> Result<Value> {
    let raw = match source {
        Source::Inline(text) => text,
        Source::File(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
    };

    let value: Value = serde_json::from_str(&raw).context("Sequences are not valid JSON")?;

    Ok(match value {
        Value::Object(_) => value,
        other => json!({ "sequences": other }),
    })
}

/// Send sequences to the API and print the forecast
pub async fn run_prediction(client: &ApiClient, source: Source, format: OutputFormat) -> Result<()> {
    let body = request_body(source)?;
    let result: PredictionResponse = client.post("predict", &body).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!(
                "{} {}",
                "Forecast from model".bold(),
                result.model_version.cyan()
            );

            let rows: Vec<ForecastRow> = result
                .predictions
                .iter()
                .enumerate()
                .map(|(i, values)| ForecastRow::from_prediction(i, values))
                .collect();
            print_table(&rows);

            if result.model_version == "dummy" {
                print_info("Served by the fallback forecaster");
            }
        }
    }

    Ok(())
}
