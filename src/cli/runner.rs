//! CLI runner - executes commands

use crate::cli::batch::{parse_time, QueryBatch};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::engine::{check_health, QueryDataResponse, QueryEngine};
use crate::error::{Error, Result, ResultExt};
use crate::settings::Settings;
use crate::types::TimeRange;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Instant;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Query { queries, from, to } => {
                self.query(queries, from.as_deref(), to.as_deref()).await
            }
            Commands::Check => self.check(),
            Commands::Serve { port } => {
                let settings = self.load_settings()?;
                crate::cli::serve(settings, *port).await
            }
        }
    }

    /// Load settings, falling back to defaults when no file is given
    fn load_settings(&self) -> Result<Settings> {
        match &self.cli.settings {
            Some(path) => Settings::from_file(path)
                .with_context(|| format!("Failed to load settings {}", path.display())),
            None => Ok(Settings::default()),
        }
    }

    /// Run a batch of queries
    async fn query(&self, path: &Path, from: Option<&str>, to: Option<&str>) -> Result<()> {
        let settings = self.load_settings()?;
        let mut batch = QueryBatch::from_file(path)?;
        if let Some(range) = resolve_range(batch.range, from, to)? {
            batch = batch.with_range(range);
        }

        let engine = QueryEngine::new(settings)?;
        let start = Instant::now();
        let response = engine.query_data(&batch.into_request()).await;

        tracing::info!(
            queries = response.len(),
            errors = response.error_count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Queries complete"
        );

        self.output_response(&response)
    }

    /// Check settings
    fn check(&self) -> Result<()> {
        let settings = self.load_settings()?;
        let result = check_health(&settings);

        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": result,
        }));

        if result.is_ok() {
            Ok(())
        } else {
            Err(Error::config(result.message))
        }
    }

    fn output_response(&self, response: &QueryDataResponse) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => {
                for (ref_id, data) in &response.responses {
                    let mut rendered = data.to_json()?;
                    rendered["refId"] = Value::String(ref_id.clone());
                    self.output_message(&rendered);
                }
            }
            OutputFormat::Pretty => {
                for (ref_id, data) in &response.responses {
                    println!("== {ref_id} ==");
                    if let Some(error) = &data.error {
                        println!("error: {error}");
                    }
                    for frame in &data.frames {
                        if let Some(custom) = &frame.meta.custom {
                            if !custom.error.is_empty() {
                                println!("error: {}", custom.error);
                            }
                        }
                        if !frame.meta.executed_query_string.is_empty() {
                            println!("query: {}", frame.meta.executed_query_string);
                        }
                        let table = frame.pretty()?;
                        if !table.is_empty() {
                            println!("{table}");
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Output a JSON message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Combine the batch range with `--from`/`--to` overrides
fn resolve_range(
    batch: Option<TimeRange>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<TimeRange>> {
    if from.is_none() && to.is_none() {
        return Ok(batch);
    }
    let base = batch.unwrap_or_default();
    let from = from.map(parse_time).transpose()?.unwrap_or(base.from);
    let to = to.map(parse_time).transpose()?.unwrap_or(base.to);
    if from > to {
        return Err(Error::config("--from must not be after --to"));
    }
    Ok(Some(TimeRange::new(from, to)))
}
