//! CLI command implementations for Tithe.

pub(crate) mod batch;
pub(crate) mod run;
pub(crate) mod validate;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;
use std::path::Path;
use tithe::{Scenario, ScenarioError};

/// Output format for the `run` and `batch` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<ScenarioError> for CliError {
    fn from(e: ScenarioError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}

/// Load a scenario file, or the built-in scenario when none is given.
fn load_scenario(path: Option<&Path>) -> Result<Scenario, CliError> {
    match path {
        Some(path) => Scenario::load(path)
            .map_err(|e| CliError::new(format!("{}: {e}", path.display()))),
        None => Ok(Scenario::standard()),
    }
}

/// Display label for a scenario source.
fn scenario_label(path: Option<&Path>, scenario: &Scenario) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None if scenario.name.is_empty() => "built-in".to_string(),
        None => scenario.name.clone(),
    }
}
