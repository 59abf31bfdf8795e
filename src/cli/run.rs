//! Run command implementation.

use super::output::format_text;
use super::{CliError, OutputFormat, load_scenario, scenario_label};
use std::path::PathBuf;
use tithe::run_scenario;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or played.
pub(crate) fn execute(
    path: Option<PathBuf>,
    seed: Option<u64>,
    turns: Option<u32>,
    format: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    let mut scenario = load_scenario(path.as_deref())?;
    if let Some(seed) = seed {
        scenario.config.seed = seed;
    }
    if let Some(turns) = turns {
        scenario.config.max_turns = turns;
    }
    let label = scenario_label(path.as_deref(), &scenario);

    if !quiet && format == OutputFormat::Text {
        println!("Running {label} with seed {}...", scenario.config.seed);
        let names: Vec<&str> = scenario.players.iter().map(|p| p.name.as_str()).collect();
        println!("Players: {}", names.join(", "));
        println!();
    }

    let result = run_scenario(&scenario)?;

    match format {
        OutputFormat::Text => print!("{}", format_text(&result, &label)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(())
}
