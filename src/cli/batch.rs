//! Batch command implementation.

use super::output::{JsonBatchResult, format_batch_text};
use super::{CliError, OutputFormat, load_scenario, scenario_label};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tithe::run_batch;

/// Execute the batch command.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or does not validate.
pub(crate) fn execute(
    path: Option<PathBuf>,
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    format: OutputFormat,
    progress: bool,
) -> Result<(), CliError> {
    let scenario = load_scenario(path.as_deref())?;
    let label = scenario_label(path.as_deref(), &scenario);
    let base_seed = seed.unwrap_or(scenario.config.seed);

    // Progress bar
    let pb = if progress {
        let pb = ProgressBar::new(games);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games")
            .map_err(|e| CliError::new(format!("invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let summary = run_batch(&scenario, games, base_seed, threads)?;

    // Games fold per thread, so the bar only moves once they are all merged.
    if let Some(pb) = pb {
        pb.set_position(summary.games_played + summary.games_failed);
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    #[allow(clippy::cast_precision_loss)]
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        summary.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match format {
        OutputFormat::Text => {
            println!();
            print!("{}", format_batch_text(&summary, &label));
            println!();
            println!("Duration: {:.2}s ({games_per_sec:.0} games/sec)", duration.as_secs_f64());
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonBatchResult::from_summary(&summary))?;
            println!("{json}");
        }
    }

    Ok(())
}
