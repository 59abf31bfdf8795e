//! Scenario validation command implementation.

use super::CliError;
use std::path::PathBuf;
use tithe::{GameState, Scenario};

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or set up.
pub(crate) fn execute(path: PathBuf) -> Result<(), CliError> {
    println!("Validating: {}", path.display());
    println!();

    let scenario = match Scenario::load(&path) {
        Ok(scenario) => {
            print_check("Scenario JSON", true);
            scenario
        }
        Err(e) => {
            print_check("Scenario JSON", false);
            return Err(CliError::new(format!("{}: {e}", path.display())));
        }
    };

    let game = match scenario.build() {
        Ok(game) => {
            print_check("Starting position", true);
            game
        }
        Err(e) => {
            print_check("Starting position", false);
            return Err(e.into());
        }
    };

    println!();
    print_summary(&scenario, &game);
    println!();
    println!("Validation successful!");

    Ok(())
}

fn print_summary(scenario: &Scenario, game: &GameState) {
    let config = game.config();
    println!("Summary:");
    println!("  Map:          {}x{} (seed {})", config.map_width, config.map_height, config.seed);
    println!("  Turns:        {}", config.max_turns);
    println!("  Players:      {}", game.players().len());
    println!("  Churches:     {}", game.churches().iter().count());
    println!("  Units:        {}", game.units().len());
    println!("  Orders:       {}", scenario.orders.len());
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    println!("  {name}... {status}");
}
