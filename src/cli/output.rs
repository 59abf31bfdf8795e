//! Output formatting utilities for CLI.

use serde::Serialize;
use tithe::{BatchSummary, GameResult};

/// Format a game result as human-readable text.
pub(super) fn format_text(result: &GameResult, label: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Game Result: {label} (seed: {})\n", result.seed));
    match result.leader {
        Some(id) => {
            let name = result
                .players
                .iter()
                .find(|p| p.id == id)
                .map_or("Unknown", |p| p.name.as_str());
            output.push_str(&format!("  Leader: Player {id} ({name})\n"));
        }
        None => output.push_str("  Leader: none (tied)\n"),
    }
    output.push_str(&format!("  Turns: {}\n", result.turns_played));
    output.push_str(&format!(
        "  Orders: {} applied, {} rejected\n\n",
        result.orders_applied, result.orders_rejected
    ));

    for player in &result.players {
        output.push_str(&format!(
            "  Player {} ({}): {} gold, {} territory, {} churches, {} followers, {} units\n",
            player.id,
            player.name,
            player.gold,
            player.territory,
            player.churches,
            player.followers,
            player.units
        ));
    }

    output
}

/// JSON-serializable batch result.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchResult {
    /// Games that ran to the end.
    games_played: u64,
    /// Games that could not be set up.
    games_failed: u64,
    /// Games without a single territory leader.
    ties: u64,
    /// Mean game length in turns.
    mean_turns: f64,
    /// Per-player statistics.
    players: Vec<JsonBatchPlayer>,
}

/// JSON-serializable per-player batch stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchPlayer {
    /// Player ID (1-8).
    player: u8,
    /// Player name.
    name: String,
    /// Games led on territory.
    territory_wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Mean final gold.
    mean_gold: f64,
    /// Mean final territory.
    mean_territory: f64,
}

impl JsonBatchResult {
    /// Create from a batch summary.
    pub(super) fn from_summary(summary: &BatchSummary) -> Self {
        let players = summary
            .players
            .iter()
            .enumerate()
            .map(|(i, stats)| JsonBatchPlayer {
                player: stats.id,
                name: stats.name.clone(),
                territory_wins: stats.territory_wins,
                win_rate: summary.win_rate(i),
                mean_gold: summary.mean_gold(i),
                mean_territory: summary.mean_territory(i),
            })
            .collect();

        Self {
            games_played: summary.games_played,
            games_failed: summary.games_failed,
            ties: summary.ties,
            mean_turns: summary.mean_turns(),
            players,
        }
    }
}

/// Format batch statistics as human-readable text.
pub(super) fn format_batch_text(summary: &BatchSummary, label: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Batch Results: {label} ({} games)\n",
        summary.games_played
    ));
    output.push_str("========================================\n\n");

    output.push_str("Territory Leads:\n");
    for (i, stats) in summary.players.iter().enumerate() {
        output.push_str(&format!(
            "  Player {} ({}): {:.1}% ({} games)\n",
            stats.id,
            stats.name,
            summary.win_rate(i) * 100.0,
            stats.territory_wins
        ));
    }
    output.push_str(&format!("  Ties: {}\n\n", summary.ties));

    output.push_str("Averages:\n");
    for (i, stats) in summary.players.iter().enumerate() {
        output.push_str(&format!(
            "  Player {} ({}): {:.1} gold, {:.1} territory\n",
            stats.id,
            stats.name,
            summary.mean_gold(i),
            summary.mean_territory(i)
        ));
    }
    output.push_str(&format!(
        "\nMean game length: {:.1} turns\n",
        summary.mean_turns()
    ));
    if summary.games_failed > 0 {
        output.push_str(&format!("Skipped games: {}\n", summary.games_failed));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use tithe::{Scenario, run_scenario};

    #[test]
    fn test_format_text_lists_players() {
        let mut scenario = Scenario::standard();
        scenario.config.max_turns = 2;
        scenario.orders.retain(|o| o.turn <= 2);
        let result = run_scenario(&scenario).unwrap();

        let text = format_text(&result, "standard");
        assert!(text.contains("Game Result: standard"));
        assert!(text.contains("Player 1 (Red)"));
        assert!(text.contains("Player 2 (Blue)"));
        assert!(text.contains("Turns: 2"));
        assert!(text.contains("rejected\n\n  Player 1 (Red)"));
        assert!(text.ends_with(" units\n"));
    }

    #[test]
    fn test_batch_text_layout() {
        let scenario = Scenario::standard();
        let mut summary = BatchSummary::new(&scenario);
        summary.games_failed = 2;

        let text = format_batch_text(&summary, "standard");
        assert!(text.starts_with("Batch Results: standard (0 games)\n====="));
        assert!(text.contains("  Ties: 0\n\nAverages:\n"));
        assert!(text.contains("\n\nMean game length: 0.0 turns\n"));
        assert!(text.ends_with("Skipped games: 2\n"));
    }

    #[test]
    fn test_batch_json_shape() {
        let scenario = Scenario::standard();
        let summary = BatchSummary::new(&scenario);
        let json = serde_json::to_value(JsonBatchResult::from_summary(&summary)).unwrap();
        assert_eq!(json["games_played"], 0);
        assert_eq!(json["players"][1]["name"], "Blue");
        assert!(format_batch_text(&summary, "x").contains("Ties: 0"));
    }
}
