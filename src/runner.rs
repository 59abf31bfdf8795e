//! Scenario runner.
//!
//! Provides a pure function interface: `scenario -> GameResult`
//!
//! The runner handles:
//! - Building the starting position from a scenario
//! - Issuing each turn's scripted orders when its movement phase begins
//! - Driving phases until the game ends
//! - Running many seeds in parallel with rayon and aggregating the results

// Averages over game counts; counts stay far below 2^52.
#![allow(clippy::cast_precision_loss)]

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ScenarioError;
use crate::game::{GameState, Phase, PhaseOutcome, PlayerId, assert_invariants};
use crate::scenario::Scenario;

/// Final standing of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Gold on hand.
    pub gold: u64,
    /// Faith on hand.
    pub faith: u64,
    /// Cells held at the last influence phase.
    pub territory: u32,
    /// Churches owned.
    pub churches: usize,
    /// Followers across owned churches.
    pub followers: u64,
    /// Units fielded.
    pub units: usize,
}

/// Final result of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameResult {
    /// Seed the map was generated from.
    pub seed: u64,
    /// Last turn played.
    pub turns_played: u32,
    /// Player holding the most territory, `None` on a tie or an empty map.
    pub leader: Option<PlayerId>,
    /// Orders carried out.
    pub orders_applied: u32,
    /// Orders skipped because the game refused them.
    pub orders_rejected: u32,
    /// Per-player standings, in turn order.
    pub players: Vec<PlayerSummary>,
}

impl GameResult {
    fn from_game(game: &GameState, orders_applied: u32, orders_rejected: u32) -> Self {
        let players: Vec<PlayerSummary> = game
            .players()
            .iter()
            .map(|player| PlayerSummary {
                id: player.id,
                name: player.name.clone(),
                gold: player.gold,
                faith: player.faith,
                territory: player.territory,
                churches: game.churches().owned_by(player.id).count(),
                followers: game.churches().owned_by(player.id).map(|c| c.followers).sum(),
                units: game.units().units_of(player.id).count(),
            })
            .collect();

        Self {
            seed: game.config().seed,
            turns_played: game.turn(),
            leader: territory_leader(&players),
            orders_applied,
            orders_rejected,
            players,
        }
    }
}

fn territory_leader(players: &[PlayerSummary]) -> Option<PlayerId> {
    let best = players.iter().map(|p| p.territory).max().filter(|&t| t > 0)?;
    let mut top = players.iter().filter(|p| p.territory == best);
    let leader = top.next()?;
    if top.next().is_some() {
        return None;
    }
    Some(leader.id)
}

/// Play a scenario to the end.
///
/// Rejected orders are logged and skipped. In debug builds every phase is
/// followed by an invariant check.
///
/// # Errors
///
/// Returns an error if the scenario does not validate.
pub fn run_scenario(scenario: &Scenario) -> Result<GameResult, ScenarioError> {
    let mut game = scenario.build()?;
    let mut applied = 0u32;
    let mut rejected = 0u32;

    loop {
        match game.advance_phase() {
            PhaseOutcome::Entered(Phase::Movement) => {
                let turn = game.turn();
                for order in scenario.orders_for(turn) {
                    match order.apply(&mut game) {
                        Ok(()) => applied += 1,
                        Err(error) => {
                            warn!(turn, player = ?game.current_player(), ?order, %error, "order rejected");
                            rejected += 1;
                        }
                    }
                }
            }
            PhaseOutcome::GameEnded | PhaseOutcome::AlreadyEnded => break,
            PhaseOutcome::Entered(_) | PhaseOutcome::TurnStarted { .. } => {}
        }
        assert_invariants(&game);
    }

    let result = GameResult::from_game(&game, applied, rejected);
    debug!(seed = result.seed, leader = ?result.leader, "game finished");
    Ok(result)
}

/// Per-player totals across a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchPlayerStats {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Games this player finished as territory leader.
    pub territory_wins: u64,
    /// Gold summed over games.
    pub total_gold: u64,
    /// Territory summed over games.
    pub total_territory: u64,
}

/// Aggregated results of many games of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Games that ran to the end.
    pub games_played: u64,
    /// Games that could not be set up for their seed.
    pub games_failed: u64,
    /// Games with no single territory leader.
    pub ties: u64,
    /// Turns summed over games.
    pub total_turns: u64,
    /// Per-player totals, in turn order.
    pub players: Vec<BatchPlayerStats>,
}

impl BatchSummary {
    /// Empty totals for a scenario's players.
    #[must_use]
    pub fn new(scenario: &Scenario) -> Self {
        let players = scenario
            .players
            .iter()
            .enumerate()
            .map(|(idx, spec)| BatchPlayerStats {
                id: PlayerId::try_from(idx + 1).unwrap_or(PlayerId::MAX),
                name: spec.name.clone(),
                territory_wins: 0,
                total_gold: 0,
                total_territory: 0,
            })
            .collect();
        Self {
            games_played: 0,
            games_failed: 0,
            ties: 0,
            total_turns: 0,
            players,
        }
    }

    /// Fold one game into the totals.
    pub fn add_result(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_turns += u64::from(result.turns_played);
        if result.leader.is_none() {
            self.ties += 1;
        }

        for summary in &result.players {
            if let Some(stats) = self.players.iter_mut().find(|s| s.id == summary.id) {
                stats.total_gold += summary.gold;
                stats.total_territory += u64::from(summary.territory);
                if result.leader == Some(summary.id) {
                    stats.territory_wins += 1;
                }
            }
        }
    }

    /// Combine totals gathered on another thread.
    pub fn merge(&mut self, other: &BatchSummary) {
        self.games_played += other.games_played;
        self.games_failed += other.games_failed;
        self.ties += other.ties;
        self.total_turns += other.total_turns;
        for (mine, theirs) in self.players.iter_mut().zip(&other.players) {
            mine.territory_wins += theirs.territory_wins;
            mine.total_gold += theirs.total_gold;
            mine.total_territory += theirs.total_territory;
        }
    }

    /// Mean gold a player finished with.
    #[must_use]
    pub fn mean_gold(&self, idx: usize) -> f64 {
        self.mean(self.players.get(idx).map_or(0, |s| s.total_gold))
    }

    /// Mean territory a player finished with.
    #[must_use]
    pub fn mean_territory(&self, idx: usize) -> f64 {
        self.mean(self.players.get(idx).map_or(0, |s| s.total_territory))
    }

    /// Share of games a player led on territory (0.0-1.0).
    #[must_use]
    pub fn win_rate(&self, idx: usize) -> f64 {
        self.mean(self.players.get(idx).map_or(0, |s| s.territory_wins))
    }

    /// Mean game length in turns.
    #[must_use]
    pub fn mean_turns(&self) -> f64 {
        self.mean(self.total_turns)
    }

    fn mean(&self, total: u64) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        total as f64 / self.games_played as f64
    }
}

/// Play `games` copies of a scenario, seeded `base_seed`, `base_seed + 1`, ...
///
/// Games run in parallel. With `threads` set they run on a dedicated pool of
/// that size, otherwise on rayon's global pool.
///
/// # Errors
///
/// Returns an error if the scenario does not validate for `base_seed`.
pub fn run_batch(
    scenario: &Scenario,
    games: u64,
    base_seed: u64,
    threads: Option<usize>,
) -> Result<BatchSummary, ScenarioError> {
    scenario.with_seed(base_seed).validate()?;

    // Each thread folds into its own summary; they are merged at the end.
    let play = || {
        (0..games)
            .into_par_iter()
            .fold(
                || BatchSummary::new(scenario),
                |mut local, i| {
                    let seed = base_seed.wrapping_add(i);
                    match run_scenario(&scenario.with_seed(seed)) {
                        Ok(result) => local.add_result(&result),
                        Err(error) => {
                            debug!(seed, %error, "game skipped");
                            local.games_failed += 1;
                        }
                    }
                    local
                },
            )
            .reduce(
                || BatchSummary::new(scenario),
                |mut a, b| {
                    a.merge(&b);
                    a
                },
            )
    };

    let summary = match threads.map(|n| rayon::ThreadPoolBuilder::new().num_threads(n).build()) {
        Some(Ok(pool)) => pool.install(play),
        Some(Err(error)) => {
            warn!(%error, "could not build thread pool, using the global one");
            play()
        }
        None => play(),
    };
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_scenario(turns: u32) -> Scenario {
        let mut scenario = Scenario::standard();
        scenario.config.max_turns = turns;
        scenario.orders.retain(|o| o.turn <= turns);
        scenario
    }

    #[test]
    fn test_standard_scenario_runs() {
        let result = run_scenario(&Scenario::standard()).unwrap();
        assert_eq!(result.turns_played, 50);
        assert_eq!(result.players.len(), 2);
        assert_eq!(result.orders_applied, 6);
        assert_eq!(result.orders_rejected, 0);

        let red = &result.players[0];
        assert_eq!(red.churches, 2);
        // Two knights merged into one, plus a recruit.
        assert_eq!(red.units, 2);
        let blue = &result.players[1];
        assert_eq!(blue.churches, 1);
        assert_eq!(blue.units, 2);
    }

    #[test]
    fn test_rejected_orders_are_skipped() {
        let mut scenario = short_scenario(2);
        // Turn 2 belongs to Blue, who owns nothing at (3, 7).
        scenario.orders.push(crate::scenario::ScheduledOrder {
            turn: 2,
            order: crate::scenario::Order::SetTithe {
                church: crate::game::Position::new(3, 7),
                rate: 0.4,
            },
        });
        let result = run_scenario(&scenario).unwrap();
        assert_eq!(result.orders_rejected, 1);
        assert_eq!(result.orders_applied, 3);
    }

    #[test]
    fn test_runs_are_deterministic() {
        let scenario = short_scenario(8);
        let a = run_scenario(&scenario.with_seed(7)).unwrap();
        let b = run_scenario(&scenario.with_seed(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_scenario_errors() {
        let mut scenario = Scenario::standard();
        scenario.players.clear();
        assert!(run_scenario(&scenario).is_err());
        assert!(run_batch(&scenario, 4, 0, Some(1)).is_err());
    }

    #[test]
    fn test_territory_leader() {
        let summary = |id, territory| PlayerSummary {
            id,
            name: String::new(),
            gold: 0,
            faith: 0,
            territory,
            churches: 0,
            followers: 0,
            units: 0,
        };
        assert_eq!(territory_leader(&[summary(1, 5), summary(2, 9)]), Some(2));
        assert_eq!(territory_leader(&[summary(1, 9), summary(2, 9)]), None);
        assert_eq!(territory_leader(&[summary(1, 0)]), None);
    }

    #[test]
    fn test_batch_matches_sequential_runs() {
        let scenario = short_scenario(4);
        let summary = run_batch(&scenario, 6, 100, Some(2)).unwrap();
        assert_eq!(summary.games_played, 6);
        assert_eq!(summary.games_failed, 0);
        assert!((summary.mean_turns() - 4.0).abs() < f64::EPSILON);

        let mut expected = BatchSummary::new(&scenario);
        for seed in 100..106 {
            expected.add_result(&run_scenario(&scenario.with_seed(seed)).unwrap());
        }
        assert_eq!(summary, expected);
    }

    #[test]
    fn test_empty_batch() {
        let summary = run_batch(&short_scenario(2), 0, 0, None).unwrap();
        assert_eq!(summary.games_played, 0);
        assert!(summary.mean_gold(0).abs() < f64::EPSILON);
        assert!(summary.win_rate(5).abs() < f64::EPSILON);
    }
}
