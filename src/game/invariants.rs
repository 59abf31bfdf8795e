//! Game invariants - sanity checks that detect bugs.
//!
//! None of these should ever trigger through the public API. If one does,
//! a registry or the phase controller has let an inconsistent state through.

use crate::game::{GameState, MAX_FAITH, TerrainKind};

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invariant violation: {message}")]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    fn new(message: String) -> Self {
        Self { message }
    }
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let grid = state.grid();

    for tile in grid.iter() {
        let pos = tile.position();
        if tile.faith() > MAX_FAITH {
            violations.push(InvariantViolation::new(format!(
                "Cell {pos} has faith {} > {MAX_FAITH}",
                tile.faith()
            )));
        }
        if (tile.faith() > 0) != tile.controller().is_some() {
            violations.push(InvariantViolation::new(format!(
                "Cell {pos} has faith {} but controller {:?}",
                tile.faith(),
                tile.controller()
            )));
        }
    }

    let tithe = state.churches().tithe_config();
    for church in state.churches().iter() {
        let on_church = grid
            .cell_at(church.position)
            .is_some_and(|tile| tile.terrain() == TerrainKind::Church);
        if !on_church {
            violations.push(InvariantViolation::new(format!(
                "{} at {} is not on church terrain",
                church.id, church.position
            )));
        }
        if church.tithe_rate < tithe.min_rate || church.tithe_rate > tithe.max_rate {
            violations.push(InvariantViolation::new(format!(
                "{} tithe rate {} outside [{}, {}]",
                church.id, church.tithe_rate, tithe.min_rate, tithe.max_rate
            )));
        }
    }

    for unit in state.units().iter() {
        if !grid.in_bounds(unit.position) {
            violations.push(InvariantViolation::new(format!(
                "{} is off the map at {}",
                unit.id, unit.position
            )));
        }
        if unit.health > unit.max_health {
            violations.push(InvariantViolation::new(format!(
                "{} has health {} > max {}",
                unit.id, unit.health, unit.max_health
            )));
        }
        if unit.movement_remaining > unit.max_movement {
            violations.push(InvariantViolation::new(format!(
                "{} has movement {} > max {}",
                unit.id, unit.movement_remaining, unit.max_movement
            )));
        }
    }

    if state.turn() == 0 || state.turn() > state.config().max_turns {
        violations.push(InvariantViolation::new(format!(
            "Turn {} outside [1, {}]",
            state.turn(),
            state.config().max_turns
        )));
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}
