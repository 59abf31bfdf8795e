//! Simulation core for Tithe.
//!
//! Implements the game rules:
//! - Map with terrain, faith strength and per-cell control
//! - Units with movement budgets and merging
//! - Churches with followers, tithes and faith influence
//! - Players with gold, faith and capitals
//! - The turn/phase controller tying them together

mod church;
mod invariants;
mod map;
mod player;
mod state;
mod terrain;
mod unit;

pub use church::{Church, ChurchId, ChurchRegistry};
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use map::{Grid, MAX_FAITH, Position, Tile};
pub use player::{Player, PlayerId, PlayerRegistry};
pub use state::{GameState, MAX_PLAYERS, Phase, PhaseOutcome, RecruitRejection};
pub use terrain::{TerrainKind, TerrainLayout, TerrainModifiers, TerrainRule};
pub use unit::{
    HEALTH_PER_LEVEL, MoveOutcome, MoveRejection, MovementRule, Unit, UnitId, UnitKind, UnitLevel,
    UnitRegistry,
};
