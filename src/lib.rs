// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Tithe: a deterministic turn-based simulation of churches, faith and gold.
//!
//! Players own churches that collect tithes from their followers and push
//! faith into the surrounding cells. Higher tithes pay more now but slow
//! follower growth. Units move around the map and merge into stronger tiers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Scenario Runner (batch, rayon)    │
//! ├─────────────────────────────────────┤
//! │   Scenario files & scripted orders  │
//! ├─────────────────────────────────────┤
//! │   Game Logic (phases, registries)   │
//! └─────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod runner;
pub mod scenario;

pub use config::{ConfigError, GameConfig, InfluenceConfig, TitheConfig};
pub use error::ScenarioError;

// Re-export key game types at crate root for convenience
pub use game::{GameState, Grid, Phase, PhaseOutcome, Player, PlayerId, Position, Tile};
pub use runner::{BatchSummary, GameResult, run_batch, run_scenario};
pub use scenario::{Order, Scenario};
