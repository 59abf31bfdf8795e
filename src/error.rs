//! Error types for loading and checking scenarios.

use crate::game::{PlayerId, Position};

/// Why a scenario could not be loaded or is unplayable.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The file could not be read.
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid scenario JSON.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
    /// Games need between 1 and 8 players.
    #[error("scenario has {0} players, expected 1 to 8")]
    PlayerCount(usize),
    /// A unit or capture names a player the scenario never declares.
    #[error("player {0} is not declared")]
    UnknownPlayer(PlayerId),
    /// A cell lies outside the map.
    #[error("{0} is off the map")]
    OutOfBounds(Position),
    /// Unit tiers run 1 to 3.
    #[error("unit level {0} is not 1, 2 or 3")]
    BadLevel(u32),
    /// A church reference points at a cell without a church.
    #[error("no church at {0}")]
    NotAChurch(Position),
    /// An order is scheduled for a turn the game never reaches.
    #[error("order scheduled for turn {turn}, game ends after turn {max_turns}")]
    OrderTurn {
        /// Scheduled turn.
        turn: u32,
        /// Last turn of the game.
        max_turns: u32,
    },
}
