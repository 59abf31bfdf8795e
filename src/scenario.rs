//! Scenario files: a starting position plus scripted orders.
//!
//! A scenario declares the players, the units and churches they start with,
//! and orders keyed by turn. Each turn's orders run for the player acting in
//! that turn, right after its movement phase begins.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GameConfig;
use crate::error::ScenarioError;
use crate::game::{
    GameState, Grid, MAX_PLAYERS, MoveRejection, PlayerId, Position, RecruitRejection,
    TerrainKind, UnitKind, UnitLevel,
};

/// A declared player. Ids follow declaration order, starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSpec {
    /// Display name.
    pub name: String,
    /// Display color.
    pub color: String,
}

/// A unit placed before the first turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Owning player.
    pub player: PlayerId,
    /// Variant.
    pub kind: UnitKind,
    /// Tier, 1 to 3.
    #[serde(default = "basic_tier")]
    pub level: u32,
    /// Starting cell.
    pub at: Position,
}

const fn basic_tier() -> u32 {
    1
}

/// A church owned before the first turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSpec {
    /// New owner.
    pub player: PlayerId,
    /// Cell of the church.
    pub church: Position,
}

/// One scripted action, issued by whoever is acting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Order {
    /// Move one of the player's movable units from a cell.
    Move {
        /// Cell the unit stands on.
        from: Position,
        /// Destination.
        to: Position,
    },
    /// Set the tithe rate of a church the player owns.
    SetTithe {
        /// Cell of the church.
        church: Position,
        /// Requested rate; clamped into the configured band.
        rate: f64,
    },
    /// Take a church.
    Capture {
        /// Cell of the church.
        church: Position,
    },
    /// Buy a basic unit at the capital or an owned church.
    Recruit {
        /// Variant.
        kind: UnitKind,
        /// Cell to recruit at.
        at: Position,
    },
}

/// An order bound to a turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledOrder {
    /// Turn the order runs in.
    pub turn: u32,
    /// The order itself.
    pub order: Order,
}

/// Why an order was skipped. The game is unchanged in that case.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum OrderError {
    /// No player is acting.
    #[error("no player is acting")]
    NoCurrentPlayer,
    /// The acting player has no unit at the cell that can still move.
    #[error("no movable unit at {0}")]
    NoMovableUnit(Position),
    /// No church at the cell.
    #[error("no church at {0}")]
    NoChurch(Position),
    /// The church belongs to someone else.
    #[error("church at {0} is not owned by the acting player")]
    NotOwner(Position),
    /// The move itself was refused.
    #[error("move refused: {0}")]
    Move(#[from] MoveRejection),
    /// The recruit was refused.
    #[error("recruit refused: {0}")]
    Recruit(#[from] RecruitRejection),
}

impl Order {
    /// Issue the order for the player currently acting.
    ///
    /// # Errors
    ///
    /// Returns why the order could not be carried out.
    pub fn apply(&self, game: &mut GameState) -> Result<(), OrderError> {
        let player = game.current_player().ok_or(OrderError::NoCurrentPlayer)?;
        match *self {
            Order::Move { from, to } => {
                let unit = game
                    .units()
                    .units_at(from)
                    .find(|u| u.owner == player && u.can_move())
                    .map(|u| u.id)
                    .ok_or(OrderError::NoMovableUnit(from))?;
                let outcome = game.move_unit(unit, to)?;
                debug!(%unit, %to, merged = ?outcome.merged, "unit moved");
            }
            Order::SetTithe { church, rate } => {
                let found = game
                    .churches()
                    .church_at(church)
                    .ok_or(OrderError::NoChurch(church))?;
                if found.owner != Some(player) {
                    return Err(OrderError::NotOwner(church));
                }
                let id = found.id;
                game.set_tithe_rate(id, rate);
            }
            Order::Capture { church } => {
                let id = game
                    .churches()
                    .church_at(church)
                    .map(|c| c.id)
                    .ok_or(OrderError::NoChurch(church))?;
                game.capture_church(id, player);
            }
            Order::Recruit { kind, at } => {
                game.recruit(kind, at)?;
            }
        }
        Ok(())
    }

    /// Cells the order refers to.
    fn cells(&self) -> Vec<Position> {
        match *self {
            Order::Move { from, to } => vec![from, to],
            Order::SetTithe { church, .. } | Order::Capture { church } => vec![church],
            Order::Recruit { at, .. } => vec![at],
        }
    }
}

/// A complete starting position with scripted play.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Label shown in reports.
    pub name: String,
    /// Game settings.
    pub config: GameConfig,
    /// Players, in turn order.
    pub players: Vec<PlayerSpec>,
    /// Starting units.
    pub units: Vec<UnitSpec>,
    /// Churches owned from the start.
    pub captures: Vec<CaptureSpec>,
    /// Scripted orders.
    pub orders: Vec<ScheduledOrder>,
}

impl Scenario {
    /// Two players on the standard map with a short opening script.
    #[must_use]
    pub fn standard() -> Self {
        let at = Position::new;
        let knight = |player, x, y| UnitSpec {
            player,
            kind: UnitKind::Knight,
            level: 1,
            at: at(x, y),
        };
        let order = |turn, order| ScheduledOrder { turn, order };

        Self {
            name: "standard".to_string(),
            config: GameConfig::default(),
            players: vec![
                PlayerSpec {
                    name: "Red".to_string(),
                    color: "#FF0000".to_string(),
                },
                PlayerSpec {
                    name: "Blue".to_string(),
                    color: "#0000FF".to_string(),
                },
            ],
            units: vec![knight(1, 2, 2), knight(1, 3, 2), knight(2, 9, 2), knight(2, 10, 2)],
            captures: vec![
                CaptureSpec {
                    player: 1,
                    church: at(3, 7),
                },
                CaptureSpec {
                    player: 2,
                    church: at(9, 3),
                },
            ],
            orders: vec![
                order(1, Order::Move { from: at(3, 2), to: at(2, 2) }),
                order(2, Order::SetTithe { church: at(9, 3), rate: 0.25 }),
                order(2, Order::Move { from: at(9, 2), to: at(10, 2) }),
                order(3, Order::Capture { church: at(6, 5) }),
                order(3, Order::Recruit { kind: UnitKind::Knight, at: at(1, 1) }),
                order(4, Order::Recruit { kind: UnitKind::Bishop, at: at(9, 3) }),
            ],
        }
    }

    /// Parse a scenario from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid scenario JSON.
    pub fn from_json_str(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a scenario from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// A copy generating its map from a different seed.
    #[must_use]
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut scenario = self.clone();
        scenario.config.seed = seed;
        scenario
    }

    /// Orders scheduled for a turn, in file order.
    pub fn orders_for(&self, turn: u32) -> impl Iterator<Item = &Order> {
        self.orders
            .iter()
            .filter(move |o| o.turn == turn)
            .map(|o| &o.order)
    }

    /// Check the scenario can be set up on its map.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.players.is_empty() || self.players.len() > MAX_PLAYERS {
            return Err(ScenarioError::PlayerCount(self.players.len()));
        }

        let config = self.config.sanitized();
        let grid = Grid::generate(
            config.map_width,
            config.map_height,
            &config.terrain_layout(),
            config.seed,
        );
        let in_bounds = |pos: Position| -> Result<(), ScenarioError> {
            if grid.in_bounds(pos) {
                Ok(())
            } else {
                Err(ScenarioError::OutOfBounds(pos))
            }
        };
        let church_at = |pos: Position| -> Result<(), ScenarioError> {
            in_bounds(pos)?;
            let is_church = grid
                .cell_at(pos)
                .is_some_and(|tile| tile.terrain() == TerrainKind::Church);
            if is_church {
                Ok(())
            } else {
                Err(ScenarioError::NotAChurch(pos))
            }
        };
        let declared = |player: PlayerId| -> Result<(), ScenarioError> {
            if player >= 1 && usize::from(player) <= self.players.len() {
                Ok(())
            } else {
                Err(ScenarioError::UnknownPlayer(player))
            }
        };

        for unit in &self.units {
            declared(unit.player)?;
            if UnitLevel::from_tier(unit.level).is_none() {
                return Err(ScenarioError::BadLevel(unit.level));
            }
            in_bounds(unit.at)?;
        }
        for capture in &self.captures {
            declared(capture.player)?;
            church_at(capture.church)?;
        }
        for scheduled in &self.orders {
            if scheduled.turn == 0 || scheduled.turn > config.max_turns {
                return Err(ScenarioError::OrderTurn {
                    turn: scheduled.turn,
                    max_turns: config.max_turns,
                });
            }
            for cell in scheduled.order.cells() {
                in_bounds(cell)?;
            }
            match scheduled.order {
                Order::SetTithe { church, .. } | Order::Capture { church } => church_at(church)?,
                Order::Move { .. } | Order::Recruit { .. } => {}
            }
        }
        Ok(())
    }

    /// Validate, then set up the starting position.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario does not validate.
    pub fn build(&self) -> Result<GameState, ScenarioError> {
        self.validate()?;
        let mut game = GameState::new(&self.config);

        for player in &self.players {
            game.add_player(&player.name, &player.color)
                .ok_or(ScenarioError::PlayerCount(self.players.len()))?;
        }
        for unit in &self.units {
            let level = UnitLevel::from_tier(unit.level).ok_or(ScenarioError::BadLevel(unit.level))?;
            game.spawn_unit(unit.kind, level, unit.player, unit.at)
                .ok_or(ScenarioError::OutOfBounds(unit.at))?;
        }
        for capture in &self.captures {
            let id = game
                .churches()
                .church_at(capture.church)
                .map(|c| c.id)
                .ok_or(ScenarioError::NotAChurch(capture.church))?;
            game.capture_church(id, capture.player);
        }
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_validates() {
        let scenario = Scenario::standard();
        scenario.validate().unwrap();
        let game = scenario.build().unwrap();
        assert_eq!(game.players().len(), 2);
        assert_eq!(game.units().len(), 4);
        assert_eq!(game.churches().owned_by(1).count(), 1);
        assert_eq!(game.churches().owned_by(2).count(), 1);
    }

    #[test]
    fn test_player_count_checked() {
        let mut scenario = Scenario::standard();
        scenario.players.clear();
        assert!(matches!(scenario.validate(), Err(ScenarioError::PlayerCount(0))));

        let extra = scenario_player("Extra");
        scenario.players = vec![extra; MAX_PLAYERS + 1];
        assert!(matches!(scenario.validate(), Err(ScenarioError::PlayerCount(9))));
    }

    fn scenario_player(name: &str) -> PlayerSpec {
        PlayerSpec {
            name: name.to_string(),
            color: "#FFFFFF".to_string(),
        }
    }

    #[test]
    fn test_bad_units_rejected() {
        let mut scenario = Scenario::standard();
        scenario.units[0].level = 4;
        assert!(matches!(scenario.validate(), Err(ScenarioError::BadLevel(4))));

        let mut scenario = Scenario::standard();
        scenario.units[0].player = 3;
        assert!(matches!(scenario.validate(), Err(ScenarioError::UnknownPlayer(3))));

        let mut scenario = Scenario::standard();
        scenario.units[0].at = Position::new(12, 0);
        assert!(matches!(scenario.validate(), Err(ScenarioError::OutOfBounds(_))));
    }

    #[test]
    fn test_capture_must_name_a_church() {
        let mut scenario = Scenario::standard();
        scenario.captures[0].church = Position::new(5, 5);
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::NotAChurch(p)) if p == Position::new(5, 5)
        ));
    }

    #[test]
    fn test_order_turn_range() {
        let mut scenario = Scenario::standard();
        scenario.config.max_turns = 3;
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::OrderTurn { turn: 4, max_turns: 3 })
        ));
    }

    #[test]
    fn test_orders_for_turn() {
        let scenario = Scenario::standard();
        assert_eq!(scenario.orders_for(2).count(), 2);
        assert_eq!(scenario.orders_for(7).count(), 0);
    }

    #[test]
    fn test_move_order_merges() {
        let scenario = Scenario::standard();
        let mut game = scenario.build().unwrap();
        game.advance_phase();

        let order = Order::Move {
            from: Position::new(3, 2),
            to: Position::new(2, 2),
        };
        order.apply(&mut game).unwrap();
        let at_target: Vec<_> = game.units().units_at(Position::new(2, 2)).collect();
        assert_eq!(at_target.len(), 1);
        assert_eq!(at_target[0].level, UnitLevel::Veteran);

        // Nothing left to move from the vacated cell.
        assert_eq!(
            order.apply(&mut game),
            Err(OrderError::NoMovableUnit(Position::new(3, 2)))
        );
    }

    #[test]
    fn test_set_tithe_requires_ownership() {
        let mut game = Scenario::standard().build().unwrap();
        let theirs = Order::SetTithe {
            church: Position::new(9, 3),
            rate: 0.3,
        };
        assert_eq!(
            theirs.apply(&mut game),
            Err(OrderError::NotOwner(Position::new(9, 3)))
        );

        let ours = Order::SetTithe {
            church: Position::new(3, 7),
            rate: 0.9,
        };
        ours.apply(&mut game).unwrap();
        let church = game.churches().church_at(Position::new(3, 7)).unwrap();
        assert!((church.tithe_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_capture_and_recruit_orders() {
        let mut game = Scenario::standard().build().unwrap();
        Order::Capture {
            church: Position::new(6, 5),
        }
        .apply(&mut game)
        .unwrap();
        assert_eq!(game.churches().owned_by(1).count(), 2);

        assert_eq!(
            Order::Capture {
                church: Position::new(5, 5)
            }
            .apply(&mut game),
            Err(OrderError::NoChurch(Position::new(5, 5)))
        );

        let recruit = Order::Recruit {
            kind: UnitKind::Knight,
            at: Position::new(6, 5),
        };
        recruit.apply(&mut game).unwrap();
        assert_eq!(game.players().get(1).unwrap().gold, 80);
    }

    #[test]
    fn test_json_shape() {
        let text = r#"{
            "name": "duel",
            "config": { "max_turns": 4 },
            "players": [
                { "name": "Red", "color": "red" },
                { "name": "Blue", "color": "blue" }
            ],
            "units": [ { "player": 1, "kind": "bishop", "at": { "x": 2, "y": 2 } } ],
            "captures": [ { "player": 2, "church": { "x": 6, "y": 5 } } ],
            "orders": [
                { "turn": 1, "order": { "type": "move", "from": { "x": 2, "y": 2 }, "to": { "x": 2, "y": 3 } } },
                { "turn": 2, "order": { "type": "set_tithe", "church": { "x": 6, "y": 5 }, "rate": 0.2 } }
            ]
        }"#;
        let scenario = Scenario::from_json_str(text).unwrap();
        assert_eq!(scenario.units[0].level, 1);
        assert_eq!(scenario.config.max_turns, 4);
        assert_eq!(scenario.config.map_width, 12);
        assert!(matches!(scenario.orders[1].order, Order::SetTithe { .. }));
        scenario.validate().unwrap();
    }
}
