//! Game state and the turn/phase controller.

use tracing::{debug, info};

use crate::config::GameConfig;
use crate::game::{
    ChurchId, ChurchRegistry, Grid, MoveOutcome, MoveRejection, PlayerId, PlayerRegistry,
    Position, TerrainKind, UnitId, UnitKind, UnitLevel, UnitRegistry,
};

/// Maximum number of players in a game.
pub const MAX_PLAYERS: usize = 8;

/// A sub-step of a turn, in fixed cyclic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Churches pay tithes to the current player.
    Economic,
    /// The current player's units get fresh movement.
    Movement,
    /// Churches push faith into the surrounding cells.
    Influence,
    /// Churches gain followers from secured territory.
    Maintenance,
}

impl Phase {
    /// Phase that follows this one, wrapping Maintenance back to Economic.
    #[must_use]
    pub const fn next(self) -> Phase {
        match self {
            Phase::Economic => Phase::Movement,
            Phase::Movement => Phase::Influence,
            Phase::Influence => Phase::Maintenance,
            Phase::Maintenance => Phase::Economic,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Economic => "economic",
            Phase::Movement => "movement",
            Phase::Influence => "influence",
            Phase::Maintenance => "maintenance",
        };
        f.write_str(name)
    }
}

/// What a call to [`GameState::advance_phase`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// A new phase began and its effect ran.
    Entered(Phase),
    /// The turn wrapped: the counter moved on and the next player is up.
    TurnStarted {
        /// New turn number.
        turn: u32,
        /// Player now acting.
        player: Option<PlayerId>,
    },
    /// The last turn finished; the game is over.
    GameEnded,
    /// The game was already over. Nothing changed.
    AlreadyEnded,
}

/// Why a recruit order was refused. Nothing changes in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecruitRejection {
    /// The game is over.
    #[error("the game is over")]
    GameOver,
    /// No player is registered.
    #[error("no player is acting")]
    NoCurrentPlayer,
    /// The cell is neither the player's capital nor a church they own.
    #[error("cannot recruit at {0}")]
    NotEligible(Position),
    /// Not enough gold.
    #[error("recruiting costs {cost} gold, only {gold} available")]
    InsufficientGold {
        /// Recruit cost.
        cost: u64,
        /// Gold on hand.
        gold: u64,
    },
}

/// Complete game state. The only entry point that mutates state across registries.
#[derive(Debug, Clone)]
pub struct GameState {
    config: GameConfig,
    grid: Grid,
    units: UnitRegistry,
    churches: ChurchRegistry,
    players: PlayerRegistry,
    /// Current turn number (1-based, never above `max_turns`).
    turn: u32,
    phase: Phase,
    current_player: Option<PlayerId>,
    ended: bool,
}

impl GameState {
    /// Build a fresh game: generate the map and discover its churches.
    ///
    /// The config is sanitized first, so out-of-range values are clamped.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        let config = config.sanitized();
        let layout = config.terrain_layout();
        let grid = Grid::generate(config.map_width, config.map_height, &layout, config.seed);
        Self::with_grid(config, grid)
    }

    /// Build a game on an existing map.
    #[must_use]
    pub fn with_grid(mut config: GameConfig, grid: Grid) -> Self {
        // The grid decides the map size.
        config.map_width = grid.width();
        config.map_height = grid.height();
        let config = config.sanitized();
        let units = UnitRegistry::new(
            grid.width(),
            grid.height(),
            config.movement,
            config.enforce_movement_range,
        );
        let mut churches = ChurchRegistry::new(config.tithe, config.influence);
        churches.discover_from_grid(&grid);
        let players = PlayerRegistry::new(config.initial_gold, config.initial_faith);

        Self {
            config,
            grid,
            units,
            churches,
            players,
            turn: 1,
            phase: Phase::Economic,
            current_player: None,
            ended: false,
        }
    }

    /// The configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current turn number.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Player currently acting.
    #[must_use]
    pub const fn current_player(&self) -> Option<PlayerId> {
        self.current_player
    }

    /// Check if the game is over.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.ended
    }

    /// The map.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// All units.
    #[must_use]
    pub const fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// All churches.
    #[must_use]
    pub const fn churches(&self) -> &ChurchRegistry {
        &self.churches
    }

    /// All players.
    #[must_use]
    pub const fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    /// Register a player and hand them the next free castle as capital.
    ///
    /// Ids are assigned 1, 2, ... in registration order. The first player
    /// registered acts first. Returns `None` once [`MAX_PLAYERS`] is reached.
    pub fn add_player(&mut self, name: &str, color: &str) -> Option<PlayerId> {
        if self.players.len() >= MAX_PLAYERS {
            return None;
        }
        let id = PlayerId::try_from(self.players.len() + 1).ok()?;
        self.players.create(id, name, color);

        let taken: Vec<Position> = self.players.iter().filter_map(|p| p.capital).collect();
        let capital = self
            .grid
            .cells_of(TerrainKind::Castle)
            .into_iter()
            .find(|pos| !taken.contains(pos));
        if let Some(capital) = capital {
            self.players.set_capital(id, capital);
        }

        if self.current_player.is_none() {
            self.current_player = Some(id);
        }
        debug!(id, name, ?capital, "player joined");
        Some(id)
    }

    /// Place a unit during scenario setup.
    ///
    /// Returns `None` if the cell is off the map or the owner is unknown.
    pub fn spawn_unit(
        &mut self,
        kind: UnitKind,
        level: UnitLevel,
        owner: PlayerId,
        position: Position,
    ) -> Option<UnitId> {
        if !self.grid.in_bounds(position) || self.players.get(owner).is_none() {
            return None;
        }
        Some(self.units.spawn(kind, level, owner, position))
    }

    /// Move a unit. Phase is not checked; the unit's own per-turn state is.
    ///
    /// # Errors
    ///
    /// Returns the reason the move was refused.
    pub fn move_unit(&mut self, id: UnitId, target: Position) -> Result<MoveOutcome, MoveRejection> {
        self.units.move_unit(id, target)
    }

    /// Cells a unit could move to this turn.
    #[must_use]
    pub fn valid_movement_tiles(&self, id: UnitId) -> Vec<Position> {
        self.units.valid_movement_tiles(id)
    }

    /// Hand a church to a registered player.
    pub fn capture_church(&mut self, id: ChurchId, player: PlayerId) -> bool {
        if self.players.get(player).is_none() {
            return false;
        }
        self.churches.capture(id, player)
    }

    /// Set a church's tithe rate, clamped into the configured band.
    pub fn set_tithe_rate(&mut self, id: ChurchId, rate: f64) -> Option<f64> {
        self.churches.set_tithe_rate(id, rate)
    }

    /// Recruit a basic unit for the current player.
    ///
    /// The cell must be the player's capital or a church they own.
    ///
    /// # Errors
    ///
    /// Returns why the recruit was refused.
    pub fn recruit(&mut self, kind: UnitKind, at: Position) -> Result<UnitId, RecruitRejection> {
        if self.ended {
            return Err(RecruitRejection::GameOver);
        }
        let player_id = self.current_player.ok_or(RecruitRejection::NoCurrentPlayer)?;
        let player = self
            .players
            .get(player_id)
            .ok_or(RecruitRejection::NoCurrentPlayer)?;

        let at_capital = player.capital == Some(at);
        let at_church = self
            .churches
            .church_at(at)
            .is_some_and(|church| church.owner == Some(player_id));
        if !at_capital && !at_church {
            return Err(RecruitRejection::NotEligible(at));
        }

        let cost = self.config.recruit_cost(kind);
        let gold = player.gold;
        if !self.players.spend_gold(player_id, cost) {
            return Err(RecruitRejection::InsufficientGold { cost, gold });
        }
        Ok(self.units.spawn(kind, UnitLevel::Basic, player_id, at))
    }

    /// Move to the next phase and run its effect.
    ///
    /// Leaving the Economic phase first settles it: connections refresh and
    /// the current player collects tithes. Wrapping from Maintenance back to
    /// Economic advances the turn instead of running a phase.
    pub fn advance_phase(&mut self) -> PhaseOutcome {
        if self.ended {
            return PhaseOutcome::AlreadyEnded;
        }
        if self.phase == Phase::Economic {
            self.settle_economy();
        }

        let next = self.phase.next();
        if next == Phase::Economic {
            return self.advance_turn();
        }

        self.phase = next;
        debug!(turn = self.turn, phase = %next, "entered phase");
        match next {
            Phase::Economic => {}
            Phase::Movement => {
                if let Some(player) = self.current_player {
                    self.units.reset_for_turn(player);
                }
            }
            Phase::Influence => {
                self.churches.expand_influence(&mut self.grid);
                self.refresh_territory();
            }
            Phase::Maintenance => self.churches.grow_all_followers(&self.grid),
        }
        PhaseOutcome::Entered(next)
    }

    /// Close the turn: bump the counter and hand play to the next player.
    ///
    /// Passing `max_turns` ends the game. The new turn starts in the Economic
    /// phase without running it.
    pub fn advance_turn(&mut self) -> PhaseOutcome {
        if self.ended {
            return PhaseOutcome::AlreadyEnded;
        }
        if self.turn >= self.config.max_turns {
            self.ended = true;
            info!(turn = self.turn, "game over");
            return PhaseOutcome::GameEnded;
        }

        self.turn += 1;
        self.current_player = self
            .current_player
            .and_then(|id| self.players.next_after(id))
            .or_else(|| self.players.first());
        self.phase = Phase::Economic;
        info!(turn = self.turn, player = ?self.current_player, "turn started");
        PhaseOutcome::TurnStarted {
            turn: self.turn,
            player: self.current_player,
        }
    }

    fn settle_economy(&mut self) {
        let Some(player) = self.current_player else {
            return;
        };
        self.churches.update_connections();
        let income = self.churches.collect_tithes(player);
        self.players.add_gold(player, income);
        debug!(turn = self.turn, player, income, "economy settled");
    }

    fn refresh_territory(&mut self) {
        let ids: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        for id in ids {
            let count = self.grid.count_controlled(id);
            self.players.update_territory_count(id, count);
        }
    }

    /// Advance phases until the game ends.
    pub fn run_to_end(&mut self) {
        while !self.ended {
            self.advance_phase();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_game() -> GameState {
        let mut game = GameState::new(&GameConfig::default());
        game.add_player("Red", "#FF0000");
        game.add_player("Blue", "#0000FF");
        game
    }

    #[test]
    fn test_initial_state() {
        let game = create_test_game();
        assert_eq!(game.turn(), 1);
        assert_eq!(game.phase(), Phase::Economic);
        assert_eq!(game.current_player(), Some(1));
        assert!(!game.is_game_over());
        assert_eq!(game.churches().iter().count(), 3);
    }

    #[test]
    fn test_with_grid_takes_map_size_from_grid() {
        let config = GameConfig {
            movement: crate::game::MovementRule::Flat(1_000),
            ..GameConfig::default()
        };
        let grid = Grid::from_terrain(20, 6, &[]);
        let mut game = GameState::with_grid(config, grid);

        assert_eq!(game.config().map_width, 20);
        assert_eq!(game.config().map_height, 6);
        assert_eq!(game.config().movement, crate::game::MovementRule::Flat(26));

        game.add_player("Red", "#FF0000");
        let id = game
            .spawn_unit(UnitKind::Knight, UnitLevel::Basic, 1, Position::new(19, 5))
            .unwrap();
        assert_eq!(game.units().valid_movement_tiles(id).len(), 20 * 6 - 1);
    }

    #[test]
    fn test_capitals_assigned_from_castles() {
        let game = create_test_game();
        assert_eq!(game.players().get(1).unwrap().capital, Some(Position::new(1, 1)));
        assert_eq!(game.players().get(2).unwrap().capital, Some(Position::new(10, 1)));
    }

    #[test]
    fn test_phase_cycle() {
        let mut game = create_test_game();
        assert_eq!(game.advance_phase(), PhaseOutcome::Entered(Phase::Movement));
        assert_eq!(game.advance_phase(), PhaseOutcome::Entered(Phase::Influence));
        assert_eq!(game.advance_phase(), PhaseOutcome::Entered(Phase::Maintenance));
        assert_eq!(
            game.advance_phase(),
            PhaseOutcome::TurnStarted {
                turn: 2,
                player: Some(2)
            }
        );
        assert_eq!(game.phase(), Phase::Economic);

        for _ in 0..4 {
            game.advance_phase();
        }
        assert_eq!(game.turn(), 3);
        assert_eq!(game.current_player(), Some(1));
    }

    #[test]
    fn test_game_end_is_terminal() {
        let config = GameConfig {
            max_turns: 2,
            ..GameConfig::default()
        };
        let mut game = GameState::new(&config);
        game.add_player("Red", "#FF0000");

        for _ in 0..7 {
            game.advance_phase();
        }
        assert!(!game.is_game_over());
        assert_eq!(game.advance_phase(), PhaseOutcome::GameEnded);
        assert!(game.is_game_over());
        assert_eq!(game.turn(), 2);

        let phase = game.phase();
        assert_eq!(game.advance_phase(), PhaseOutcome::AlreadyEnded);
        assert_eq!(game.advance_turn(), PhaseOutcome::AlreadyEnded);
        assert_eq!(game.phase(), phase);
        assert_eq!(game.turn(), 2);
    }

    #[test]
    fn test_economy_settles_once_per_turn() {
        let mut game = create_test_game();
        let church = game.churches().iter().next().unwrap().id;
        assert!(game.capture_church(church, 1));

        game.advance_phase();
        assert_eq!(game.players().get(1).unwrap().gold, 105);
        for _ in 0..3 {
            game.advance_phase();
        }
        assert_eq!(game.players().get(1).unwrap().gold, 105);
        assert_eq!(game.players().get(2).unwrap().gold, 100);
    }

    #[test]
    fn test_movement_phase_resets_current_player_units() {
        let mut game = create_test_game();
        let unit = game
            .spawn_unit(UnitKind::Knight, UnitLevel::Basic, 1, Position::new(3, 3))
            .unwrap();
        game.move_unit(unit, Position::new(3, 4)).unwrap();
        assert!(game.valid_movement_tiles(unit).is_empty());

        game.advance_phase();
        assert!(game.units().get(unit).unwrap().can_move());
    }

    #[test]
    fn test_influence_updates_territory() {
        let mut game = create_test_game();
        let church = game.churches().iter().next().unwrap().id;
        game.capture_church(church, 1);
        game.advance_phase();
        game.advance_phase();
        assert_eq!(game.phase(), Phase::Influence);
        assert_eq!(game.players().get(1).unwrap().territory, 13);
    }

    #[test]
    fn test_spawn_unit_checks() {
        let mut game = create_test_game();
        assert!(game.spawn_unit(UnitKind::Knight, UnitLevel::Basic, 1, Position::new(-1, 0)).is_none());
        assert!(game.spawn_unit(UnitKind::Knight, UnitLevel::Basic, 9, Position::new(2, 2)).is_none());
        assert!(game.spawn_unit(UnitKind::Bishop, UnitLevel::Elite, 2, Position::new(2, 2)).is_some());
    }

    #[test]
    fn test_recruit() {
        let mut game = create_test_game();
        let capital = Position::new(1, 1);
        let id = game.recruit(UnitKind::Bishop, capital).unwrap();
        assert_eq!(game.units().get(id).unwrap().owner, 1);
        assert_eq!(game.players().get(1).unwrap().gold, 50);

        assert_eq!(
            game.recruit(UnitKind::Bishop, capital),
            Ok(UnitId(2))
        );
        assert_eq!(
            game.recruit(UnitKind::Knight, capital),
            Err(RecruitRejection::InsufficientGold { cost: 20, gold: 0 })
        );
        assert_eq!(
            game.recruit(UnitKind::Knight, Position::new(5, 5)),
            Err(RecruitRejection::NotEligible(Position::new(5, 5)))
        );
    }

    #[test]
    fn test_recruit_at_owned_church() {
        let mut game = create_test_game();
        let church = *game.churches().iter().next().unwrap();
        assert!(game.recruit(UnitKind::Knight, church.position).is_err());
        game.capture_church(church.id, 1);
        assert!(game.recruit(UnitKind::Knight, church.position).is_ok());
    }

    #[test]
    fn test_player_cap() {
        let mut game = GameState::new(&GameConfig::default());
        for i in 0..MAX_PLAYERS {
            assert!(game.add_player(&format!("P{i}"), "#FFFFFF").is_some());
        }
        assert!(game.add_player("extra", "#000000").is_none());
    }
}
