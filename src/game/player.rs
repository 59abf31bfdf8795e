//! Player state management.

use crate::game::Position;

/// Unique identifier for a player.
pub type PlayerId = u8;

/// State for a single player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Unique identifier for this player.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Display color, e.g. `#FF0000`.
    pub color: String,
    /// Gold balance.
    pub gold: u64,
    /// Faith balance.
    pub faith: u64,
    /// Cells held by this player's faith at the last count.
    pub territory: u32,
    /// Castle the player recruits from, if the map had one to give.
    pub capital: Option<Position>,
    /// Whether the player is still in the game.
    pub active: bool,
}

/// Owns every player. Iteration follows registration order.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    initial_gold: u64,
    initial_faith: u64,
}

impl PlayerRegistry {
    /// Create an empty registry handing out the given starting balances.
    #[must_use]
    pub fn new(initial_gold: u64, initial_faith: u64) -> Self {
        Self {
            players: Vec::new(),
            initial_gold,
            initial_faith,
        }
    }

    /// Register a player. An existing player with the same id is replaced in place.
    pub fn create(&mut self, id: PlayerId, name: &str, color: &str) -> &Player {
        let player = Player {
            id,
            name: name.to_string(),
            color: color.to_string(),
            gold: self.initial_gold,
            faith: self.initial_faith,
            territory: 0,
            capital: None,
            active: true,
        };
        let idx = match self.players.iter().position(|p| p.id == id) {
            Some(idx) => {
                self.players[idx] = player;
                idx
            }
            None => {
                self.players.push(player);
                self.players.len() - 1
            }
        };
        &self.players[idx]
    }

    /// Get a player by ID.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Get a mutable reference to a player by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Iterate over players in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Number of registered players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no player is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// First registered player.
    #[must_use]
    pub fn first(&self) -> Option<PlayerId> {
        self.players.first().map(|p| p.id)
    }

    /// Player after `id` in registration order, wrapping around.
    #[must_use]
    pub fn next_after(&self, id: PlayerId) -> Option<PlayerId> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        let next = (idx + 1) % self.players.len();
        Some(self.players[next].id)
    }

    /// Credit gold to a player.
    pub fn add_gold(&mut self, id: PlayerId, amount: u64) {
        if let Some(player) = self.get_mut(id) {
            player.gold = player.gold.saturating_add(amount);
        }
    }

    /// Spend gold. Returns `false` and changes nothing if the balance is short.
    pub fn spend_gold(&mut self, id: PlayerId, amount: u64) -> bool {
        match self.get_mut(id) {
            Some(player) if player.gold >= amount => {
                player.gold -= amount;
                true
            }
            _ => false,
        }
    }

    /// Credit faith to a player.
    pub fn add_faith(&mut self, id: PlayerId, amount: u64) {
        if let Some(player) = self.get_mut(id) {
            player.faith = player.faith.saturating_add(amount);
        }
    }

    /// Record a player's territory count.
    pub fn update_territory_count(&mut self, id: PlayerId, tiles: u32) {
        if let Some(player) = self.get_mut(id) {
            player.territory = tiles;
        }
    }

    /// Assign a player's capital.
    pub fn set_capital(&mut self, id: PlayerId, capital: Position) {
        if let Some(player) = self.get_mut(id) {
            player.capital = Some(capital);
        }
    }
}
