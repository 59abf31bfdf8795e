//! Map, cell and position types.

use serde::{Deserialize, Serialize};

use crate::game::{PlayerId, TerrainKind, TerrainLayout};

/// Highest faith strength a cell can hold.
pub const MAX_FAITH: u8 = 100;

/// A cell position on the map. May lie outside the map; queries then miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row).
    pub y: i32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position.
    #[must_use]
    pub const fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Squared Euclidean distance to another position, saturating at `i64::MAX`.
    #[must_use]
    pub fn distance_sq(self, other: Position) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single map cell.
///
/// Terrain is fixed at generation. Faith strength and controller change
/// together so that a cell with strength 0 never has a controller and a
/// controlled cell always has strength above 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    position: Position,
    terrain: TerrainKind,
    controller: Option<PlayerId>,
    faith: u8,
}

impl Tile {
    /// Create an unclaimed tile.
    #[must_use]
    pub const fn new(position: Position, terrain: TerrainKind) -> Self {
        Self {
            position,
            terrain,
            controller: None,
            faith: 0,
        }
    }

    /// Position of this tile.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Terrain of this tile.
    #[must_use]
    pub const fn terrain(&self) -> TerrainKind {
        self.terrain
    }

    /// Player whose faith holds this tile.
    #[must_use]
    pub const fn controller(&self) -> Option<PlayerId> {
        self.controller
    }

    /// Faith strength in [0, 100].
    #[must_use]
    pub const fn faith(&self) -> u8 {
        self.faith
    }

    /// Set controller and strength together, clamping strength to 100.
    ///
    /// Strength 0 or no controller leaves the tile unclaimed.
    pub fn set_faith(&mut self, controller: Option<PlayerId>, strength: u8) {
        let strength = strength.min(MAX_FAITH);
        match controller {
            Some(player) if strength > 0 => {
                self.controller = Some(player);
                self.faith = strength;
            }
            _ => {
                self.controller = None;
                self.faith = 0;
            }
        }
    }
}

/// The game map. Terrain is computed for every cell up front and never regenerated.
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    /// Tiles stored in row-major order.
    tiles: Vec<Tile>,
}

impl Grid {
    /// Generate a map from a terrain layout and seed.
    ///
    /// Dimensions below 1 are clamped to 1.
    #[must_use]
    pub fn generate(width: i32, height: i32, layout: &TerrainLayout, seed: u64) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let terrain = layout.generate(width, height, seed);
        Self::from_terrain(width, height, &terrain)
    }

    /// Build a map from explicit row-major terrain. Missing cells become plain.
    #[must_use]
    pub fn from_terrain(width: i32, height: i32, terrain: &[TerrainKind]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut tiles = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let idx = tiles.len();
                let kind = terrain.get(idx).copied().unwrap_or(TerrainKind::Plain);
                tiles.push(Tile::new(Position::new(x, y), kind));
            }
        }
        Self {
            width,
            height,
            tiles,
        }
    }

    /// Width of the map in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height of the map in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Check if a position is within the map bounds.
    #[must_use]
    pub const fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    #[allow(clippy::cast_sign_loss)]
    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Get the tile at a position.
    #[must_use]
    pub fn cell_at(&self, pos: Position) -> Option<&Tile> {
        self.index(pos).map(|idx| &self.tiles[idx])
    }

    /// Get a mutable tile at a position.
    #[must_use]
    pub fn cell_at_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        self.index(pos).map(|idx| &mut self.tiles[idx])
    }

    /// Set faith on a cell. Returns `false` when the position is off the map.
    pub fn set_faith(&mut self, pos: Position, controller: Option<PlayerId>, strength: u8) -> bool {
        match self.cell_at_mut(pos) {
            Some(tile) => {
                tile.set_faith(controller, strength);
                true
            }
            None => false,
        }
    }

    /// Up to eight surrounding tiles, orthogonal first, then diagonal.
    #[must_use]
    pub fn neighbors(&self, pos: Position) -> Vec<&Tile> {
        const DIRECTIONS: [(i32, i32); 8] = [
            (-1, 0),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (1, -1),
            (-1, 1),
            (1, 1),
        ];
        DIRECTIONS
            .iter()
            .filter_map(|(dx, dy)| self.cell_at(Position::new(pos.x + dx, pos.y + dy)))
            .collect()
    }

    /// Positions of every in-bounds cell within Euclidean distance `radius` of `center`.
    ///
    /// The result is a filled disc in row-major order. `center` itself may be
    /// off the map.
    #[must_use]
    pub fn positions_in_radius(&self, center: Position, radius: u32) -> Vec<Position> {
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        let r_sq = i64::from(radius).saturating_mul(i64::from(radius));
        let y_range = center.y.saturating_sub(r).max(0)..=center.y.saturating_add(r).min(self.height - 1);
        let x_lo = center.x.saturating_sub(r).max(0);
        let x_hi = center.x.saturating_add(r).min(self.width - 1);

        let mut out = Vec::new();
        for y in y_range {
            for x in x_lo..=x_hi {
                let pos = Position::new(x, y);
                if pos.distance_sq(center) <= r_sq {
                    out.push(pos);
                }
            }
        }
        out
    }

    /// Every in-bounds tile within Euclidean distance `radius` of `center`.
    #[must_use]
    pub fn cells_in_radius(&self, center: Position, radius: u32) -> Vec<&Tile> {
        self.positions_in_radius(center, radius)
            .into_iter()
            .filter_map(|pos| self.cell_at(pos))
            .collect()
    }

    /// Iterate over all tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Positions of all tiles with the given terrain, row-major.
    #[must_use]
    pub fn cells_of(&self, terrain: TerrainKind) -> Vec<Position> {
        self.iter()
            .filter(|tile| tile.terrain() == terrain)
            .map(Tile::position)
            .collect()
    }

    /// Count tiles held by a player's faith.
    #[must_use]
    pub fn count_controlled(&self, player: PlayerId) -> u32 {
        let count = self
            .iter()
            .filter(|tile| tile.controller() == Some(player))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}
