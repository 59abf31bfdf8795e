//! Terrain kinds, their static modifiers, and the rule set used to lay out a map.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::game::Position;

/// Kind of terrain on a cell. Assigned once at map generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    /// Open ground.
    Plain,
    /// Woodland, slows movement.
    Forest,
    /// Raised ground with a range bonus.
    Hill,
    /// Rough high ground.
    Mountain,
    /// Running water.
    River,
    /// Marshland.
    Swamp,
    /// Fast travel.
    Road,
    /// Small settlement.
    Village,
    /// Church site; each one hosts exactly one church.
    Church,
    /// Player base.
    Castle,
}

/// Static per-terrain modifiers. Never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainModifiers {
    /// Movement cost multiplier.
    pub movement: f32,
    /// Defense multiplier.
    pub defense: f32,
    /// Attack multiplier.
    pub attack: f32,
    /// Extra range granted to units standing here.
    pub range_bonus: u8,
}

impl TerrainKind {
    /// Every terrain kind, in declaration order.
    pub const ALL: [TerrainKind; 10] = [
        TerrainKind::Plain,
        TerrainKind::Forest,
        TerrainKind::Hill,
        TerrainKind::Mountain,
        TerrainKind::River,
        TerrainKind::Swamp,
        TerrainKind::Road,
        TerrainKind::Village,
        TerrainKind::Church,
        TerrainKind::Castle,
    ];

    /// Look up the modifier table entry for this terrain.
    #[must_use]
    pub const fn modifiers(self) -> TerrainModifiers {
        let (movement, defense, attack, range_bonus) = match self {
            TerrainKind::Plain => (1.0, 1.0, 1.0, 0),
            TerrainKind::Forest => (1.5, 1.25, 0.9, 0),
            TerrainKind::Hill => (1.25, 1.1, 1.1, 1),
            TerrainKind::Mountain => (2.0, 1.5, 1.0, 1),
            TerrainKind::River => (2.0, 0.8, 0.8, 0),
            TerrainKind::Swamp => (2.0, 0.9, 0.9, 0),
            TerrainKind::Road => (0.5, 1.0, 1.0, 0),
            TerrainKind::Village => (1.0, 1.3, 1.0, 0),
            TerrainKind::Church => (1.0, 1.5, 1.0, 0),
            TerrainKind::Castle => (1.0, 2.0, 1.0, 1),
        };
        TerrainModifiers {
            movement,
            defense,
            attack,
            range_bonus,
        }
    }
}

/// A single terrain placement rule.
///
/// Rules are evaluated in priority order by a [`TerrainLayout`]; the first one
/// that claims a cell decides its terrain and later rules are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TerrainRule {
    /// Fixed list of cells.
    Sites {
        /// Terrain to place.
        terrain: TerrainKind,
        /// Cells that receive it.
        cells: Vec<Position>,
    },
    /// Outermost ring of the map.
    Border {
        /// Terrain to place.
        terrain: TerrainKind,
    },
    /// Inclusive rectangle between two corners.
    Band {
        /// Terrain to place.
        terrain: TerrainKind,
        /// First corner.
        from: Position,
        /// Opposite corner.
        to: Position,
    },
    /// Random placement: claims the cell when its roll in [0, 1) is below `below`.
    Scatter {
        /// Terrain to place.
        terrain: TerrainKind,
        /// Roll threshold.
        below: f64,
    },
}

impl TerrainRule {
    /// Return the terrain this rule assigns to `pos`, if it claims the cell.
    #[must_use]
    pub fn claim(&self, pos: Position, width: i32, height: i32, roll: f64) -> Option<TerrainKind> {
        match self {
            TerrainRule::Sites { terrain, cells } => cells.contains(&pos).then_some(*terrain),
            TerrainRule::Border { terrain } => {
                let edge = pos.x == 0 || pos.y == 0 || pos.x == width - 1 || pos.y == height - 1;
                edge.then_some(*terrain)
            }
            TerrainRule::Band { terrain, from, to } => {
                let inside = (from.x.min(to.x)..=from.x.max(to.x)).contains(&pos.x)
                    && (from.y.min(to.y)..=from.y.max(to.y)).contains(&pos.y);
                inside.then_some(*terrain)
            }
            TerrainRule::Scatter { terrain, below } => (roll < *below).then_some(*terrain),
        }
    }
}

/// Ordered terrain rules. Cells no rule claims become [`TerrainKind::Plain`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainLayout {
    /// Rules, highest priority first.
    pub rules: Vec<TerrainRule>,
}

impl TerrainLayout {
    /// The standard layout for a map of the given size.
    ///
    /// Castle corners, then a mountain border, then church sites spread over
    /// the interior, then scattered forest, hill and village, then plain.
    #[must_use]
    pub fn standard(width: i32, height: i32) -> Self {
        let castles = vec![
            Position::new(1, 1),
            Position::new(width - 2, height - 2),
            Position::new(width - 2, 1),
            Position::new(1, height - 2),
        ];
        let churches = vec![
            Position::new(width / 2, height / 2),
            Position::new(width / 4, height * 7 / 10),
            Position::new(width * 3 / 4, height * 3 / 10),
        ];

        // Scatter thresholds are cumulative over the same roll.
        Self {
            rules: vec![
                TerrainRule::Sites {
                    terrain: TerrainKind::Castle,
                    cells: castles,
                },
                TerrainRule::Border {
                    terrain: TerrainKind::Mountain,
                },
                TerrainRule::Sites {
                    terrain: TerrainKind::Church,
                    cells: churches,
                },
                TerrainRule::Scatter {
                    terrain: TerrainKind::Forest,
                    below: 0.2,
                },
                TerrainRule::Scatter {
                    terrain: TerrainKind::Hill,
                    below: 0.3,
                },
                TerrainRule::Scatter {
                    terrain: TerrainKind::Village,
                    below: 0.35,
                },
            ],
        }
    }

    /// Resolve the terrain of one cell.
    #[must_use]
    pub fn resolve(&self, pos: Position, width: i32, height: i32, roll: f64) -> TerrainKind {
        self.rules
            .iter()
            .find_map(|rule| rule.claim(pos, width, height, roll))
            .unwrap_or(TerrainKind::Plain)
    }

    /// Lay out a whole `width` × `height` map in row-major order.
    ///
    /// Every cell consumes exactly one roll from a `ChaCha8Rng` seeded with
    /// `seed`, whether or not a random rule ends up deciding it.
    #[must_use]
    pub fn generate(&self, width: i32, height: i32, seed: u64) -> Vec<TerrainKind> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut cells = Vec::with_capacity(cell_count(width, height));
        for y in 0..height {
            for x in 0..width {
                let roll: f64 = rng.random();
                cells.push(self.resolve(Position::new(x, y), width, height, roll));
            }
        }
        cells
    }
}

#[allow(clippy::cast_sign_loss)]
fn cell_count(width: i32, height: i32) -> usize {
    (width.max(0) as usize) * (height.max(0) as usize)
}
