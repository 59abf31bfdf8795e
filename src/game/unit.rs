//! Units, movement and merging.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::{PlayerId, Position};

/// Base health per unit level.
pub const HEALTH_PER_LEVEL: u32 = 100;

/// Unique identifier for a unit. Never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// Unit variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Melee unit.
    Knight,
    /// Support caster.
    Bishop,
}

/// Unit tier, ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitLevel {
    /// Tier 1.
    Basic = 1,
    /// Tier 2.
    Veteran = 2,
    /// Tier 3, the highest. Elite units do not merge.
    Elite = 3,
}

impl UnitLevel {
    /// Numeric tier, 1 to 3.
    #[must_use]
    pub const fn tier(self) -> u32 {
        self as u32
    }

    /// The next tier up, if any.
    #[must_use]
    pub const fn next(self) -> Option<UnitLevel> {
        match self {
            UnitLevel::Basic => Some(UnitLevel::Veteran),
            UnitLevel::Veteran => Some(UnitLevel::Elite),
            UnitLevel::Elite => None,
        }
    }

    /// Parse a numeric tier.
    #[must_use]
    pub const fn from_tier(tier: u32) -> Option<UnitLevel> {
        match tier {
            1 => Some(UnitLevel::Basic),
            2 => Some(UnitLevel::Veteran),
            3 => Some(UnitLevel::Elite),
            _ => None,
        }
    }
}

/// How a unit's movement budget is derived from its level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "cells", rename_all = "snake_case")]
pub enum MovementRule {
    /// One cell per tier.
    #[default]
    PerLevel,
    /// Same budget at every tier.
    Flat(u32),
}

impl MovementRule {
    /// Movement budget for a level.
    #[must_use]
    pub const fn budget(self, level: UnitLevel) -> u32 {
        match self {
            MovementRule::PerLevel => level.tier(),
            MovementRule::Flat(cells) => cells,
        }
    }
}

/// A unit on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    /// Unique identifier.
    pub id: UnitId,
    /// Variant.
    pub kind: UnitKind,
    /// Tier.
    pub level: UnitLevel,
    /// Owning player.
    pub owner: PlayerId,
    /// Current cell.
    pub position: Position,
    /// Movement left this turn.
    pub movement_remaining: u32,
    /// Movement budget restored each turn.
    pub max_movement: u32,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Whether the unit moved this turn.
    pub has_moved: bool,
    /// Whether the unit attacked this turn. Nothing sets it yet.
    pub has_attacked: bool,
}

impl Unit {
    /// Whether the unit may still move this turn.
    #[must_use]
    pub const fn can_move(&self) -> bool {
        !self.has_moved && self.movement_remaining > 0
    }

    /// Restore movement and clear per-turn flags.
    pub fn reset_for_turn(&mut self) {
        self.has_moved = false;
        self.has_attacked = false;
        self.movement_remaining = self.max_movement;
    }
}

/// Why a move was refused. The unit is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    /// No unit with that id.
    #[error("no such unit")]
    UnknownUnit,
    /// The unit already moved this turn.
    #[error("unit already moved this turn")]
    AlreadyMoved,
    /// The unit has no movement left.
    #[error("unit has no movement left")]
    NoMovementLeft,
    /// Target lies off the map.
    #[error("target {0} is off the map")]
    OutOfBounds(Position),
    /// Target is further than the unit's movement budget.
    #[error("target is {distance} cells away, maximum is {max}")]
    OutOfRange {
        /// Manhattan distance to the target.
        distance: u32,
        /// The unit's budget.
        max: u32,
    },
}

/// Result of a successful move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Where the unit ended up.
    pub position: Position,
    /// Unit created by a merge at the destination, if one happened.
    ///
    /// The merge may or may not have consumed the moved unit.
    pub merged: Option<UnitId>,
}

/// Owns every unit. Iteration follows spawn order.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: Vec<Unit>,
    next_id: u32,
    width: i32,
    height: i32,
    movement_rule: MovementRule,
    enforce_range: bool,
}

impl UnitRegistry {
    /// Create an empty registry for a `width` × `height` map.
    #[must_use]
    pub fn new(width: i32, height: i32, movement_rule: MovementRule, enforce_range: bool) -> Self {
        Self {
            units: Vec::new(),
            next_id: 1,
            width,
            height,
            movement_rule,
            enforce_range,
        }
    }

    const fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn allocate_id(&mut self) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn a fresh unit with full health and movement.
    pub fn spawn(
        &mut self,
        kind: UnitKind,
        level: UnitLevel,
        owner: PlayerId,
        position: Position,
    ) -> UnitId {
        let id = self.allocate_id();
        let max_movement = self.movement_rule.budget(level);
        let max_health = HEALTH_PER_LEVEL * level.tier();
        self.units.push(Unit {
            id,
            kind,
            level,
            owner,
            position,
            movement_remaining: max_movement,
            max_movement,
            health: max_health,
            max_health,
            has_moved: false,
            has_attacked: false,
        });
        debug!(%id, ?kind, ?level, owner, %position, "spawned unit");
        id
    }

    /// Look up a unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    /// Iterate over all units in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    /// Number of live units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether there are no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units standing on a cell.
    pub fn units_at(&self, position: Position) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |unit| unit.position == position)
    }

    /// Units owned by a player.
    pub fn units_of(&self, owner: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |unit| unit.owner == owner)
    }

    /// Move a unit, then try to merge at the destination.
    ///
    /// # Errors
    ///
    /// Returns the reason the move was refused; nothing changes in that case.
    pub fn move_unit(&mut self, id: UnitId, target: Position) -> Result<MoveOutcome, MoveRejection> {
        let in_bounds = self.in_bounds(target);
        let enforce_range = self.enforce_range;
        let unit = self
            .units
            .iter_mut()
            .find(|unit| unit.id == id)
            .ok_or(MoveRejection::UnknownUnit)?;

        if unit.has_moved {
            return Err(MoveRejection::AlreadyMoved);
        }
        if unit.movement_remaining == 0 {
            return Err(MoveRejection::NoMovementLeft);
        }
        if !in_bounds {
            return Err(MoveRejection::OutOfBounds(target));
        }
        let distance = unit.position.manhattan(target);
        if enforce_range && distance > unit.max_movement {
            return Err(MoveRejection::OutOfRange {
                distance,
                max: unit.max_movement,
            });
        }

        unit.position = target;
        unit.has_moved = true;
        let owner = unit.owner;
        debug!(%id, %target, distance, "moved unit");

        let merged = self.attempt_merge(target, owner);
        Ok(MoveOutcome {
            position: target,
            merged,
        })
    }

    /// Cells the unit could move to this turn, row-major.
    ///
    /// Every in-bounds cell at Manhattan distance 1 to `max_movement`. Terrain
    /// and occupancy are not considered. Empty once the unit cannot move.
    #[must_use]
    pub fn valid_movement_tiles(&self, id: UnitId) -> Vec<Position> {
        let Some(unit) = self.get(id) else {
            return Vec::new();
        };
        if !unit.can_move() {
            return Vec::new();
        }

        // Only the part of the diamond's bounding box that lies on the map.
        let range = i32::try_from(unit.max_movement).unwrap_or(i32::MAX);
        let origin = unit.position;
        let (x_min, x_max) = (
            origin.x.saturating_sub(range).max(0),
            origin.x.saturating_add(range).min(self.width.saturating_sub(1)),
        );
        let (y_min, y_max) = (
            origin.y.saturating_sub(range).max(0),
            origin.y.saturating_add(range).min(self.height.saturating_sub(1)),
        );

        let mut tiles = Vec::new();
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let pos = Position::new(x, y);
                let distance = origin.manhattan(pos);
                if distance >= 1 && distance <= unit.max_movement {
                    tiles.push(pos);
                }
            }
        }
        tiles
    }

    /// Merge one pair of a player's matching units on a cell.
    ///
    /// Units are grouped by (kind, level) in spawn order. The first group with
    /// two or more non-elite members loses its first two units, and a single
    /// unit one tier higher replaces them with 1.5× the first unit's max health,
    /// fully healed. At most one pair merges per call.
    pub fn attempt_merge(&mut self, position: Position, owner: PlayerId) -> Option<UnitId> {
        let candidates: Vec<(usize, UnitKind, UnitLevel)> = self
            .units
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.position == position && unit.owner == owner)
            .map(|(idx, unit)| (idx, unit.kind, unit.level))
            .collect();

        let mut groups: Vec<((UnitKind, UnitLevel), Vec<usize>)> = Vec::new();
        for (idx, kind, level) in candidates {
            match groups.iter_mut().find(|(key, _)| *key == (kind, level)) {
                Some((_, members)) => members.push(idx),
                None => groups.push(((kind, level), vec![idx])),
            }
        }

        let ((kind, level), pair) = groups
            .into_iter()
            .find(|((_, level), members)| members.len() >= 2 && level.next().is_some())?;
        let next_level = level.next()?;

        let first = self.units[pair[0]];
        let second = self.units[pair[1]];

        // Remove the higher index first so the lower one stays valid.
        self.units.remove(pair[1]);
        self.units.remove(pair[0]);

        let id = self.allocate_id();
        let max_health = first.max_health * 3 / 2;
        let max_movement = self.movement_rule.budget(next_level);
        let has_moved = first.has_moved || second.has_moved;
        self.units.push(Unit {
            id,
            kind,
            level: next_level,
            owner,
            position,
            movement_remaining: if has_moved { 0 } else { max_movement },
            max_movement,
            health: max_health,
            max_health,
            has_moved,
            has_attacked: first.has_attacked || second.has_attacked,
        });
        debug!(%id, consumed = %first.id, also = %second.id, ?next_level, "merged units");
        Some(id)
    }

    /// Restore movement for every unit a player owns.
    pub fn reset_for_turn(&mut self, owner: PlayerId) {
        for unit in self.units.iter_mut().filter(|unit| unit.owner == owner) {
            unit.reset_for_turn();
        }
    }
}
