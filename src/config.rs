//! Game configuration.
//!
//! Every tunable of the simulation lives here. Configs load from JSON; any
//! field left out takes its default. Inconsistent values are clamped by
//! [`GameConfig::sanitized`] rather than rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::game::{MAX_FAITH, MovementRule, TerrainLayout, UnitKind};

/// Error loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid config JSON.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Church economy settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitheConfig {
    /// Lowest tithe rate a church may be set to.
    pub min_rate: f64,
    /// Highest tithe rate; also the rate at which growth stops.
    pub max_rate: f64,
    /// Rate new churches start with.
    pub default_rate: f64,
    /// Followers gained per secured tile before the tithe penalty.
    pub growth_constant: f64,
    /// Followers new churches start with.
    pub initial_followers: u64,
}

impl Default for TitheConfig {
    fn default() -> Self {
        Self {
            min_rate: 0.05,
            max_rate: 0.5,
            default_rate: 0.1,
            growth_constant: 0.15,
            initial_followers: 50,
        }
    }
}

impl TitheConfig {
    /// Clamp a rate into [`min_rate`, `max_rate`]. NaN becomes `min_rate`.
    ///
    /// [`min_rate`]: TitheConfig::min_rate
    /// [`max_rate`]: TitheConfig::max_rate
    #[must_use]
    pub fn clamp_rate(&self, rate: f64) -> f64 {
        rate.max(self.min_rate).min(self.max_rate)
    }
}

/// Faith influence settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluenceConfig {
    /// Radius of the disc each church projects faith into.
    pub radius: u32,
    /// Strength gained per phase on unclaimed or friendly cells.
    pub increment: u8,
    /// Strength lost per phase on cells held by another player.
    pub decrement: u8,
    /// Strength a cell must exceed to count as secured territory.
    pub secured_threshold: u8,
}

impl Default for InfluenceConfig {
    fn default() -> Self {
        Self {
            radius: 2,
            increment: 10,
            decrement: 5,
            secured_threshold: 50,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Map width in cells.
    pub map_width: i32,
    /// Map height in cells.
    pub map_height: i32,
    /// Seed for terrain generation.
    pub seed: u64,
    /// Last turn played; advancing past it ends the game.
    pub max_turns: u32,
    /// Gold each player starts with.
    pub initial_gold: u64,
    /// Faith each player starts with.
    pub initial_faith: u64,
    /// Gold to recruit a knight.
    pub knight_cost: u64,
    /// Gold to recruit a bishop.
    pub bishop_cost: u64,
    /// How movement budgets follow unit level.
    pub movement: MovementRule,
    /// Reject moves further than a unit's movement budget.
    pub enforce_movement_range: bool,
    /// Church economy.
    pub tithe: TitheConfig,
    /// Faith influence.
    pub influence: InfluenceConfig,
    /// Terrain rules; the standard layout for the map size when absent.
    pub terrain: Option<TerrainLayout>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map_width: 12,
            map_height: 10,
            seed: 0,
            max_turns: 50,
            initial_gold: 100,
            initial_faith: 0,
            knight_cost: 20,
            bishop_cost: 50,
            movement: MovementRule::PerLevel,
            enforce_movement_range: true,
            tithe: TitheConfig::default(),
            influence: InfluenceConfig::default(),
            terrain: None,
        }
    }
}

impl GameConfig {
    /// Parse a config from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid config JSON.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Recruit cost for a unit kind.
    #[must_use]
    pub const fn recruit_cost(&self, kind: UnitKind) -> u64 {
        match kind {
            UnitKind::Knight => self.knight_cost,
            UnitKind::Bishop => self.bishop_cost,
        }
    }

    /// Terrain layout in effect.
    #[must_use]
    pub fn terrain_layout(&self) -> TerrainLayout {
        self.terrain
            .clone()
            .unwrap_or_else(|| TerrainLayout::standard(self.map_width, self.map_height))
    }

    /// A copy with inconsistent values clamped into range.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        config.map_width = config.map_width.max(1);
        config.map_height = config.map_height.max(1);
        config.max_turns = config.max_turns.max(1);
        if let MovementRule::Flat(cells) = config.movement {
            // No move on the map is longer than width + height.
            let span = config.map_width.saturating_add(config.map_height);
            let cap = u32::try_from(span).unwrap_or(u32::MAX);
            config.movement = MovementRule::Flat(cells.min(cap));
        }

        let tithe = &mut config.tithe;
        let (lo, hi) = (unit_interval(tithe.min_rate), unit_interval(tithe.max_rate));
        tithe.min_rate = lo.min(hi);
        tithe.max_rate = lo.max(hi);
        tithe.default_rate = tithe.clamp_rate(tithe.default_rate);
        if !tithe.growth_constant.is_finite() || tithe.growth_constant < 0.0 {
            tithe.growth_constant = 0.0;
        }

        let influence = &mut config.influence;
        influence.increment = influence.increment.min(MAX_FAITH);
        influence.decrement = influence.decrement.min(MAX_FAITH);
        influence.secured_threshold = influence.secured_threshold.min(MAX_FAITH);
        config
    }
}

fn unit_interval(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.map_width, 12);
        assert_eq!(config.map_height, 10);
        assert_eq!(config.max_turns, 50);
        assert_eq!(config.initial_gold, 100);
        assert_eq!(config.influence.radius, 2);
        assert!(config.enforce_movement_range);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = GameConfig::from_json_str(
            r#"{ "max_turns": 5, "tithe": { "max_rate": 0.4 }, "movement": { "rule": "flat", "cells": 2 } }"#,
        )
        .unwrap();
        assert_eq!(config.max_turns, 5);
        assert!((config.tithe.max_rate - 0.4).abs() < f64::EPSILON);
        assert!((config.tithe.min_rate - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.movement, MovementRule::Flat(2));
        assert_eq!(config.map_width, 12);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = GameConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_sanitized_clamps() {
        let mut config = GameConfig::default();
        config.map_width = 0;
        config.max_turns = 0;
        config.tithe.min_rate = 0.7;
        config.tithe.max_rate = 0.2;
        config.tithe.default_rate = 0.9;
        config.influence.increment = 200;

        let clean = config.sanitized();
        assert_eq!(clean.map_width, 1);
        assert_eq!(clean.max_turns, 1);
        assert!((clean.tithe.min_rate - 0.2).abs() < f64::EPSILON);
        assert!((clean.tithe.max_rate - 0.7).abs() < f64::EPSILON);
        assert!((clean.tithe.default_rate - 0.7).abs() < f64::EPSILON);
        assert_eq!(clean.influence.increment, MAX_FAITH);
    }

    #[test]
    fn test_sanitized_caps_flat_movement() {
        let mut config = GameConfig {
            movement: MovementRule::Flat(20_000),
            ..GameConfig::default()
        };
        assert_eq!(config.sanitized().movement, MovementRule::Flat(22));

        config.movement = MovementRule::Flat(u32::MAX);
        config.map_width = i32::MAX;
        config.map_height = i32::MAX;
        let clean = config.sanitized();
        assert_eq!(clean.movement, MovementRule::Flat(u32::try_from(i32::MAX).unwrap()));

        config.movement = MovementRule::Flat(3);
        assert_eq!(config.sanitized().movement, MovementRule::Flat(3));
        config.movement = MovementRule::PerLevel;
        assert_eq!(config.sanitized().movement, MovementRule::PerLevel);
    }

    #[test]
    fn test_recruit_costs() {
        let config = GameConfig::default();
        assert_eq!(config.recruit_cost(UnitKind::Knight), 20);
        assert_eq!(config.recruit_cost(UnitKind::Bishop), 50);
    }
}
