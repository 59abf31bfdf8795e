//! Property-based tests for game mechanics.
//!
//! These tests verify properties of the map, units and church economy.
//! Run with: cargo test --release prop_game

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use proptest::prelude::*;

use tithe::config::{GameConfig, InfluenceConfig, TitheConfig};
use tithe::game::{
    Church, ChurchId, ChurchRegistry, GameState, Grid, MAX_FAITH, MovementRule, Position,
    TerrainKind, TerrainLayout, UnitKind, UnitLevel, UnitRegistry, check_invariants,
};

fn terrain_of(grid: &Grid) -> Vec<TerrainKind> {
    grid.iter().map(|tile| tile.terrain()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Disc queries return exactly the in-bounds cells within the radius.
    #[test]
    fn prop_radius_query_matches_brute_force(
        width in 1i32..20,
        height in 1i32..20,
        cx in -5i32..25,
        cy in -5i32..25,
        radius in 0u32..6
    ) {
        let grid = Grid::generate(width, height, &TerrainLayout { rules: Vec::new() }, 0);
        let center = Position::new(cx, cy);
        let found = grid.positions_in_radius(center, radius);

        let r_sq = i64::from(radius * radius);
        let mut expected = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let pos = Position::new(x, y);
                if pos.distance_sq(center) <= r_sq {
                    expected.push(pos);
                }
            }
        }
        prop_assert_eq!(found, expected);
    }

    /// The same seed always lays out the same map, and fixed sites survive any seed.
    #[test]
    fn prop_terrain_is_seed_stable(seed in any::<u64>(), width in 6i32..24, height in 6i32..24) {
        let layout = TerrainLayout::standard(width, height);
        let a = Grid::generate(width, height, &layout, seed);
        let b = Grid::generate(width, height, &layout, seed);
        prop_assert_eq!(terrain_of(&a), terrain_of(&b));

        let corner = a.cell_at(Position::new(1, 1)).unwrap();
        prop_assert_eq!(corner.terrain(), TerrainKind::Castle);
        let edge = a.cell_at(Position::new(0, height / 2)).unwrap();
        prop_assert_eq!(edge.terrain(), TerrainKind::Mountain);
    }

    /// Two matching non-elite units on one cell always become one unit a tier up.
    #[test]
    fn prop_merge_promotes_pair(
        bishop in any::<bool>(),
        veteran in any::<bool>(),
        x in 1i32..11,
        y in 1i32..9
    ) {
        let kind = if bishop { UnitKind::Bishop } else { UnitKind::Knight };
        let level = if veteran { UnitLevel::Veteran } else { UnitLevel::Basic };
        let mut units = UnitRegistry::new(12, 10, MovementRule::PerLevel, true);
        let target = Position::new(x, y);
        let first = units.spawn(kind, level, 1, target);
        let mover = units.spawn(kind, level, 1, Position::new(x + 1, y));
        let first_health = units.get(first).unwrap().max_health;

        let outcome = units.move_unit(mover, target).unwrap();
        let merged = units.get(outcome.merged.unwrap()).unwrap();

        prop_assert_eq!(units.len(), 1);
        prop_assert_eq!(Some(merged.level), level.next());
        prop_assert_eq!(merged.max_health, first_health * 3 / 2);
        prop_assert_eq!(merged.health, merged.max_health);
        prop_assert!(units.get(first).is_none());
    }

    /// Whatever rate is requested, the stored rate stays inside the band.
    #[test]
    fn prop_tithe_rate_clamped(rate in prop::num::f64::ANY) {
        let config = TitheConfig::default();
        let mut game = GameState::new(&GameConfig::default());
        let id = game.churches().iter().next().unwrap().id;
        let applied = game.set_tithe_rate(id, rate).unwrap();

        prop_assert!(applied >= config.min_rate && applied <= config.max_rate);
        prop_assert!((game.churches().get(id).unwrap().tithe_rate - applied).abs() < f64::EPSILON);
    }

    /// Income is the floored product of followers and rate, and zero when unlinked.
    #[test]
    fn prop_income_formula(followers in 0u64..1_000_000, rate in 0.05f64..0.5, connected in any::<bool>()) {
        let church = Church {
            id: ChurchId(1),
            position: Position::new(0, 0),
            owner: Some(1),
            followers,
            tithe_rate: rate,
            connected,
            influence_radius: 2,
        };
        let income = ChurchRegistry::income(&church);
        if connected {
            prop_assert_eq!(income, (followers as f64 * rate).floor() as u64);
        } else {
            prop_assert_eq!(income, 0);
        }
    }

    /// Growth never goes negative and stops at the maximum rate.
    #[test]
    fn prop_growth_bounded(secured in 0u32..200, rate in 0.05f64..=0.5) {
        let registry = ChurchRegistry::new(TitheConfig::default(), InfluenceConfig::default());
        let church = Church {
            id: ChurchId(1),
            position: Position::new(0, 0),
            owner: Some(1),
            followers: 50,
            tithe_rate: rate,
            connected: true,
            influence_radius: 2,
        };
        let growth = registry.follower_growth(&church, secured);
        prop_assert!(growth <= u64::from(secured));

        let maxed = Church { tithe_rate: 0.5, ..church };
        prop_assert_eq!(registry.follower_growth(&maxed, secured), 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Contested influence keeps every cell within bounds and consistent.
    #[test]
    fn prop_influence_stays_consistent(
        seed in any::<u64>(),
        owners in prop::collection::vec(0u8..3, 3),
        turns in 1u32..16
    ) {
        let config = GameConfig { seed, max_turns: turns, ..GameConfig::default() };
        let mut game = GameState::new(&config);
        game.add_player("Red", "#FF0000");
        game.add_player("Blue", "#0000FF");

        let churches: Vec<ChurchId> = game.churches().iter().map(|c| c.id).collect();
        for (id, owner) in churches.into_iter().zip(owners) {
            if owner > 0 {
                game.capture_church(id, owner);
            }
        }

        while !game.is_game_over() {
            game.advance_phase();
            let violations = check_invariants(&game);
            prop_assert!(violations.is_empty(), "{:?}", violations);
        }
        for tile in game.grid().iter() {
            prop_assert!(tile.faith() <= MAX_FAITH);
        }
    }
}
