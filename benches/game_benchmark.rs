//! Benchmarks for running complete games.
//!
//! This benchmarks the full phase loop and the influence pass inside it.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use tithe::{GameConfig, GameState, Scenario, run_batch, run_scenario};

fn bench_single_game(c: &mut Criterion) {
    let scenario = Scenario::standard();

    c.bench_function("standard_scenario_50_turns", |b| {
        b.iter(|| {
            let result = run_scenario(black_box(&scenario));
            black_box(result)
        });
    });
}

fn bench_large_map_game(c: &mut Criterion) {
    // Every church owned, on a much larger map.
    let config = GameConfig {
        map_width: 64,
        map_height: 64,
        ..GameConfig::default()
    };

    c.bench_function("large_map_all_churches_owned", |b| {
        b.iter(|| {
            let mut game = GameState::new(black_box(&config));
            game.add_player("Red", "#FF0000");
            game.add_player("Blue", "#0000FF");
            let churches: Vec<_> = game.churches().iter().map(|c| c.id).collect();
            for (i, id) in churches.into_iter().enumerate() {
                game.capture_church(id, if i % 2 == 0 { 1 } else { 2 });
            }
            game.run_to_end();
            black_box(game.turn())
        });
    });
}

fn bench_batch(c: &mut Criterion) {
    let mut scenario = Scenario::standard();
    scenario.config.max_turns = 20;

    let mut group = c.benchmark_group("batch");
    group.sample_size(20);
    group.bench_function("standard_100_games", |b| {
        b.iter(|| {
            let summary = run_batch(black_box(&scenario), 100, 0, None).unwrap();
            black_box(summary)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_single_game, bench_large_map_game, bench_batch);
criterion_main!(benches);
