//! Behavioural properties of the fire automaton across whole grids
//!
//! These tests drive `ForestGrid` through its public API and check the
//! invariants that hold for every run regardless of random draws: cell values
//! never decrease during ticks, fire never appears from nothing, ash is
//! terminal, and chunk edges are invisible to the spread rule.

use forest_fire_core::core_types::Cell;
use forest_fire_core::grid::chunk::NoNeighbors;
use forest_fire_core::grid::{Chunk, ChunkCoord, ForestConfig, ForestGrid, SpreadParams, WindField, WindMatrix};
use forest_fire_core::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;
use tracing_subscriber::EnvFilter;

/// Route grid logs to the test harness; `RUST_LOG=debug` shows every step.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(chunk_size: usize, seed: u64) -> ForestConfig {
    ForestConfig {
        chunk_size,
        fire_spread_speed: 1.0,
        burn_speed: 0.8,
        seed: Some(seed),
        ..Default::default()
    }
}

/// Grid with every cell growing
fn dense_grid(width: usize, height: usize, chunk_size: usize) -> ForestGrid {
    let mut grid = ForestGrid::new(width, height, config(chunk_size, 11)).unwrap();
    for x in 0..width {
        for y in 0..height {
            grid.chunk_mut(ChunkCoord::new(x as i32, y as i32))
                .unwrap()
                .activate_with(|_, _| Cell::GROWING);
        }
    }
    grid
}

fn snapshot(grid: &ForestGrid) -> Vec<u8> {
    grid.chunks()
        .flat_map(|chunk| chunk.cells().iter().map(|c| c.raw()))
        .collect()
}

fn cell(grid: &ForestGrid, chunk: (i32, i32), x: usize, y: usize) -> Cell {
    grid.chunk(ChunkCoord::new(chunk.0, chunk.1))
        .and_then(|c| c.cell(x, y))
        .unwrap()
}

#[test]
fn test_cells_never_decrease_during_ticks() {
    init_tracing();
    let mut grid = ForestGrid::new(3, 2, config(16, 42)).unwrap();
    grid.generate();
    grid.set_wind_speed(0.7).unwrap();
    grid.set_wind_direction(1.1).unwrap();
    grid.add_random_fire();

    let mut before = snapshot(&grid);
    for _ in 0..300 {
        grid.step();
        let after = snapshot(&grid);
        for (i, (b, a)) in before.iter().zip(&after).enumerate() {
            assert!(a >= b, "cell {} went from {} to {}", i, b, a);
            if *b == Cell::BURNED.raw() {
                assert_eq!(*a, Cell::BURNED.raw(), "ash must stay ash");
            }
            if *b >= Cell::FIRE.raw() {
                assert!(*a >= Cell::FIRE.raw(), "burning cell left the burning band");
            }
        }
        before = after;
    }
}

#[test]
fn test_no_fire_without_a_source() {
    let mut grid = ForestGrid::new(2, 2, config(16, 7)).unwrap();
    grid.generate();
    grid.set_wind_speed(3.0).unwrap();

    let initial = snapshot(&grid);
    for _ in 0..100 {
        grid.step();
    }
    assert_eq!(snapshot(&grid), initial);
    assert_eq!(grid.stats().burning, 0);
    assert_eq!(grid.tick_count(), 100);
}

#[test]
fn test_fire_burns_out_to_ash() {
    init_tracing();
    let mut grid = dense_grid(2, 1, 8);
    grid.set_burn_speed(1.0).unwrap();
    grid.ignite_at(&Vec3::new(3.0, 3.0, 0.0)).unwrap();

    for _ in 0..2000 {
        grid.step();
    }
    let stats = grid.stats();
    assert_eq!(stats.burning, 0);
    assert_eq!(stats.alive, 0);
    assert_eq!(stats.burned, 2 * 8 * 8);
}

#[test]
fn test_wind_matrix_clamped_for_any_wind() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut wind = WindField::new(4.0);
    for _ in 0..500 {
        wind.set_speed(rng.random_range(0.0..20.0)).unwrap();
        wind.set_direction(rng.random_range(-4.0 * PI..4.0 * PI)).unwrap();
        let m = wind.matrix();
        for dx in -1..=1 {
            for dy in -1..=1 {
                assert!(m.weight(dx, dy) >= 0.0);
            }
        }
        assert_eq!(m.weight(0, 0), 0.0);
    }
}

#[test]
fn test_boundary_spread_matches_both_axes() {
    // Burning cell on the right edge of chunk (0, 0) heats chunk (1, 0)
    let mut grid = dense_grid(2, 1, 4);
    grid.ignite_at(&Vec3::new(3.0, 1.0, 0.0)).unwrap();
    grid.tick_chunk(ChunkCoord::new(1, 0)).unwrap();
    assert_eq!(cell(&grid, (1, 0), 0, 1).raw(), 2);
    assert_eq!(cell(&grid, (1, 0), 0, 0).raw(), 1);
    assert_eq!(cell(&grid, (1, 0), 0, 2).raw(), 1);

    // And the mirror image
    let mut grid = dense_grid(2, 1, 4);
    grid.ignite_at(&Vec3::new(4.0, 1.0, 0.0)).unwrap();
    grid.tick_chunk(ChunkCoord::new(0, 0)).unwrap();
    assert_eq!(cell(&grid, (0, 0), 3, 1).raw(), 2);

    // Vertical edge
    let mut grid = dense_grid(1, 2, 4);
    grid.ignite_at(&Vec3::new(1.0, 3.0, 0.0)).unwrap();
    grid.tick_chunk(ChunkCoord::new(0, 1)).unwrap();
    assert_eq!(cell(&grid, (0, 1), 1, 0).raw(), 2);

    let mut grid = dense_grid(1, 2, 4);
    grid.ignite_at(&Vec3::new(1.0, 4.0, 0.0)).unwrap();
    grid.tick_chunk(ChunkCoord::new(0, 0)).unwrap();
    assert_eq!(cell(&grid, (0, 0), 1, 3).raw(), 2);
}

#[test]
fn test_boundary_spread_across_corner() {
    let mut grid = dense_grid(2, 2, 4);
    // Wind blowing from the burning corner pushes fire across the diagonal
    grid.set_wind_speed(1.0).unwrap();
    grid.set_wind_direction(1.25 * PI).unwrap();
    grid.ignite_at(&Vec3::new(3.0, 3.0, 0.0)).unwrap();

    grid.tick_chunk(ChunkCoord::new(1, 1)).unwrap();
    // 1 + floor(0.5 + 1.0 * 4.0)
    assert_eq!(cell(&grid, (1, 1), 0, 0).raw(), 5);
    assert_eq!(cell(&grid, (1, 1), 1, 1).raw(), 1);
}

#[test]
fn test_fire_crosses_every_chunk() {
    let mut grid = dense_grid(3, 3, 4);
    grid.ignite_at(&Vec3::new(6.0, 6.0, 0.0)).unwrap();
    for _ in 0..800 {
        grid.step();
    }
    assert!(grid
        .chunks()
        .all(|chunk| chunk.categories().all(|c| c != forest_fire_core::CellCategory::Alive)));
}

#[test]
fn test_extinguish_interior_clears_neighbourhood() {
    let mut grid = dense_grid(1, 1, 8);
    for x in 1..=5 {
        for y in 1..=5 {
            grid.ignite_at(&Vec3::new(x as f32, y as f32, 0.0)).unwrap();
        }
    }

    grid.extinguish_at(&Vec3::new(3.5, 3.5, 0.0)).unwrap();

    for x in 1..=5 {
        for y in 1..=5 {
            let in_block = (2..=4).contains(&x) && (2..=4).contains(&y);
            let value = cell(&grid, (0, 0), x, y);
            if in_block {
                assert_eq!(value, Cell::GROWING, "({x}, {y}) should be out");
            } else {
                assert_eq!(value, Cell::FIRE, "({x}, {y}) should still burn");
            }
        }
    }
}

#[test]
fn test_extinguish_edge_clears_only_centre() {
    let mut grid = dense_grid(2, 1, 4);
    for x in 2..=4 {
        for y in 0..=2 {
            grid.ignite_at(&Vec3::new(x as f32, y as f32, 0.0)).unwrap();
        }
    }

    grid.extinguish_at(&Vec3::new(3.0, 1.0, 0.0)).unwrap();

    assert_eq!(cell(&grid, (0, 0), 3, 1), Cell::GROWING);
    assert_eq!(cell(&grid, (0, 0), 2, 1), Cell::FIRE);
    assert_eq!(cell(&grid, (0, 0), 3, 0), Cell::FIRE);
    assert_eq!(cell(&grid, (1, 0), 0, 1), Cell::FIRE);
}

#[test]
fn test_single_burning_cell_with_uniform_weights() {
    let mut chunk = Chunk::new(ChunkCoord::new(0, 0), 3);
    chunk.activate_with(|x, y| if (x, y) == (1, 1) { Cell::FIRE } else { Cell::GROWING });
    let params = SpreadParams {
        fire_spread_speed: 1.0,
        burn_speed: 0.0,
    };
    let wind = WindMatrix::uniform(1.0);
    let mut rng = StdRng::seed_from_u64(0);

    chunk.tick(&NoNeighbors, &wind, &params, &mut rng);
    for x in 0..3 {
        for y in 0..3 {
            let expected = if (x, y) == (1, 1) { 64 } else { 2 };
            assert_eq!(chunk.cell(x, y).unwrap().raw(), expected, "cell ({x}, {y})");
        }
    }

    // Heat keeps accumulating one step at a time until the ring ignites
    for _ in 0..61 {
        chunk.tick(&NoNeighbors, &wind, &params, &mut rng);
    }
    assert_eq!(chunk.categories().filter(|c| *c == forest_fire_core::CellCategory::Burning).count(), 1);

    chunk.tick(&NoNeighbors, &wind, &params, &mut rng);
    assert!((0..3).all(|x| (0..3).all(|y| chunk.cell(x, y).unwrap().is_burning())));
    assert_eq!(chunk.cell(1, 1), Some(Cell::FIRE));
}
