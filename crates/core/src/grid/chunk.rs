//! Square chunk of tree cells and its fire-spread update
//!
//! A chunk owns `size × size` cells stored column by column (`x * size + y`)
//! and never holds a reference to its siblings. Fire state of cells beyond the
//! chunk edge is resolved through a [`NeighborLookup`] supplied by the owner
//! for the duration of a call.
//!
//! # Tick semantics
//!
//! Cells are updated in place on a single buffer, scanning x outer and y
//! inner. A cell visited later in the scan sees neighbours already updated
//! this tick, so a fire front can advance several cells in one tick along the
//! scan direction. This order is part of the defined behaviour.
//!
//! For each cell, with `v` its value before the update:
//! - growing: with probability `fire_spread_speed`, add
//!   `floor(Σ wind.weight(offset))` over burning neighbours
//! - burning: with probability `burn_speed`, advance burn progress by one
//! - empty / burned: unchanged

use crate::core_types::{Cell, CellCategory, NoiseField, Vec3};
use crate::error::ForestError;
use crate::grid::terrain::HeightSampler;
use crate::grid::wind_field::{WindMatrix, NEIGHBOR_OFFSETS};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Random cell picks per chunk when seeding random fires
pub const RANDOM_FIRE_ATTEMPTS: usize = 10;

/// Position of a chunk in the chunk grid (chunk units, not cells)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Fire state of cells that live in other chunks.
pub trait NeighborLookup {
    /// Whether local cell `(x, y)` of `chunk` is burning.
    ///
    /// Chunks outside the grid, or dormant ones, never burn.
    fn is_burning(&self, chunk: ChunkCoord, x: usize, y: usize) -> bool;
}

/// Lookup for a chunk with no neighbours (a 1×1 forest, or tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNeighbors;

impl NeighborLookup for NoNeighbors {
    fn is_burning(&self, _chunk: ChunkCoord, _x: usize, _y: usize) -> bool {
        false
    }
}

/// Probabilities driving the stochastic part of a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadParams {
    /// Chance per tick that a growing cell checks its neighbours for fire
    pub fire_spread_speed: f32,
    /// Chance per tick that a burning cell advances its burn progress
    pub burn_speed: f32,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            fire_spread_speed: 0.6,
            burn_speed: 0.8,
        }
    }
}

/// One tree as seen by a renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeInstance {
    /// World position, z from the height sampler
    pub position: Vec3,
    pub category: CellCategory,
}

/// Square grid of tree cells
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    coord: ChunkCoord,
    size: usize,
    /// Empty while dormant
    cells: Vec<Cell>,
    /// Bumped whenever the set of occupied cells may have changed
    layout_revision: u64,
}

impl Chunk {
    /// Create a dormant chunk.
    pub fn new(coord: ChunkCoord, size: usize) -> Self {
        Self {
            coord,
            size,
            cells: Vec::new(),
            layout_revision: 0,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Cells per side
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the chunk has been generated and takes part in the simulation.
    pub fn is_active(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Changes whenever trees are planted, removed, regenerated or cleared.
    pub fn layout_revision(&self) -> u64 {
        self.layout_revision
    }

    /// World position of local cell (0, 0) on the ground plane.
    pub fn world_origin(&self) -> (f32, f32) {
        let size = self.size as f32;
        (self.coord.x as f32 * size, self.coord.y as f32 * size)
    }

    /// Populate every cell from the noise field and activate the chunk.
    pub fn activate(&mut self, noise: &NoiseField) {
        let coord = self.coord;
        self.activate_with(|x, y| {
            if noise.tree_present(coord, x, y) {
                Cell::GROWING
            } else {
                Cell::EMPTY
            }
        });
    }

    /// Populate every cell from `seed(x, y)` and activate the chunk.
    pub fn activate_with<F>(&mut self, mut seed: F)
    where
        F: FnMut(usize, usize) -> Cell,
    {
        let size = self.size;
        let mut cells = Vec::with_capacity(size * size);
        for x in 0..size {
            for y in 0..size {
                cells.push(seed(x, y));
            }
        }
        self.cells = cells;
        self.layout_revision += 1;
    }

    /// Drop all cells and return to dormant.
    pub fn deactivate(&mut self) {
        self.cells = Vec::new();
        self.layout_revision += 1;
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        x * self.size + y
    }

    fn checked_index(&self, x: usize, y: usize) -> Result<usize, ForestError> {
        if !self.is_active() {
            return Err(ForestError::ChunkNotActive { chunk: self.coord });
        }
        if x >= self.size || y >= self.size {
            let (ox, oy) = self.world_origin();
            return Err(ForestError::CoordinateOutOfRange {
                x: ox + x as f32,
                y: oy + y as f32,
            });
        }
        Ok(self.index(x, y))
    }

    /// Cell at local `(x, y)`; dormant chunks read as empty.
    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        if x >= self.size || y >= self.size {
            return None;
        }
        Some(self.cells.get(self.index(x, y)).copied().unwrap_or(Cell::EMPTY))
    }

    /// All cells, column by column. Empty while dormant.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Overwrite a cell directly, bypassing the state machine.
    ///
    /// # Errors
    /// [`ForestError::ChunkNotActive`] on a dormant chunk,
    /// [`ForestError::CoordinateOutOfRange`] outside the chunk.
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) -> Result<(), ForestError> {
        let idx = self.checked_index(x, y)?;
        if self.cells[idx].is_empty() != cell.is_empty() {
            self.layout_revision += 1;
        }
        self.cells[idx] = cell;
        Ok(())
    }

    /// Number of occupied cells (any non-empty state).
    pub fn tree_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    /// Whether local `(x, y)` is inside this chunk and burning.
    #[inline]
    pub fn is_burning_local(&self, x: usize, y: usize) -> bool {
        x < self.size
            && y < self.size
            && self
                .cells
                .get(self.index(x, y))
                .is_some_and(|c| c.is_burning())
    }

    /// Whether the cell at local `(x, y)` burns, following the coordinate into
    /// an adjacent chunk when it falls outside this one.
    ///
    /// Coordinates may overflow each axis by at most one chunk.
    pub fn is_burning<N>(&self, x: i32, y: i32, neighbors: &N) -> bool
    where
        N: NeighborLookup + ?Sized,
    {
        let size = self.size as i32;
        if (0..size).contains(&x) && (0..size).contains(&y) {
            return self.is_burning_local(x as usize, y as usize);
        }

        let mut chunk = self.coord;
        let (mut lx, mut ly) = (x, y);
        if lx < 0 {
            chunk.x -= 1;
            lx += size;
        } else if lx >= size {
            chunk.x += 1;
            lx -= size;
        }
        if ly < 0 {
            chunk.y -= 1;
            ly += size;
        } else if ly >= size {
            chunk.y += 1;
            ly -= size;
        }

        if !(0..size).contains(&lx) || !(0..size).contains(&ly) {
            return false;
        }
        neighbors.is_burning(chunk, lx as usize, ly as usize)
    }

    #[inline]
    fn is_interior(&self, x: usize, y: usize) -> bool {
        x > 0 && y > 0 && x + 1 < self.size && y + 1 < self.size
    }

    /// Wind-weighted count of burning neighbours around local `(x, y)`.
    ///
    /// A dormant chunk holds no burning cells and scores 0.
    pub fn ignition_score<N>(&self, x: usize, y: usize, neighbors: &N, wind: &WindMatrix) -> f32
    where
        N: NeighborLookup + ?Sized,
    {
        let mut score = 0.0;
        if !self.is_active() {
            return score;
        }
        if self.is_interior(x, y) {
            for (dx, dy) in NEIGHBOR_OFFSETS {
                let nx = x.wrapping_add_signed(dx as isize);
                let ny = y.wrapping_add_signed(dy as isize);
                if self.cells[self.index(nx, ny)].is_burning() {
                    score += wind.weight(dx, dy);
                }
            }
        } else {
            for (dx, dy) in NEIGHBOR_OFFSETS {
                if self.is_burning(x as i32 + dx, y as i32 + dy, neighbors) {
                    score += wind.weight(dx, dy);
                }
            }
        }
        score
    }

    /// Advance every cell by one simulation step. Dormant chunks are skipped.
    pub fn tick<N, R>(&mut self, neighbors: &N, wind: &WindMatrix, params: &SpreadParams, rng: &mut R)
    where
        N: NeighborLookup + ?Sized,
        R: Rng + ?Sized,
    {
        if !self.is_active() {
            return;
        }

        let size = self.size;
        for x in 0..size {
            for y in 0..size {
                let idx = self.index(x, y);
                let cell = self.cells[idx];

                if cell.is_growing() {
                    if rng.random::<f32>() < params.fire_spread_speed {
                        let score = self.ignition_score(x, y, neighbors, wind);
                        // `as` saturates; the cell clamps inside the burning band
                        let heat = score.floor() as u8;
                        if heat > 0 {
                            self.cells[idx] = cell.add_heat(heat);
                        }
                    }
                } else if cell.is_burning() && rng.random::<f32>() < params.burn_speed {
                    self.cells[idx] = cell.advance_burn();
                }
            }
        }
    }

    /// Plant a tree in an empty slot.
    ///
    /// # Errors
    /// See [`Chunk::set_cell`].
    pub fn add_tree(&mut self, x: usize, y: usize) -> Result<(), ForestError> {
        let idx = self.checked_index(x, y)?;
        if self.cells[idx].is_empty() {
            self.cells[idx] = Cell::GROWING;
            self.layout_revision += 1;
        }
        Ok(())
    }

    /// Remove whatever occupies the slot.
    ///
    /// # Errors
    /// See [`Chunk::set_cell`].
    pub fn remove_tree(&mut self, x: usize, y: usize) -> Result<(), ForestError> {
        let idx = self.checked_index(x, y)?;
        if !self.cells[idx].is_empty() {
            self.cells[idx] = Cell::EMPTY;
            self.layout_revision += 1;
        }
        Ok(())
    }

    /// Set a growing tree on fire. Other states are left alone.
    ///
    /// # Errors
    /// See [`Chunk::set_cell`].
    pub fn ignite(&mut self, x: usize, y: usize) -> Result<(), ForestError> {
        let idx = self.checked_index(x, y)?;
        if self.cells[idx].is_growing() {
            self.cells[idx] = Cell::FIRE;
        }
        Ok(())
    }

    /// Put out fire at `(x, y)` and, for interior cells, its 8 neighbours.
    ///
    /// Edge cells only extinguish themselves; fire in adjacent chunks is
    /// never touched.
    ///
    /// # Errors
    /// See [`Chunk::set_cell`].
    pub fn extinguish(&mut self, x: usize, y: usize) -> Result<(), ForestError> {
        let idx = self.checked_index(x, y)?;
        if self.cells[idx].is_burning() {
            self.cells[idx] = Cell::GROWING;
        }

        if self.is_interior(x, y) {
            for (dx, dy) in NEIGHBOR_OFFSETS {
                let n = self.index(x.wrapping_add_signed(dx as isize), y.wrapping_add_signed(dy as isize));
                if self.cells[n].is_burning() {
                    self.cells[n] = Cell::GROWING;
                }
            }
        }
        Ok(())
    }

    /// Ignite the first growing cell among up to [`RANDOM_FIRE_ATTEMPTS`]
    /// random picks. Returns whether a fire was started.
    pub fn add_random_fire<R>(&mut self, rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        if !self.is_active() {
            return false;
        }
        for _ in 0..RANDOM_FIRE_ATTEMPTS {
            let x = rng.random_range(0..self.size);
            let y = rng.random_range(0..self.size);
            let idx = self.index(x, y);
            if self.cells[idx].is_growing() {
                self.cells[idx] = Cell::FIRE;
                return true;
            }
        }
        false
    }

    /// Render categories of occupied cells in instance order.
    pub fn categories(&self) -> impl Iterator<Item = CellCategory> + '_ {
        self.cells.iter().filter_map(|c| c.category())
    }

    /// Occupied cells as world-space instances, column by column.
    pub fn instances<'a, H>(&'a self, terrain: &'a H) -> impl Iterator<Item = TreeInstance> + 'a
    where
        H: HeightSampler + ?Sized,
    {
        let (ox, oy) = self.world_origin();
        let size = self.size;
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            let category = cell.category()?;
            let x = ox + (idx / size) as f32;
            let y = oy + (idx % size) as f32;
            Some(TreeInstance {
                position: Vec3::new(x, y, terrain.sample_height(x, y)),
                category,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn always() -> SpreadParams {
        SpreadParams {
            fire_spread_speed: 1.0,
            burn_speed: 0.0,
        }
    }

    fn forest(size: usize) -> Chunk {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), size);
        chunk.activate_with(|_, _| Cell::GROWING);
        chunk
    }

    #[test]
    fn test_dormant_chunk() {
        let mut chunk = Chunk::new(ChunkCoord::new(2, 1), 4);
        assert!(!chunk.is_active());
        assert_eq!(chunk.cell(1, 1), Some(Cell::EMPTY));
        assert_eq!(chunk.cell(4, 0), None);
        assert_eq!(
            chunk.add_tree(1, 1),
            Err(ForestError::ChunkNotActive {
                chunk: ChunkCoord::new(2, 1)
            })
        );

        // Ticking a dormant chunk is a no-op
        let mut rng = StdRng::seed_from_u64(1);
        chunk.tick(&NoNeighbors, &WindMatrix::calm(), &always(), &mut rng);
        assert!(!chunk.is_active());
    }

    #[test]
    fn test_dormant_chunk_scores_zero() {
        let chunk = Chunk::new(ChunkCoord::new(0, 0), 5);
        let wind = WindMatrix::calm();
        assert_eq!(chunk.ignition_score(2, 2, &NoNeighbors, &wind), 0.0);
        assert_eq!(chunk.ignition_score(0, 4, &NoNeighbors, &wind), 0.0);
    }

    #[test]
    fn test_burning_neighbour_heats_cells() {
        let mut chunk = forest(3);
        chunk.set_cell(1, 1, Cell::FIRE).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        chunk.tick(&NoNeighbors, &WindMatrix::uniform(1.0), &always(), &mut rng);

        for x in 0..3 {
            for y in 0..3 {
                let expected = if (x, y) == (1, 1) { Cell::FIRE } else { Cell::from_raw(2) };
                assert_eq!(chunk.cell(x, y), Some(expected), "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_in_place_scan_cascades() {
        // Weight 64 ignites a growing tree from a single burning neighbour
        let mut chunk = forest(5);
        chunk.set_cell(0, 0, Cell::FIRE).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        chunk.tick(&NoNeighbors, &WindMatrix::uniform(64.0), &always(), &mut rng);

        // Every later cell in scan order has an earlier, already burning neighbour
        assert!(chunk.cells().iter().all(|c| c.is_burning()));
    }

    #[test]
    fn test_fire_lags_against_scan_direction() {
        let mut chunk = forest(5);
        chunk.set_cell(4, 4, Cell::FIRE).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        chunk.tick(&NoNeighbors, &WindMatrix::uniform(64.0), &always(), &mut rng);

        // Cells scanned before the fire's neighbours ignited stay green
        let burning = chunk.cells().iter().filter(|c| c.is_burning()).count();
        assert_eq!(burning, 5);
        assert!(chunk.is_burning_local(3, 3));
        assert!(chunk.is_burning_local(4, 2));
        assert_eq!(chunk.cell(0, 0), Some(Cell::GROWING));
        assert_eq!(chunk.cell(3, 2), Some(Cell::GROWING));
    }

    #[test]
    fn test_burned_is_terminal() {
        let mut chunk = forest(4);
        chunk.set_cell(2, 2, Cell::BURNED).unwrap();
        let params = SpreadParams {
            fire_spread_speed: 1.0,
            burn_speed: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            chunk.tick(&NoNeighbors, &WindMatrix::uniform(10.0), &params, &mut rng);
        }
        assert_eq!(chunk.cell(2, 2), Some(Cell::BURNED));
        // Ash does not spread fire
        assert!(chunk.cells().iter().filter(|c| **c != Cell::BURNED).all(|c| c.is_growing()));
    }

    #[test]
    fn test_burn_progress_runs_to_ash() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), 3);
        chunk.activate_with(|x, y| if (x, y) == (1, 1) { Cell::FIRE } else { Cell::EMPTY });
        let params = SpreadParams {
            fire_spread_speed: 1.0,
            burn_speed: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..(255 - 64) {
            chunk.tick(&NoNeighbors, &WindMatrix::calm(), &params, &mut rng);
        }
        assert_eq!(chunk.cell(1, 1), Some(Cell::BURNED));
    }

    #[test]
    fn test_extinguish_interior_clears_block() {
        let mut chunk = forest(5);
        for x in 1..4 {
            for y in 1..4 {
                chunk.set_cell(x, y, Cell::from_raw(100)).unwrap();
            }
        }
        chunk.extinguish(2, 2).unwrap();
        for x in 1..4 {
            for y in 1..4 {
                assert_eq!(chunk.cell(x, y), Some(Cell::GROWING));
            }
        }
    }

    #[test]
    fn test_extinguish_edge_clears_only_target() {
        let mut chunk = forest(5);
        for x in 0..2 {
            for y in 0..3 {
                chunk.set_cell(x, y, Cell::FIRE).unwrap();
            }
        }
        chunk.extinguish(0, 1).unwrap();
        assert_eq!(chunk.cell(0, 1), Some(Cell::GROWING));
        assert_eq!(chunk.cell(0, 0), Some(Cell::FIRE));
        assert_eq!(chunk.cell(1, 1), Some(Cell::FIRE));
        assert_eq!(chunk.cell(0, 2), Some(Cell::FIRE));
    }

    #[test]
    fn test_point_edits() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), 4);
        chunk.activate_with(|_, _| Cell::EMPTY);
        let rev = chunk.layout_revision();

        // Igniting an empty slot does nothing
        chunk.ignite(1, 1).unwrap();
        assert_eq!(chunk.cell(1, 1), Some(Cell::EMPTY));

        chunk.add_tree(1, 1).unwrap();
        assert_eq!(chunk.cell(1, 1), Some(Cell::GROWING));
        assert!(chunk.layout_revision() > rev);

        chunk.ignite(1, 1).unwrap();
        assert_eq!(chunk.cell(1, 1), Some(Cell::FIRE));

        // Planting over a burning tree keeps the fire
        chunk.add_tree(1, 1).unwrap();
        assert_eq!(chunk.cell(1, 1), Some(Cell::FIRE));

        chunk.remove_tree(1, 1).unwrap();
        assert_eq!(chunk.cell(1, 1), Some(Cell::EMPTY));

        assert!(matches!(
            chunk.add_tree(4, 0),
            Err(ForestError::CoordinateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_random_fire_needs_growing_cells() {
        let mut rng = StdRng::seed_from_u64(42);

        let mut barren = Chunk::new(ChunkCoord::new(0, 0), 4);
        barren.activate_with(|_, _| Cell::EMPTY);
        assert!(!barren.add_random_fire(&mut rng));

        let mut full = forest(4);
        assert!(full.add_random_fire(&mut rng));
        assert_eq!(full.cells().iter().filter(|c| c.is_burning()).count(), 1);
    }

    struct BurningColumn;

    impl NeighborLookup for BurningColumn {
        fn is_burning(&self, chunk: ChunkCoord, x: usize, _y: usize) -> bool {
            // Rightmost column of the chunk to the west burns
            chunk == ChunkCoord::new(0, 0) && x == 3
        }
    }

    #[test]
    fn test_lookup_crosses_one_boundary() {
        let mut chunk = Chunk::new(ChunkCoord::new(1, 0), 4);
        chunk.activate_with(|_, _| Cell::GROWING);

        assert!(chunk.is_burning(-1, 2, &BurningColumn));
        assert!(chunk.is_burning(-1, -1, &NeighborsAt((0, -1))));
        assert!(!chunk.is_burning(4, 2, &BurningColumn));
        assert!(!chunk.is_burning(1, 2, &BurningColumn));
    }

    struct NeighborsAt((i32, i32));

    impl NeighborLookup for NeighborsAt {
        fn is_burning(&self, chunk: ChunkCoord, x: usize, y: usize) -> bool {
            (chunk.x, chunk.y) == self.0 && x == 3 && y == 3
        }
    }

    #[test]
    fn test_instances_follow_scan_order() {
        let mut chunk = Chunk::new(ChunkCoord::new(1, 2), 2);
        chunk.activate_with(|x, y| match (x, y) {
            (0, 1) => Cell::GROWING,
            (1, 0) => Cell::FIRE,
            (1, 1) => Cell::BURNED,
            _ => Cell::EMPTY,
        });
        let terrain = |x: f32, y: f32| x + y;
        let instances: Vec<_> = chunk.instances(&terrain).collect();

        assert_eq!(chunk.tree_count(), 3);
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[0].position, Vec3::new(2.0, 5.0, 7.0));
        assert_eq!(instances[0].category, CellCategory::Alive);
        assert_eq!(instances[1].position, Vec3::new(3.0, 4.0, 7.0));
        assert_eq!(instances[1].category, CellCategory::Burning);
        assert_eq!(instances[2].category, CellCategory::Ash);
    }
}
