//! Chunk grid that owns the forest
//!
//! `ForestGrid` maps world positions to chunk-local cells, drives the tick over
//! every chunk, and owns the state chunks share: configuration, wind and the
//! random number generator. Chunks are addressed by index only; during a
//! chunk's tick the grid lends it a read-only view of its siblings.

use crate::core_types::{Cell, CellCategory, NoiseField, NoiseParams, Vec3};
use crate::error::ForestError;
use crate::grid::chunk::{Chunk, ChunkCoord, NeighborLookup};
use crate::grid::config::{validate_noise, validate_probability, ForestConfig};
use crate::grid::terrain::TerrainData;
use crate::grid::wind_field::WindField;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Range of noise scales picked by [`ForestGrid::generate`]
const GENERATE_SCALE_RANGE: std::ops::Range<f64> = 0.1..0.6;
/// Range of noise offsets picked by [`ForestGrid::generate`]
const GENERATE_OFFSET_RANGE: std::ops::Range<f64> = -1000.0..1000.0;

/// A world position resolved to a chunk and a cell inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub chunk: ChunkCoord,
    pub x: usize,
    pub y: usize,
}

/// Aggregate counts over all chunks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestStats {
    pub active_chunks: usize,
    pub alive: usize,
    pub burning: usize,
    pub burned: usize,
    pub ticks: u64,
}

impl ForestStats {
    /// Occupied cells in any state
    pub fn trees(&self) -> usize {
        self.alive + self.burning + self.burned
    }
}

/// Read-only view of sibling chunks handed to a ticking chunk
struct ChunkNeighbors<'a> {
    chunks: &'a [Chunk],
    width: usize,
    height: usize,
}

impl NeighborLookup for ChunkNeighbors<'_> {
    #[inline]
    fn is_burning(&self, chunk: ChunkCoord, x: usize, y: usize) -> bool {
        chunk_index(self.width, self.height, chunk)
            .is_some_and(|idx| self.chunks[idx].is_burning_local(x, y))
    }
}

/// Chunks are stored x outer, y inner; the tick visits them in that order.
#[inline]
fn chunk_index(width: usize, height: usize, coord: ChunkCoord) -> Option<usize> {
    let x = usize::try_from(coord.x).ok()?;
    let y = usize::try_from(coord.y).ok()?;
    (x < width && y < height).then_some(x * height + y)
}

/// Forest made of a fixed rectangular array of chunks
#[derive(Debug, Clone)]
pub struct ForestGrid {
    config: ForestConfig,
    /// Chunks along x
    width: usize,
    /// Chunks along y
    height: usize,
    chunks: Vec<Chunk>,
    wind: WindField,
    rng: StdRng,
    tick_count: u64,
}

impl ForestGrid {
    /// Create a grid of `width × height` dormant chunks.
    ///
    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] for an invalid config or an
    /// empty grid.
    pub fn new(width: usize, height: usize, config: ForestConfig) -> Result<Self, ForestError> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(ForestError::invalid_parameter(
                "grid",
                format!("needs at least one chunk, got {width}x{height}"),
            ));
        }

        let chunks = (0..width)
            .flat_map(|x| (0..height).map(move |y| (x, y)))
            .map(|(x, y)| Chunk::new(ChunkCoord::new(x as i32, y as i32), config.chunk_size))
            .collect();

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };
        let wind = WindField::new(config.wind_force_multiplier);

        info!(
            "Created forest grid: {}x{} chunks of {} cells",
            width, height, config.chunk_size
        );

        Ok(Self {
            config,
            width,
            height,
            chunks,
            wind,
            rng,
            tick_count: 0,
        })
    }

    /// Create a grid covering `world_width × world_depth`; partial chunks at
    /// the far edges are dropped.
    ///
    /// # Errors
    /// See [`ForestGrid::new`]; also fails for non-finite or negative extents.
    pub fn from_extents(world_width: f32, world_depth: f32, config: ForestConfig) -> Result<Self, ForestError> {
        if !(world_width.is_finite() && world_depth.is_finite() && world_width >= 0.0 && world_depth >= 0.0) {
            return Err(ForestError::invalid_parameter(
                "extents",
                format!("must be finite and non-negative, got {world_width}x{world_depth}"),
            ));
        }
        let size = config.chunk_size.max(1);
        let width = world_width as usize / size;
        let height = world_depth as usize / size;
        Self::new(width, height, config)
    }

    /// Create a grid covering the terrain's extents.
    ///
    /// # Errors
    /// See [`ForestGrid::from_extents`].
    pub fn from_terrain(terrain: &TerrainData, config: ForestConfig) -> Result<Self, ForestError> {
        Self::from_extents(terrain.width(), terrain.depth(), config)
    }

    /// Grid size in chunks (x, y)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn wind(&self) -> &WindField {
        &self.wind
    }

    /// Steps run since construction
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        chunk_index(self.width, self.height, coord).map(|idx| &self.chunks[idx])
    }

    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        chunk_index(self.width, self.height, coord).map(|idx| &mut self.chunks[idx])
    }

    /// All chunks, x outer, y inner.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Resolve a world position (ground plane x, y) to its chunk and cell.
    ///
    /// # Errors
    /// Returns [`ForestError::CoordinateOutOfRange`] outside the grid.
    pub fn locate(&self, pos: &Vec3) -> Result<CellAddress, ForestError> {
        let out_of_range = || ForestError::CoordinateOutOfRange { x: pos.x, y: pos.y };
        if !(pos.x.is_finite() && pos.y.is_finite()) || pos.x < 0.0 || pos.y < 0.0 {
            return Err(out_of_range());
        }

        let size = self.config.chunk_size;
        let gx = pos.x.floor() as usize;
        let gy = pos.y.floor() as usize;
        let (cx, cy) = (gx / size, gy / size);
        if cx >= self.width || cy >= self.height {
            return Err(out_of_range());
        }

        Ok(CellAddress {
            chunk: ChunkCoord::new(cx as i32, cy as i32),
            x: gx - cx * size,
            y: gy - cy * size,
        })
    }

    /// Cell under a world position.
    ///
    /// # Errors
    /// Returns [`ForestError::CoordinateOutOfRange`] outside the grid.
    pub fn cell_at(&self, pos: &Vec3) -> Result<Cell, ForestError> {
        let addr = self.locate(pos)?;
        Ok(self
            .chunk(addr.chunk)
            .and_then(|chunk| chunk.cell(addr.x, addr.y))
            .unwrap_or(Cell::EMPTY))
    }

    /// Whether local cell `(x, y)` of `chunk` is burning; false outside the grid.
    pub fn is_burning(&self, chunk: ChunkCoord, x: usize, y: usize) -> bool {
        self.neighbors().is_burning(chunk, x, y)
    }

    fn neighbors(&self) -> ChunkNeighbors<'_> {
        ChunkNeighbors {
            chunks: &self.chunks,
            width: self.width,
            height: self.height,
        }
    }

    /// Pick fresh noise parameters and populate every chunk.
    pub fn generate(&mut self) {
        let noise = NoiseParams {
            scale: self.rng.random_range(GENERATE_SCALE_RANGE),
            offset_x: self.rng.random_range(GENERATE_OFFSET_RANGE),
            offset_y: self.rng.random_range(GENERATE_OFFSET_RANGE),
            ..self.config.noise
        };
        self.populate(noise);
    }

    /// Populate every chunk from fixed noise parameters.
    ///
    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] for unusable noise parameters.
    pub fn generate_with(&mut self, noise: NoiseParams) -> Result<(), ForestError> {
        validate_noise(&noise)?;
        self.populate(noise);
        Ok(())
    }

    fn populate(&mut self, noise: NoiseParams) {
        self.config.noise = noise;
        let field = NoiseField::new(noise, self.config.chunk_size);
        for chunk in &mut self.chunks {
            chunk.activate(&field);
        }
        info!(
            "Generated forest: scale {:.3}, offset ({:.1}, {:.1}), {} trees",
            noise.scale,
            noise.offset_x,
            noise.offset_y,
            self.chunks.iter().map(Chunk::tree_count).sum::<usize>()
        );
    }

    /// Return every chunk to dormant.
    pub fn clear(&mut self) {
        for chunk in &mut self.chunks {
            chunk.deactivate();
        }
        info!("Cleared forest");
    }

    /// Advance the simulation by one tick: every active chunk once, x outer.
    pub fn step(&mut self) {
        for idx in 0..self.chunks.len() {
            self.tick_index(idx);
        }
        self.tick_count += 1;
        debug!(tick = self.tick_count, "Forest step");
    }

    /// Tick a single chunk.
    ///
    /// # Errors
    /// [`ForestError::CoordinateOutOfRange`] for a chunk outside the grid,
    /// [`ForestError::ChunkNotActive`] for a dormant one.
    pub fn tick_chunk(&mut self, coord: ChunkCoord) -> Result<(), ForestError> {
        let idx = chunk_index(self.width, self.height, coord).ok_or_else(|| {
            let size = self.config.chunk_size as f32;
            ForestError::CoordinateOutOfRange {
                x: coord.x as f32 * size,
                y: coord.y as f32 * size,
            }
        })?;
        if !self.chunks[idx].is_active() {
            return Err(ForestError::ChunkNotActive { chunk: coord });
        }
        self.tick_index(idx);
        Ok(())
    }

    fn tick_index(&mut self, idx: usize) {
        if !self.chunks[idx].is_active() {
            return;
        }
        // Lift the chunk out so its siblings can be borrowed while it mutates.
        // Neighbour lookups never resolve back to the chunk being ticked.
        let mut chunk = std::mem::take(&mut self.chunks[idx]);
        let params = self.config.spread_params();
        let neighbors = ChunkNeighbors {
            chunks: &self.chunks,
            width: self.width,
            height: self.height,
        };
        chunk.tick(&neighbors, self.wind.matrix(), &params, &mut self.rng);
        self.chunks[idx] = chunk;
    }

    fn with_cell<F>(&mut self, pos: &Vec3, action: &str, edit: F) -> Result<(), ForestError>
    where
        F: FnOnce(&mut Chunk, usize, usize) -> Result<(), ForestError>,
    {
        let result = self.locate(pos).and_then(|addr| {
            let idx = chunk_index(self.width, self.height, addr.chunk)
                .ok_or(ForestError::CoordinateOutOfRange { x: pos.x, y: pos.y })?;
            edit(&mut self.chunks[idx], addr.x, addr.y)
        });
        if let Err(e) = &result {
            debug!("Rejected {} at ({}, {}): {}", action, pos.x, pos.y, e);
        }
        result
    }

    /// Plant a tree at a world position if the slot is empty.
    ///
    /// # Errors
    /// [`ForestError::CoordinateOutOfRange`] outside the grid,
    /// [`ForestError::ChunkNotActive`] on a dormant chunk.
    pub fn add_tree_at(&mut self, pos: &Vec3) -> Result<(), ForestError> {
        self.with_cell(pos, "add tree", Chunk::add_tree)
    }

    /// Remove the tree at a world position.
    ///
    /// # Errors
    /// See [`ForestGrid::add_tree_at`].
    pub fn remove_tree_at(&mut self, pos: &Vec3) -> Result<(), ForestError> {
        self.with_cell(pos, "remove tree", Chunk::remove_tree)
    }

    /// Set the growing tree at a world position on fire.
    ///
    /// # Errors
    /// See [`ForestGrid::add_tree_at`].
    pub fn ignite_at(&mut self, pos: &Vec3) -> Result<(), ForestError> {
        self.with_cell(pos, "ignite", Chunk::ignite)
    }

    /// Put out fire at a world position; interior cells also clear their
    /// 3×3 neighbourhood within the chunk.
    ///
    /// # Errors
    /// See [`ForestGrid::add_tree_at`].
    pub fn extinguish_at(&mut self, pos: &Vec3) -> Result<(), ForestError> {
        self.with_cell(pos, "extinguish", Chunk::extinguish)
    }

    /// Try to start one fire in every active chunk. Returns how many started.
    pub fn add_random_fire(&mut self) -> usize {
        let mut started = 0;
        for chunk in &mut self.chunks {
            if chunk.add_random_fire(&mut self.rng) {
                started += 1;
            }
        }
        debug!("Random fire started in {} chunks", started);
        started
    }

    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] for negative or non-finite speed.
    pub fn set_wind_speed(&mut self, speed: f32) -> Result<(), ForestError> {
        self.wind.set_speed(speed)
    }

    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] for a non-finite angle.
    pub fn set_wind_direction(&mut self, radians: f32) -> Result<(), ForestError> {
        self.wind.set_direction(radians)
    }

    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] for negative or non-finite values.
    pub fn set_wind_force_multiplier(&mut self, multiplier: f32) -> Result<(), ForestError> {
        self.wind.set_force_multiplier(multiplier)?;
        self.config.wind_force_multiplier = multiplier;
        Ok(())
    }

    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] outside [0, 1].
    pub fn set_fire_spread_speed(&mut self, probability: f32) -> Result<(), ForestError> {
        validate_probability("fire_spread_speed", probability)?;
        self.config.fire_spread_speed = probability;
        Ok(())
    }

    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] outside [0, 1].
    pub fn set_burn_speed(&mut self, probability: f32) -> Result<(), ForestError> {
        validate_probability("burn_speed", probability)?;
        self.config.burn_speed = probability;
        Ok(())
    }

    /// Noise used by the next generation; existing trees are untouched.
    ///
    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] for unusable noise parameters.
    pub fn set_noise_params(&mut self, noise: NoiseParams) -> Result<(), ForestError> {
        validate_noise(&noise)?;
        self.config.noise = noise;
        Ok(())
    }

    /// Count trees by state across all chunks.
    pub fn stats(&self) -> ForestStats {
        let mut stats = ForestStats {
            ticks: self.tick_count,
            ..Default::default()
        };
        for chunk in self.chunks.iter().filter(|c| c.is_active()) {
            stats.active_chunks += 1;
            for category in chunk.categories() {
                match category {
                    CellCategory::Alive => stats.alive += 1,
                    CellCategory::Burning => stats.burning += 1,
                    CellCategory::Ash => stats.burned += 1,
                }
            }
        }
        stats
    }
}
