//! FFI-exposed terrain and configuration types.
//!
//! Hosts describe the landscape with [`Terrain`] and the simulation tunables
//! with [`ForestSimConfig`]; both have stable C layouts.

use crate::error::DefaultForestSimError;
use forest_fire_core::{ForestConfig, ForestError, NoiseParams, TerrainData};

/// Terrain configuration for the forest simulation.
///
/// `width` and `depth` are the ground-plane extents in world units; the forest
/// covers as many whole chunks as fit inside them. Elevation is only used to
/// place tree instances.
///
/// # Example (Conceptual)
/// ```c
/// Terrain terrain;
/// terrain.tag = Flat;
/// terrain.flat.width = 512.0;
/// terrain.flat.depth = 512.0;
/// terrain.flat.resolution = 4.0;
/// terrain.flat.base_elevation = 0.0;
/// ```
#[repr(C)]
pub enum Terrain {
    /// Flat terrain.
    Flat {
        width: f32,
        depth: f32,
        /// Spacing of elevation samples.
        resolution: f32,
        base_elevation: f32,
    },

    /// Single round hill in the centre.
    SingleHill {
        width: f32,
        depth: f32,
        /// Spacing of elevation samples.
        resolution: f32,
        base_elevation: f32,
        /// Height of the hill above base elevation.
        hill_height: f32,
        hill_radius: f32,
    },

    /// Terrain from a heightmap of `nx * ny` values in row-major order.
    ///
    /// The heightmap is copied; the caller may free it after `forest_sim_new`.
    FromHeightmap {
        width: f32,
        depth: f32,
        heightmap_ptr: *const f32,
        /// Number of columns in the heightmap grid.
        nx: usize,
        /// Number of rows in the heightmap grid.
        ny: usize,
        /// Scale factor applied to heightmap values.
        elevation_scale: f32,
        base_elevation: f32,
    },
}

fn check_extent(name: &str, value: f32) -> Result<(), DefaultForestSimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DefaultForestSimError::invalid_terrain_parameter(name, value))
    }
}

fn terrain_error(error: &ForestError) -> DefaultForestSimError {
    DefaultForestSimError::invalid_terrain_parameter_msg("terrain", &error.to_string())
}

impl Terrain {
    /// Build the elevation data this description refers to.
    ///
    /// # Safety
    /// For `FromHeightmap`, `heightmap_ptr` must be null or point to `nx * ny`
    /// readable `f32` values.
    pub(crate) unsafe fn to_terrain_data(&self) -> Result<TerrainData, DefaultForestSimError> {
        match *self {
            Terrain::Flat {
                width,
                depth,
                resolution,
                base_elevation,
            } => {
                check_extent("width", width)?;
                check_extent("depth", depth)?;
                check_extent("resolution", resolution)?;
                TerrainData::flat(width, depth, resolution, base_elevation).map_err(|e| terrain_error(&e))
            }
            Terrain::SingleHill {
                width,
                depth,
                resolution,
                base_elevation,
                hill_height,
                hill_radius,
            } => {
                check_extent("width", width)?;
                check_extent("depth", depth)?;
                check_extent("resolution", resolution)?;
                check_extent("hill_radius", hill_radius)?;
                TerrainData::single_hill(width, depth, resolution, base_elevation, hill_height, hill_radius)
                    .map_err(|e| terrain_error(&e))
            }
            Terrain::FromHeightmap {
                width,
                depth,
                heightmap_ptr,
                nx,
                ny,
                elevation_scale,
                base_elevation,
            } => {
                check_extent("width", width)?;
                check_extent("depth", depth)?;
                if heightmap_ptr.is_null() {
                    return Err(DefaultForestSimError::null_pointer("heightmap_ptr"));
                }
                let len = nx.checked_mul(ny).ok_or_else(|| {
                    DefaultForestSimError::invalid_terrain_parameter_msg("nx * ny", "overflows usize")
                })?;
                // SAFETY: caller guarantees `nx * ny` readable values behind a non-null pointer.
                let heightmap = unsafe { std::slice::from_raw_parts(heightmap_ptr, len) };
                TerrainData::from_heightmap(width, depth, heightmap, nx, ny, elevation_scale, base_elevation)
                    .map_err(|e| terrain_error(&e))
            }
        }
    }
}

/// Simulation tunables with a stable C layout.
///
/// Start from `forest_sim_default_config()` and override fields as needed.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestSimConfig {
    /// Cells per chunk side, at least 3.
    pub chunk_size: usize,
    /// Chance per tick that a growing tree checks for burning neighbours.
    pub fire_spread_speed: f32,
    /// Chance per tick that a burning tree advances its burn.
    pub burn_speed: f32,
    /// Scales wind speed into neighbour weights.
    pub wind_force_multiplier: f32,
    /// Seconds of wall time per tick.
    pub tick_interval: f32,
    /// Noise density multiplier.
    pub noise_density: f64,
    /// Trees grow where `density * noise > threshold`.
    pub noise_threshold: f64,
    /// Seed for the random number generator, used when `use_seed` is set.
    pub seed: u64,
    pub use_seed: bool,
}

impl From<ForestSimConfig> for ForestConfig {
    fn from(config: ForestSimConfig) -> Self {
        let defaults = ForestConfig::default();
        ForestConfig {
            chunk_size: config.chunk_size,
            noise: NoiseParams {
                density: config.noise_density,
                threshold: config.noise_threshold,
                ..defaults.noise
            },
            fire_spread_speed: config.fire_spread_speed,
            burn_speed: config.burn_speed,
            wind_force_multiplier: config.wind_force_multiplier,
            tick_interval: config.tick_interval,
            seed: config.use_seed.then_some(config.seed),
        }
    }
}

impl Default for ForestSimConfig {
    fn default() -> Self {
        let config = ForestConfig::default();
        Self {
            chunk_size: config.chunk_size,
            fire_spread_speed: config.fire_spread_speed,
            burn_speed: config.burn_speed,
            wind_force_multiplier: config.wind_force_multiplier,
            tick_interval: config.tick_interval,
            noise_density: config.noise.density,
            noise_threshold: config.noise.threshold,
            seed: 0,
            use_seed: false,
        }
    }
}

/// Default simulation tunables.
#[no_mangle]
pub extern "C" fn forest_sim_default_config() -> ForestSimConfig {
    ForestSimConfig::default()
}
