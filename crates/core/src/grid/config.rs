//! Forest tunables
//!
//! Everything that used to be process-wide state (chunk size, noise shape,
//! spread probabilities, wind strength) lives in one serialisable object owned
//! by the [`ForestGrid`](crate::grid::ForestGrid).

use crate::core_types::NoiseParams;
use crate::error::ForestError;
use crate::grid::chunk::SpreadParams;
use serde::{Deserialize, Serialize};

/// Smallest chunk that still has interior cells
pub const MIN_CHUNK_SIZE: usize = 3;

/// Configuration for the forest simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Cells per chunk side
    pub chunk_size: usize,

    /// Tree placement noise used by `generate_with` and as the starting point
    /// of `generate`
    pub noise: NoiseParams,

    /// Chance per tick that a growing tree checks for burning neighbours
    pub fire_spread_speed: f32,

    /// Chance per tick that a burning tree advances toward ash
    pub burn_speed: f32,

    /// How strongly wind speed skews the spread matrix
    pub wind_force_multiplier: f32,

    /// Wall-clock seconds between simulation steps when driven by
    /// [`ForestSimulation::update`](crate::simulation::ForestSimulation::update)
    pub tick_interval: f32,

    /// RNG seed; `None` seeds from the thread RNG
    pub seed: Option<u64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64,
            noise: NoiseParams::default(),
            fire_spread_speed: 0.6,
            burn_speed: 0.8,
            wind_force_multiplier: 4.0,
            tick_interval: 0.05,
            seed: None,
        }
    }
}

impl ForestConfig {
    /// Probabilities handed to each chunk tick
    pub fn spread_params(&self) -> SpreadParams {
        SpreadParams {
            fire_spread_speed: self.fire_spread_speed,
            burn_speed: self.burn_speed,
        }
    }

    /// Check every field for a usable value.
    ///
    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(ForestError::invalid_parameter(
                "chunk_size",
                format!("must be at least {MIN_CHUNK_SIZE}, got {}", self.chunk_size),
            ));
        }
        validate_probability("fire_spread_speed", self.fire_spread_speed)?;
        validate_probability("burn_speed", self.burn_speed)?;
        if !self.wind_force_multiplier.is_finite() || self.wind_force_multiplier < 0.0 {
            return Err(ForestError::invalid_parameter(
                "wind_force_multiplier",
                format!("must be finite and non-negative, got {}", self.wind_force_multiplier),
            ));
        }
        if !(self.tick_interval.is_finite() && self.tick_interval > 0.0) {
            return Err(ForestError::invalid_parameter(
                "tick_interval",
                format!("must be finite and positive, got {}", self.tick_interval),
            ));
        }
        validate_noise(&self.noise)
    }
}

pub(crate) fn validate_probability(name: &str, value: f32) -> Result<(), ForestError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ForestError::invalid_parameter(
            name,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}

pub(crate) fn validate_noise(noise: &NoiseParams) -> Result<(), ForestError> {
    if !(noise.scale.is_finite() && noise.scale > 0.0) {
        return Err(ForestError::invalid_parameter(
            "noise.scale",
            format!("must be finite and positive, got {}", noise.scale),
        ));
    }
    let finite = [noise.offset_x, noise.offset_y, noise.density, noise.threshold]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return Err(ForestError::invalid_parameter(
            "noise",
            "offsets, density and threshold must be finite",
        ));
    }
    Ok(())
}
