//! Directional wind influence on fire spread
//!
//! Wind is reduced to a 3×3 matrix of non-negative weights, one per neighbour
//! offset. A burning neighbour at offset `(dx, dy)` contributes
//! `matrix.weight(dx, dy)` ignition heat to the cell being updated.
//!
//! # Weights
//!
//! ```text
//! weight(dx, dy) = base(dx, dy) + speed * multiplier * dot(normalize(dx, dy), wind_dir)
//! wind_dir       = (cos θ, sin θ)
//! base           = 1.0 orthogonal, 0.5 diagonal
//! ```
//!
//! clamped to ≥ 0. Without wind, fire favours cardinal directions. The
//! direction θ points from the cell toward the neighbour whose fire is
//! amplified, so flames travel toward `-wind_dir` (θ is where the wind blows
//! from).

use crate::core_types::Vec2;
use crate::error::ForestError;
use serde::{Deserialize, Serialize};

/// Relative neighbour offsets, orthogonal first.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

/// Base spread weight for orthogonal neighbours
pub const ORTHOGONAL_BASE_WEIGHT: f32 = 1.0;
/// Base spread weight for diagonal neighbours
pub const DIAGONAL_BASE_WEIGHT: f32 = 0.5;

/// 3×3 neighbour weights indexed by `[dx + 1][dy + 1]`.
///
/// The centre entry is always zero: a cell never ignites itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindMatrix {
    weights: [[f32; 3]; 3],
}

impl Default for WindMatrix {
    fn default() -> Self {
        Self::calm()
    }
}

impl WindMatrix {
    /// Spread weights with no wind.
    pub fn calm() -> Self {
        let mut weights = [[0.0; 3]; 3];
        for (dx, dy) in NEIGHBOR_OFFSETS {
            weights[(dx + 1) as usize][(dy + 1) as usize] = base_weight(dx, dy);
        }
        Self { weights }
    }

    /// Same weight for all eight neighbours.
    ///
    /// Negative input is clamped to zero.
    pub fn uniform(weight: f32) -> Self {
        let mut weights = [[weight.max(0.0); 3]; 3];
        weights[1][1] = 0.0;
        Self { weights }
    }

    /// Weight for the neighbour at `(dx, dy)`, each in {-1, 0, 1}.
    #[inline]
    pub fn weight(&self, dx: i32, dy: i32) -> f32 {
        debug_assert!((-1..=1).contains(&dx) && (-1..=1).contains(&dy));
        self.weights[(dx + 1) as usize][(dy + 1) as usize]
    }

    /// Raw matrix, indexed `[dx + 1][dy + 1]`.
    pub fn as_array(&self) -> &[[f32; 3]; 3] {
        &self.weights
    }
}

#[inline]
fn base_weight(dx: i32, dy: i32) -> f32 {
    if dx == 0 || dy == 0 {
        ORTHOGONAL_BASE_WEIGHT
    } else {
        DIAGONAL_BASE_WEIGHT
    }
}

/// Global wind state and its derived spread matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindField {
    /// Wind speed (≥ 0)
    speed: f32,
    /// Wind direction (radians)
    direction: f32,
    /// Scales how strongly speed skews the matrix
    force_multiplier: f32,
    /// Cached matrix, recomputed on every change
    matrix: WindMatrix,
}

impl Default for WindField {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl WindField {
    /// Calm wind with the given force multiplier.
    pub fn new(force_multiplier: f32) -> Self {
        let mut field = Self {
            speed: 0.0,
            direction: 0.0,
            force_multiplier,
            matrix: WindMatrix::calm(),
        };
        field.recompute();
        field
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn force_multiplier(&self) -> f32 {
        self.force_multiplier
    }

    /// Current spread matrix.
    pub fn matrix(&self) -> &WindMatrix {
        &self.matrix
    }

    /// Unit vector of the wind direction on the ground plane.
    pub fn direction_vector(&self) -> Vec2 {
        Vec2::new(self.direction.cos(), self.direction.sin())
    }

    /// Set wind speed and recompute the matrix.
    ///
    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] for negative or non-finite speed.
    pub fn set_speed(&mut self, speed: f32) -> Result<(), ForestError> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(ForestError::invalid_parameter(
                "wind_speed",
                format!("must be finite and non-negative, got {speed}"),
            ));
        }
        self.speed = speed;
        self.recompute();
        Ok(())
    }

    /// Set wind direction in radians and recompute the matrix.
    ///
    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] for a non-finite angle.
    pub fn set_direction(&mut self, radians: f32) -> Result<(), ForestError> {
        if !radians.is_finite() {
            return Err(ForestError::invalid_parameter(
                "wind_direction",
                format!("must be finite, got {radians}"),
            ));
        }
        self.direction = radians;
        self.recompute();
        Ok(())
    }

    /// Set the force multiplier and recompute the matrix.
    ///
    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] for negative or non-finite values.
    pub fn set_force_multiplier(&mut self, multiplier: f32) -> Result<(), ForestError> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(ForestError::invalid_parameter(
                "wind_force_multiplier",
                format!("must be finite and non-negative, got {multiplier}"),
            ));
        }
        self.force_multiplier = multiplier;
        self.recompute();
        Ok(())
    }

    fn recompute(&mut self) {
        let wind = self.direction_vector();
        let mut weights = [[0.0; 3]; 3];
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let offset = Vec2::new(dx as f32, dy as f32).normalize();
            let influence = self.speed * self.force_multiplier * offset.dot(&wind);
            weights[(dx + 1) as usize][(dy + 1) as usize] =
                (base_weight(dx, dy) + influence).max(0.0);
        }
        self.matrix = WindMatrix { weights };
    }
}
