//! Terrain elevation collaborator
//!
//! The fire engine never reads elevation itself. Renderers need a height to
//! place each tree instance, and the grid needs terrain extents to size its
//! chunk array; both go through this module.

use crate::error::ForestError;
use serde::{Deserialize, Serialize};

/// Source of ground elevation for tree placement.
pub trait HeightSampler {
    /// Elevation (z) at ground position (x, y).
    fn sample_height(&self, x: f32, y: f32) -> f32;
}

impl<F> HeightSampler for F
where
    F: Fn(f32, f32) -> f32,
{
    fn sample_height(&self, x: f32, y: f32) -> f32 {
        self(x, y)
    }
}

/// Terrain data structure holding elevation information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainData {
    /// Extent along x in world units
    pub(crate) width: f32,
    /// Extent along y in world units
    pub(crate) depth: f32,
    /// Sample spacing along x in world units
    pub(crate) resolution: f32,
    /// Sample spacing along y in world units
    pub(crate) row_spacing: f32,
    /// Number of elevation samples in X direction
    pub(crate) nx: usize,
    /// Number of elevation samples in Y direction
    pub(crate) ny: usize,
    /// Elevation data (row-major order: [y * nx + x])
    pub(crate) elevations: Vec<f32>,
    /// Minimum elevation in dataset
    pub(crate) min_elevation: f32,
    /// Maximum elevation in dataset
    pub(crate) max_elevation: f32,
}

impl TerrainData {
    /// Create flat terrain at given elevation
    ///
    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] when an extent or the
    /// resolution is not finite and positive.
    pub fn flat(width: f32, depth: f32, resolution: f32, elevation: f32) -> Result<Self, ForestError> {
        let (nx, ny) = sample_counts(width, depth, resolution)?;

        Ok(TerrainData {
            width,
            depth,
            resolution,
            row_spacing: resolution,
            nx,
            ny,
            elevations: vec![elevation; nx * ny],
            min_elevation: elevation,
            max_elevation: elevation,
        })
    }

    /// Create terrain with a single Gaussian hill in the centre
    ///
    /// # Errors
    /// Same as [`TerrainData::flat`], and also when `hill_radius` is not
    /// finite and positive.
    pub fn single_hill(
        width: f32,
        depth: f32,
        resolution: f32,
        base_elevation: f32,
        hill_height: f32,
        hill_radius: f32,
    ) -> Result<Self, ForestError> {
        check_positive("hill_radius", hill_radius)?;
        let (nx, ny) = sample_counts(width, depth, resolution)?;
        let mut elevations = Vec::with_capacity(nx * ny);

        let center_x = width / 2.0;
        let center_y = depth / 2.0;

        let mut min_elev = f32::MAX;
        let mut max_elev = f32::MIN;

        for iy in 0..ny {
            for ix in 0..nx {
                let dx = ix as f32 * resolution - center_x;
                let dy = iy as f32 * resolution - center_y;
                let dist_sq = dx * dx + dy * dy;

                let elev = base_elevation + hill_height * (-dist_sq / (hill_radius * hill_radius)).exp();

                elevations.push(elev);
                min_elev = min_elev.min(elev);
                max_elev = max_elev.max(elev);
            }
        }

        Ok(TerrainData {
            width,
            depth,
            resolution,
            row_spacing: resolution,
            nx,
            ny,
            elevations,
            min_elevation: min_elev,
            max_elevation: max_elev,
        })
    }

    /// Create terrain from a heightmap array
    ///
    /// # Arguments
    /// * `width`, `depth` - Terrain extents
    /// * `heightmap` - Samples in row-major order [y * nx + x], nominally in [0, 1]
    /// * `nx`, `ny` - Sample counts (each at least 2)
    /// * `elevation_scale` - Multiplier for heightmap values
    /// * `base_elevation` - Added to all heights
    ///
    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] when the sample count does not
    /// match `nx * ny`, either dimension is below 2, or the extents are not positive.
    pub fn from_heightmap(
        width: f32,
        depth: f32,
        heightmap: &[f32],
        nx: usize,
        ny: usize,
        elevation_scale: f32,
        base_elevation: f32,
    ) -> Result<Self, ForestError> {
        if nx < 2 || ny < 2 {
            return Err(ForestError::invalid_parameter(
                "heightmap",
                format!("needs at least 2x2 samples, got {nx}x{ny}"),
            ));
        }
        if nx.checked_mul(ny) != Some(heightmap.len()) {
            return Err(ForestError::invalid_parameter(
                "heightmap",
                format!("expected {nx}x{ny} samples, got {}", heightmap.len()),
            ));
        }
        check_positive("width", width)?;
        check_positive("depth", depth)?;

        let mut min_elev = f32::MAX;
        let mut max_elev = f32::MIN;
        let elevations: Vec<f32> = heightmap
            .iter()
            .map(|&h| {
                let elev = base_elevation + h * elevation_scale;
                min_elev = min_elev.min(elev);
                max_elev = max_elev.max(elev);
                elev
            })
            .collect();

        Ok(TerrainData {
            width,
            depth,
            resolution: width / (nx - 1) as f32,
            row_spacing: depth / (ny - 1) as f32,
            nx,
            ny,
            elevations,
            min_elevation: min_elev,
            max_elevation: max_elev,
        })
    }

    /// Query elevation at world position (x, y) using bilinear interpolation
    pub fn elevation_at(&self, x: f32, y: f32) -> f32 {
        // Clamp to terrain bounds
        let gx = x.clamp(0.0, self.width) / self.resolution;
        let gy = y.clamp(0.0, self.depth) / self.row_spacing;

        let ix0 = (gx.floor() as usize).min(self.nx - 2);
        let iy0 = (gy.floor() as usize).min(self.ny - 2);
        let ix1 = ix0 + 1;
        let iy1 = iy0 + 1;

        let fx = (gx - ix0 as f32).clamp(0.0, 1.0);
        let fy = (gy - iy0 as f32).clamp(0.0, 1.0);

        let e00 = self.elevations[iy0 * self.nx + ix0];
        let e10 = self.elevations[iy0 * self.nx + ix1];
        let e01 = self.elevations[iy1 * self.nx + ix0];
        let e11 = self.elevations[iy1 * self.nx + ix1];

        let e0 = e00 * (1.0 - fx) + e10 * fx;
        let e1 = e01 * (1.0 - fx) + e11 * fx;
        e0 * (1.0 - fy) + e1 * fy
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn min_elevation(&self) -> f32 {
        self.min_elevation
    }

    pub fn max_elevation(&self) -> f32 {
        self.max_elevation
    }
}

fn check_positive(name: &str, value: f32) -> Result<(), ForestError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ForestError::invalid_parameter(
            name,
            format!("must be finite and positive, got {value}"),
        ))
    }
}

/// Sample counts covering `width` x `depth` at `resolution`, at least 2 per axis.
fn sample_counts(width: f32, depth: f32, resolution: f32) -> Result<(usize, usize), ForestError> {
    check_positive("width", width)?;
    check_positive("depth", depth)?;
    check_positive("resolution", resolution)?;

    let axis = |extent: f32| -> Option<usize> {
        let steps = (extent / resolution).ceil();
        if steps.is_finite() && steps < u32::MAX as f32 {
            (steps as usize).max(1).checked_add(1)
        } else {
            None
        }
    };
    match (axis(width), axis(depth)) {
        (Some(nx), Some(ny)) if nx.checked_mul(ny).is_some() => Ok((nx, ny)),
        _ => Err(ForestError::invalid_parameter(
            "resolution",
            format!("{resolution} is too fine for a {width}x{depth} terrain"),
        )),
    }
}

impl HeightSampler for TerrainData {
    fn sample_height(&self, x: f32, y: f32) -> f32 {
        self.elevation_at(x, y)
    }
}
