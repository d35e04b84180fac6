//! Noise field for initial tree placement
//!
//! Trees are seeded from a smooth 2D gradient noise evaluated in world space,
//! so a forest patch flows across chunk edges without seams:
//!
//! ```text
//! present = density * noise01(offset_x + (x + size * cx) * scale,
//!                             offset_y + (y + size * cy) * scale) > threshold
//! ```
//!
//! `noise01` is Perlin-style gradient noise remapped to [0, 1]; it is exactly
//! 0.5 on integer lattice points. Corner gradients come from an integer hash,
//! so no permutation table or RNG state is needed and the field is fully
//! determined by its parameters.

use serde::{Deserialize, Serialize};

use crate::grid::chunk::ChunkCoord;

/// Seed values for deterministic hashing
/// Using prime numbers for better distribution
const SEED_X: i32 = 1619;
const SEED_Y: i32 = 31337;

/// Integer lattice hash, returns a non-negative value.
#[inline]
fn hash_2d(x: i32, y: i32) -> u32 {
    let mut n = x.wrapping_mul(SEED_X).wrapping_add(y.wrapping_mul(SEED_Y));
    n = (n << 13) ^ n;
    n = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789221))
        .wrapping_add(1376312589);
    (n & 0x7fff_ffff) as u32
}

/// Quintic fade curve (Perlin 2002)
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product of a diagonal corner gradient with the offset to the corner.
#[inline]
fn gradient(hash: u32, dx: f64, dy: f64) -> f64 {
    match (hash >> 4) & 3 {
        0 => dx + dy,
        1 => -dx + dy,
        2 => dx - dy,
        _ => -dx - dy,
    }
}

/// 2D gradient noise in [-1, 1], zero on integer lattice points.
pub fn perlin_2d(x: f64, y: f64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let ix = x0 as i32;
    let iy = y0 as i32;

    let n00 = gradient(hash_2d(ix, iy), fx, fy);
    let n10 = gradient(hash_2d(ix.wrapping_add(1), iy), fx - 1.0, fy);
    let n01 = gradient(hash_2d(ix, iy.wrapping_add(1)), fx, fy - 1.0);
    let n11 = gradient(hash_2d(ix.wrapping_add(1), iy.wrapping_add(1)), fx - 1.0, fy - 1.0);

    let u = fade(fx);
    let v = fade(fy);
    lerp(lerp(n00, n10, u), lerp(n01, n11, u), v)
}

/// Gradient noise remapped to [0, 1].
pub fn noise01(x: f64, y: f64) -> f64 {
    ((perlin_2d(x, y) + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Parameters of the tree placement field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    /// World-to-noise scale (smaller = larger forest patches)
    pub scale: f64,
    /// Noise-space offset along x
    pub offset_x: f64,
    /// Noise-space offset along y
    pub offset_y: f64,
    /// Multiplier applied to the [0, 1] noise value
    pub density: f64,
    /// A tree is planted where `density * noise` exceeds this
    pub threshold: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            scale: 0.2,
            offset_x: 1000.0,
            offset_y: 1000.0,
            density: 10.0,
            threshold: 3.0,
        }
    }
}

/// Deterministic tree-presence field over chunk-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseField {
    params: NoiseParams,
    chunk_size: usize,
}

impl NoiseField {
    pub fn new(params: NoiseParams, chunk_size: usize) -> Self {
        Self { params, chunk_size }
    }

    pub fn params(&self) -> &NoiseParams {
        &self.params
    }

    /// Raw scaled density at a chunk-local cell.
    pub fn density_at(&self, chunk: ChunkCoord, x: usize, y: usize) -> f64 {
        let size = self.chunk_size as f64;
        let p = &self.params;
        let nx = p.offset_x + (x as f64 + size * f64::from(chunk.x)) * p.scale;
        let ny = p.offset_y + (y as f64 + size * f64::from(chunk.y)) * p.scale;
        p.density * noise01(nx, ny)
    }

    /// Whether a tree grows at the given chunk-local cell.
    pub fn tree_present(&self, chunk: ChunkCoord, x: usize, y: usize) -> bool {
        self.density_at(chunk, x, y) > self.params.threshold
    }
}
