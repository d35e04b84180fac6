//! Forest Fire Simulation Core Library
//!
//! Chunked cellular-automaton wildfire spread. The forest is a rectangular
//! grid of square chunks; each cell holds one byte that moves a tree from
//! growing through burning to ash. Fire crosses chunk edges through
//! index-based neighbour lookups owned by the grid, pushed along by a wind
//! field that weights the eight neighbour directions.
//!
//! ## Layout
//!
//! - [`core_types`]: cell states, gradient noise, vector aliases
//! - [`grid`]: chunks, the chunk grid, wind, terrain heights, configuration
//! - [`render`]: per-chunk instance buffers for instanced drawing
//! - [`simulation`]: action queue and fixed-interval scheduler

// Core types and utilities
pub mod core_types;
pub mod error;

pub mod grid;
pub mod render;
pub mod simulation;

// Re-export core types
pub use core_types::{Cell, CellCategory, NoiseField, NoiseParams, Vec2, Vec3};
pub use error::ForestError;

// Re-export grid types
pub use grid::{
    CellAddress, Chunk, ChunkCoord, ForestConfig, ForestGrid, ForestStats, HeightSampler, TerrainData, WindField,
    WindMatrix,
};
pub use render::{ChunkInstanceBuffers, ForestRenderCache};
pub use simulation::{ForestAction, ForestSimulation};
