//! Chunked forest grid and the state shared by its chunks

pub mod chunk;
pub mod config;
pub mod forest_grid;
pub mod terrain;
pub mod wind_field;

// Re-export main types
pub use chunk::{Chunk, ChunkCoord, NeighborLookup, NoNeighbors, SpreadParams, TreeInstance};
pub use config::ForestConfig;
pub use forest_grid::{CellAddress, ForestGrid, ForestStats};
pub use terrain::{HeightSampler, TerrainData};
pub use wind_field::{WindField, WindMatrix};
