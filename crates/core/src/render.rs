//! Instance buffers for drawing trees
//!
//! Renderers draw every tree of a chunk as one instanced batch: a position
//! buffer that changes only when trees are planted or removed, and a colour
//! buffer that changes as fire moves through the chunk. Both are laid out in
//! cell order (x outer, y inner) and can be uploaded as raw bytes.

use crate::core_types::CellCategory;
use crate::grid::{Chunk, ChunkCoord, ForestGrid, HeightSampler};

/// Per-chunk GPU instance data
#[derive(Debug, Clone, Default)]
pub struct ChunkInstanceBuffers {
    coord: ChunkCoord,
    /// World positions, w = 1
    positions: Vec<[f32; 4]>,
    colors: Vec<[f32; 3]>,
    /// Chunk layout revision the positions were built from
    revision: Option<u64>,
}

impl ChunkInstanceBuffers {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            ..Default::default()
        }
    }

    /// Bring the buffers in line with `chunk`. Returns true if the position
    /// buffer was rebuilt.
    pub fn update<H>(&mut self, chunk: &Chunk, terrain: &H) -> bool
    where
        H: HeightSampler + ?Sized,
    {
        let rebuild = self.coord != chunk.coord() || self.revision != Some(chunk.layout_revision());
        if rebuild {
            self.coord = chunk.coord();
            self.positions.clear();
            self.positions.extend(
                chunk
                    .instances(terrain)
                    .map(|tree| [tree.position.x, tree.position.y, tree.position.z, 1.0]),
            );
            self.revision = Some(chunk.layout_revision());
        }

        self.colors.clear();
        self.colors.extend(chunk.categories().map(CellCategory::color));
        rebuild
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Number of tree instances
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 4]] {
        &self.positions
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    /// Positions as bytes for upload
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colours as bytes for upload
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }
}

/// Instance buffers for every chunk of a grid, in grid chunk order
#[derive(Debug, Clone, Default)]
pub struct ForestRenderCache {
    chunks: Vec<ChunkInstanceBuffers>,
}

impl ForestRenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh every chunk's buffers. Returns how many position buffers were
    /// rebuilt.
    pub fn sync<H>(&mut self, grid: &ForestGrid, terrain: &H) -> usize
    where
        H: HeightSampler + ?Sized,
    {
        let in_grid_order = self.chunks.len() == grid.chunks().count()
            && self.chunks.iter().zip(grid.chunks()).all(|(b, c)| b.coord() == c.coord());
        if !in_grid_order {
            self.chunks = grid.chunks().map(|c| ChunkInstanceBuffers::new(c.coord())).collect();
        }
        self.chunks
            .iter_mut()
            .zip(grid.chunks())
            .map(|(buffers, chunk)| buffers.update(chunk, terrain))
            .filter(|&rebuilt| rebuilt)
            .count()
    }

    /// Refresh one chunk's buffers and return them; `None` outside the grid.
    pub fn sync_chunk<H>(&mut self, grid: &ForestGrid, coord: ChunkCoord, terrain: &H) -> Option<&ChunkInstanceBuffers>
    where
        H: HeightSampler + ?Sized,
    {
        let chunk = grid.chunk(coord)?;
        let idx = if let Some(idx) = self.chunks.iter().position(|b| b.coord() == coord) {
            idx
        } else {
            self.chunks.push(ChunkInstanceBuffers::new(coord));
            self.chunks.len() - 1
        };
        let buffers = &mut self.chunks[idx];
        buffers.update(chunk, terrain);
        Some(buffers)
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&ChunkInstanceBuffers> {
        self.chunks.iter().find(|b| b.coord() == coord)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkInstanceBuffers> {
        self.chunks.iter()
    }

    /// Trees across all chunks
    pub fn total_instances(&self) -> usize {
        self.chunks.iter().map(ChunkInstanceBuffers::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Cell, Vec3};
    use crate::grid::ForestConfig;

    fn grid() -> ForestGrid {
        let config = ForestConfig {
            chunk_size: 4,
            seed: Some(5),
            ..Default::default()
        };
        let mut grid = ForestGrid::new(2, 1, config).unwrap();
        for chunk in [ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)] {
            grid.chunk_mut(chunk)
                .unwrap()
                .activate_with(|x, y| if x == y { Cell::GROWING } else { Cell::EMPTY });
        }
        grid
    }

    #[test]
    fn test_positions_follow_terrain() {
        let grid = grid();
        let mut buffers = ChunkInstanceBuffers::new(ChunkCoord::new(1, 0));
        let chunk = grid.chunk(ChunkCoord::new(1, 0)).unwrap();

        assert!(buffers.update(chunk, &|x: f32, _y: f32| x * 0.5));
        assert_eq!(buffers.len(), 4);
        assert_eq!(buffers.positions()[0], [4.0, 0.0, 2.0, 1.0]);
        assert_eq!(buffers.positions()[3], [7.0, 3.0, 3.5, 1.0]);
        assert_eq!(buffers.colors()[0], [0.0, 0.8, 0.0]);
        assert_eq!(buffers.position_bytes().len(), 4 * 16);
        assert_eq!(buffers.color_bytes().len(), 4 * 12);
    }

    #[test]
    fn test_positions_rebuild_only_on_layout_change() {
        let mut grid = grid();
        let flat = |_: f32, _: f32| -> f32 { 0.0 };
        let mut cache = ForestRenderCache::new();

        assert_eq!(cache.sync(&grid, &flat), 2);
        assert_eq!(cache.total_instances(), 8);

        // Fire changes colours only
        grid.ignite_at(&Vec3::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(cache.sync(&grid, &flat), 0);
        let buffers = cache.chunk(ChunkCoord::new(0, 0)).unwrap();
        assert_eq!(buffers.colors()[0], [1.0, 0.0, 0.0]);

        // Planting changes the layout of one chunk
        grid.add_tree_at(&Vec3::new(5.0, 2.0, 0.0)).unwrap();
        assert_eq!(cache.sync(&grid, &flat), 1);
        assert_eq!(cache.total_instances(), 9);

        grid.clear();
        assert_eq!(cache.sync(&grid, &flat), 2);
        assert!(cache.iter().all(ChunkInstanceBuffers::is_empty));
    }

    #[test]
    fn test_sync_single_chunk() {
        let grid = grid();
        let flat = |_: f32, _: f32| -> f32 { 1.0 };
        let mut cache = ForestRenderCache::new();

        let buffers = cache.sync_chunk(&grid, ChunkCoord::new(1, 0), &flat).unwrap();
        assert_eq!(buffers.len(), 4);
        assert_eq!(buffers.positions()[1], [5.0, 1.0, 1.0, 1.0]);
        assert!(cache.sync_chunk(&grid, ChunkCoord::new(2, 0), &flat).is_none());

        // A full sync rebuilds in grid order
        assert_eq!(cache.sync(&grid, &flat), 2);
        assert_eq!(cache.total_instances(), 8);
    }
}
