use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashMap;
use orelight_geom::{BlockPos, ChunkPos};

use crate::block::{Block, BlockTable};
use crate::chunk::ChunkData;

/// Read access to the loaded world, shared with background tasks.
pub trait WorldView: Send + Sync {
    fn blocks(&self) -> &BlockTable;

    /// Lowest buildable y (inclusive).
    fn min_y(&self) -> i32;

    /// Highest buildable y (inclusive).
    fn max_y(&self) -> i32;

    fn chunk(&self, pos: ChunkPos) -> Option<Arc<ChunkData>>;

    fn loaded_chunks(&self) -> Vec<ChunkPos>;

    /// Unloaded positions read as air.
    fn block_at(&self, pos: BlockPos) -> Block {
        self.chunk(pos.chunk_pos())
            .and_then(|c| c.get_world(pos))
            .unwrap_or(Block::AIR)
    }

    fn is_loaded(&self, pos: ChunkPos) -> bool {
        self.chunk(pos).is_some()
    }

    fn is_opaque(&self, pos: BlockPos) -> bool {
        self.blocks().is_opaque(self.block_at(pos))
    }

    fn is_air(&self, pos: BlockPos) -> bool {
        self.blocks().is_air(self.block_at(pos))
    }

    fn in_build_height(&self, y: i32) -> bool {
        y >= self.min_y() && y <= self.max_y()
    }

    /// Highest non-air y of the column, `None` when its chunk is not loaded.
    fn surface_height(&self, x: i32, z: i32) -> Option<i32> {
        let chunk = self.chunk(ChunkPos::containing(x, z))?;
        let lx = (x - chunk.pos.min_block_x()) as usize;
        let lz = (z - chunk.pos.min_block_z()) as usize;
        Some(chunk.surface_local(lx, lz))
    }
}

/// In-memory world of chunk columns behind a reader-writer lock.
pub struct GridWorld {
    table: BlockTable,
    min_y: i32,
    height: usize,
    chunks: RwLock<HashMap<ChunkPos, Arc<ChunkData>>>,
}

impl GridWorld {
    pub fn new(table: BlockTable, min_y: i32, height: usize) -> Self {
        Self {
            table,
            min_y,
            height,
            chunks: RwLock::new(HashMap::new()),
        }
    }

    /// Overworld build limits.
    pub fn overworld(table: BlockTable) -> Self {
        Self::new(table, -64, 384)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn empty_chunk(&self, pos: ChunkPos) -> ChunkData {
        ChunkData::new(pos, self.min_y, self.height)
    }

    pub fn insert_chunk(&self, chunk: ChunkData) -> Option<Arc<ChunkData>> {
        let mut chunks = self.chunks.write().unwrap_or_else(PoisonError::into_inner);
        chunks.insert(chunk.pos, Arc::new(chunk))
    }

    pub fn remove_chunk(&self, pos: ChunkPos) -> Option<Arc<ChunkData>> {
        let mut chunks = self.chunks.write().unwrap_or_else(PoisonError::into_inner);
        chunks.remove(&pos)
    }

    /// Replaces a block and returns the previous one; `None` if the chunk is not loaded.
    pub fn set_block(&self, pos: BlockPos, block: Block) -> Option<Block> {
        let mut chunks = self.chunks.write().unwrap_or_else(PoisonError::into_inner);
        let chunk = chunks.get_mut(&pos.chunk_pos())?;
        Arc::make_mut(chunk).set_world(pos, block)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
            .read()
            .map(|m| m.len())
            .unwrap_or_else(|e| e.into_inner().len())
    }
}

impl WorldView for GridWorld {
    fn blocks(&self) -> &BlockTable {
        &self.table
    }

    fn min_y(&self) -> i32 {
        self.min_y
    }

    fn max_y(&self) -> i32 {
        self.min_y + self.height as i32 - 1
    }

    fn chunk(&self, pos: ChunkPos) -> Option<Arc<ChunkData>> {
        let chunks = self.chunks.read().unwrap_or_else(PoisonError::into_inner);
        chunks.get(&pos).cloned()
    }

    fn loaded_chunks(&self) -> Vec<ChunkPos> {
        let chunks = self.chunks.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<ChunkPos> = chunks.keys().copied().collect();
        out.sort();
        out
    }
}
