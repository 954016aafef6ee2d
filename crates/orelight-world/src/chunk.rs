use orelight_geom::{BlockPos, CHUNK_WIDTH, ChunkPos};

use crate::block::Block;

const W: usize = CHUNK_WIDTH as usize;

/// Full-height chunk column with a precomputed surface heightmap.
#[derive(Clone, Debug)]
pub struct ChunkData {
    pub pos: ChunkPos,
    pub min_y: i32,
    pub height: usize,
    blocks: Vec<Block>,
    // highest non-air y per (x, z) column; min_y - 1 when the column is empty
    surface: Vec<i32>,
}

impl ChunkData {
    pub fn new(pos: ChunkPos, min_y: i32, height: usize) -> Self {
        Self {
            pos,
            min_y,
            height,
            blocks: vec![Block::AIR; W * W * height],
            surface: vec![min_y - 1; W * W],
        }
    }

    pub fn from_blocks(pos: ChunkPos, min_y: i32, height: usize, blocks: Vec<Block>) -> Self {
        let mut b = blocks;
        let expect = W * W * height;
        if b.len() != expect {
            b.resize(expect, Block::AIR);
        }
        let mut chunk = Self {
            pos,
            min_y,
            height,
            blocks: b,
            surface: vec![min_y - 1; W * W],
        };
        chunk.recompute_surface();
        chunk
    }

    #[inline]
    fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * W + z) * W + x
    }

    #[inline]
    pub fn max_y(&self) -> i32 {
        self.min_y + self.height as i32 - 1
    }

    #[inline]
    pub fn contains_world(&self, pos: BlockPos) -> bool {
        pos.chunk_pos() == self.pos && pos.y >= self.min_y && pos.y <= self.max_y()
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> Block {
        self.blocks[self.idx(x, y, z)]
    }

    pub fn get_world(&self, pos: BlockPos) -> Option<Block> {
        if !self.contains_world(pos) {
            return None;
        }
        let lx = (pos.x - self.pos.min_block_x()) as usize;
        let lz = (pos.z - self.pos.min_block_z()) as usize;
        let ly = (pos.y - self.min_y) as usize;
        Some(self.get_local(lx, ly, lz))
    }

    /// Writes a block and returns the previous one. Out-of-column writes are ignored.
    pub fn set_world(&mut self, pos: BlockPos, block: Block) -> Option<Block> {
        if !self.contains_world(pos) {
            return None;
        }
        let lx = (pos.x - self.pos.min_block_x()) as usize;
        let lz = (pos.z - self.pos.min_block_z()) as usize;
        let ly = (pos.y - self.min_y) as usize;
        let i = self.idx(lx, ly, lz);
        let old = std::mem::replace(&mut self.blocks[i], block);
        let col = lz * W + lx;
        if !block.is_air() && pos.y > self.surface[col] {
            self.surface[col] = pos.y;
        } else if block.is_air() && pos.y == self.surface[col] {
            self.surface[col] = self.scan_column_top(lx, lz);
        }
        Some(old)
    }

    /// Highest non-air y in the local column, or `min_y - 1` if empty.
    #[inline]
    pub fn surface_local(&self, x: usize, z: usize) -> i32 {
        self.surface[z * W + x]
    }

    /// Highest surface in the whole chunk; the scan bound for the column.
    pub fn top_surface(&self) -> i32 {
        self.surface.iter().copied().max().unwrap_or(self.min_y - 1)
    }

    pub fn has_non_air(&self) -> bool {
        self.blocks.iter().any(|b| !b.is_air())
    }

    fn scan_column_top(&self, x: usize, z: usize) -> i32 {
        (0..self.height)
            .rev()
            .find(|&y| !self.get_local(x, y, z).is_air())
            .map(|y| self.min_y + y as i32)
            .unwrap_or(self.min_y - 1)
    }

    fn recompute_surface(&mut self) {
        for z in 0..W {
            for x in 0..W {
                self.surface[z * W + x] = self.scan_column_top(x, z);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_updates_surface_both_ways() {
        let mut c = ChunkData::new(ChunkPos::new(0, 0), -64, 384);
        assert_eq!(c.surface_local(3, 4), -65);
        let p = BlockPos::new(3, 70, 4);
        assert_eq!(c.set_world(p, Block::new(1)), Some(Block::AIR));
        c.set_world(BlockPos::new(3, 10, 4), Block::new(1));
        assert_eq!(c.surface_local(3, 4), 70);
        c.set_world(p, Block::AIR);
        assert_eq!(c.surface_local(3, 4), 10);
        assert_eq!(c.top_surface(), 10);
    }

    #[test]
    fn negative_chunk_indexing() {
        let mut c = ChunkData::new(ChunkPos::new(-1, -1), 0, 16);
        let p = BlockPos::new(-1, 3, -16);
        assert!(c.contains_world(p));
        c.set_world(p, Block::new(7));
        assert_eq!(c.get_world(p), Some(Block::new(7)));
        assert_eq!(c.get_world(BlockPos::new(0, 3, -16)), None);
        assert_eq!(c.get_world(BlockPos::new(-1, 16, -16)), None);
    }
}
