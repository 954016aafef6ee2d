use hashbrown::HashMap;
use orelight_geom::{BlockKey, BlockPos, ChunkKey, ChunkPos};

use crate::block::SpatialBlock;

/// Highlighted blocks of one chunk column.
#[derive(Clone, Debug, Default)]
pub struct ChunkRecord {
    pub pos: ChunkPos,
    blocks: HashMap<BlockKey, SpatialBlock>,
}

impl ChunkRecord {
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            blocks: HashMap::new(),
        }
    }

    #[inline]
    pub fn key(&self) -> ChunkKey {
        self.pos.key()
    }

    /// Inserts or replaces the block at its position. Blocks outside this column are ignored.
    pub fn add_block(&mut self, block: SpatialBlock) -> bool {
        if block.pos.chunk_pos() != self.pos {
            log::warn!(
                "block {:?} does not belong to chunk {:?}; ignored",
                block.pos,
                self.pos
            );
            return false;
        }
        self.blocks.insert(block.key(), block);
        true
    }

    pub fn remove_block(&mut self, pos: BlockPos) -> Option<SpatialBlock> {
        self.blocks.remove(&pos.key())
    }

    #[inline]
    pub fn contains(&self, pos: BlockPos) -> bool {
        self.blocks.contains_key(&pos.key())
    }

    pub fn get(&self, pos: BlockPos) -> Option<&SpatialBlock> {
        self.blocks.get(&pos.key())
    }

    pub(crate) fn get_mut(&mut self, pos: BlockPos) -> Option<&mut SpatialBlock> {
        self.blocks.get_mut(&pos.key())
    }

    #[inline]
    pub fn has_blocks(&self) -> bool {
        !self.blocks.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn blocks(&self) -> impl Iterator<Item = &SpatialBlock> {
        self.blocks.values()
    }

    pub(crate) fn blocks_mut(&mut self) -> impl Iterator<Item = &mut SpatialBlock> {
        self.blocks.values_mut()
    }

    /// Positions in ascending order; for comparisons and tests.
    pub fn sorted_positions(&self) -> Vec<BlockPos> {
        let mut v: Vec<BlockPos> = self.blocks.values().map(|b| b.pos).collect();
        v.sort();
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn rejects_foreign_blocks() {
        let mut r = ChunkRecord::new(ChunkPos::new(0, 0));
        assert!(!r.add_block(SpatialBlock::new(BlockPos::new(16, 0, 0), Color::WHITE)));
        assert!(r.add_block(SpatialBlock::new(BlockPos::new(15, 0, 0), Color::WHITE)));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn add_replaces_same_position() {
        let mut r = ChunkRecord::new(ChunkPos::new(-1, 0));
        let p = BlockPos::new(-3, 12, 4);
        r.add_block(SpatialBlock::new(p, Color::WHITE));
        r.add_block(SpatialBlock::new(p, Color::rgb(1, 2, 3)));
        assert_eq!(r.len(), 1);
        assert_eq!(r.get(p).unwrap().color, Color::rgb(1, 2, 3));
        assert!(r.remove_block(p).is_some());
        assert!(!r.has_blocks());
    }
}
