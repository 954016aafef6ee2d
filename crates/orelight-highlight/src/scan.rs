use orelight_geom::{BlockPos, CHUNK_WIDTH};
use orelight_world::{Block, ChunkData};

use crate::block::SpatialBlock;
use crate::chunk::ChunkRecord;
use crate::color::Color;

/// Collects every position in the column whose block satisfies `predicate`.
///
/// Columns are walked from the floor up to one above their surface; everything
/// higher is air. Read-only: committing the record is the caller's job.
pub fn scan_chunk(
    chunk: &ChunkData,
    color: Color,
    predicate: impl Fn(BlockPos, Block) -> bool,
) -> ChunkRecord {
    let mut record = ChunkRecord::new(chunk.pos);
    let base_x = chunk.pos.min_block_x();
    let base_z = chunk.pos.min_block_z();
    let w = CHUNK_WIDTH as usize;
    for lz in 0..w {
        for lx in 0..w {
            let top = (chunk.surface_local(lx, lz) + 1).min(chunk.max_y());
            for wy in chunk.min_y..=top {
                let ly = (wy - chunk.min_y) as usize;
                let block = chunk.get_local(lx, ly, lz);
                let pos = BlockPos::new(base_x + lx as i32, wy, base_z + lz as i32);
                if predicate(pos, block) {
                    record.add_block(SpatialBlock::new(pos, color));
                }
            }
        }
    }
    log::trace!(
        "scanned chunk {:?}: {} matches",
        chunk.pos,
        record.len()
    );
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use orelight_geom::ChunkPos;

    #[test]
    fn finds_blocks_and_first_air_above_surface() {
        let mut c = ChunkData::new(ChunkPos::new(1, -1), -8, 32);
        c.set_world(BlockPos::new(20, 3, -10), Block::new(6));
        let hits = scan_chunk(&c, Color::WHITE, |_, b| b == Block::new(6));
        assert_eq!(hits.sorted_positions(), vec![BlockPos::new(20, 3, -10)]);
        let air_above = scan_chunk(&c, Color::WHITE, |p, b| b.is_air() && p.y == 4);
        assert_eq!(air_above.sorted_positions(), vec![BlockPos::new(20, 4, -10)]);
    }

    #[test]
    fn rescanning_is_idempotent() {
        let mut c = ChunkData::new(ChunkPos::new(0, 0), 0, 16);
        for i in 0..10 {
            c.set_world(BlockPos::new(i, i, 15 - i), Block::new(2));
        }
        let pred = |_: BlockPos, b: Block| b == Block::new(2);
        let a = scan_chunk(&c, Color::WHITE, pred);
        let b = scan_chunk(&c, Color::WHITE, pred);
        assert_eq!(a.sorted_positions(), b.sorted_positions());
        assert_eq!(a.len(), 10);
    }
}
