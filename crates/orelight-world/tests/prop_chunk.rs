use orelight_geom::{BlockPos, ChunkPos};
use orelight_world::{Block, ChunkData};
use proptest::prelude::*;

fn brute_surface(c: &ChunkData, lx: usize, lz: usize) -> i32 {
    (0..c.height)
        .rev()
        .find(|&y| !c.get_local(lx, y, lz).is_air())
        .map(|y| c.min_y + y as i32)
        .unwrap_or(c.min_y - 1)
}

proptest! {
    #[test]
    fn surface_tracks_arbitrary_writes(
        writes in proptest::collection::vec((0i32..16, -16i32..48, 0i32..16, 0u16..4), 1..64)
    ) {
        let mut c = ChunkData::new(ChunkPos::new(-2, 5), -16, 64);
        let bx = c.pos.min_block_x();
        let bz = c.pos.min_block_z();
        for (x, y, z, id) in writes {
            let p = BlockPos::new(bx + x, y, bz + z);
            c.set_world(p, Block::new(id));
            prop_assert_eq!(c.get_world(p), Some(Block::new(id)));
        }
        for lz in 0..16 {
            for lx in 0..16 {
                prop_assert_eq!(c.surface_local(lx, lz), brute_surface(&c, lx, lz));
            }
        }
    }
}
