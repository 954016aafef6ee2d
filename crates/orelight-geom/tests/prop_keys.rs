use std::collections::HashSet;

use orelight_geom::{BlockPos, ChunkKey, ChunkPos, Direction};
use proptest::prelude::*;

// World-sized ranges: the packed key is only promised unique inside these.
fn arb_block_pos() -> impl Strategy<Value = BlockPos> {
    (-30_000_000i32..30_000_000, -2048i32..2048, -30_000_000i32..30_000_000)
        .prop_map(|(x, y, z)| BlockPos::new(x, y, z))
}

fn arb_chunk_pos() -> impl Strategy<Value = ChunkPos> {
    (any::<i32>(), any::<i32>()).prop_map(|(cx, cz)| ChunkPos::new(cx, cz))
}

proptest! {
    #[test]
    fn block_key_is_stable(p in arb_block_pos()) {
        prop_assert_eq!(p.key(), BlockPos::new(p.x, p.y, p.z).key());
    }

    #[test]
    fn block_key_distinguishes_positions(a in arb_block_pos(), b in arb_block_pos()) {
        prop_assume!(a != b);
        prop_assert_ne!(a.key(), b.key());
    }

    #[test]
    fn six_neighbors_have_distinct_keys(p in arb_block_pos()) {
        let mut keys: HashSet<_> = Direction::ALL.iter().map(|d| p.neighbor(*d).key()).collect();
        keys.insert(p.key());
        prop_assert_eq!(keys.len(), 7);
    }

    #[test]
    fn chunk_key_roundtrips(c in arb_chunk_pos()) {
        prop_assert_eq!(ChunkKey::from(c).pos(), c);
    }

    #[test]
    fn block_lands_in_its_chunk(p in arb_block_pos()) {
        let c = p.chunk_pos();
        prop_assert!(p.x >= c.min_block_x() && p.x < c.min_block_x() + 16);
        prop_assert!(p.z >= c.min_block_z() && p.z < c.min_block_z() + 16);
    }
}

#[test]
fn neighbor_keys_rederive_after_offset() {
    let center = ChunkPos::new(-3, 7);
    let ring: Vec<ChunkPos> = center.range_closed(1).collect();
    assert_eq!(ring.len(), 9);
    for c in ring {
        assert!(c.chebyshev(center) <= 1);
        assert_eq!(c.key().pos(), c);
    }
}
