use orelight_geom::{BlockPos, Direction};
use orelight_highlight::{
    Color, EdgeMask, FACE_EDGES, NeighborFlags, SpatialBlock, SpatialCache, visible_edges,
};
use proptest::prelude::*;

fn face(dir: Direction) -> EdgeMask {
    FACE_EDGES
        .iter()
        .find(|(d, _)| *d == dir)
        .map(|(_, m)| *m)
        .unwrap()
}

#[test]
fn all_64_flag_combinations_are_order_independent() {
    for bits in 0u8..64 {
        let flags = NeighborFlags::from_bits(bits);
        let expected = visible_edges(flags);
        assert_eq!(visible_edges(flags), expected);
        let mut reversed = EdgeMask::ALL;
        for dir in Direction::ALL.iter().rev() {
            if flags.get(*dir) {
                reversed = reversed & !face(*dir);
            }
        }
        assert_eq!(reversed, expected, "bits {bits:06b}");
    }
}

#[test]
fn single_neighbour_clears_exactly_its_face() {
    for dir in Direction::ALL {
        let mask = visible_edges(NeighborFlags::empty().with(dir, true));
        assert_eq!(mask.count(), 8);
        assert!((mask & face(dir)).is_empty());
    }
}

fn coord() -> impl Strategy<Value = (i32, i32, i32)> {
    (-20i32..20, -4i32..4, -20i32..20)
}

proptest! {
    #[test]
    fn insertion_order_does_not_change_masks(
        mut positions in proptest::collection::vec(coord(), 1..40),
    ) {
        let forward = SpatialCache::new();
        forward.with_lock(|s| {
            for &(x, y, z) in &positions {
                s.update_block(true, SpatialBlock::new(BlockPos::new(x, y, z), Color::WHITE));
            }
        });
        positions.reverse();
        let backward = SpatialCache::new();
        backward.with_lock(|s| {
            for &(x, y, z) in &positions {
                s.update_block(true, SpatialBlock::new(BlockPos::new(x, y, z), Color::WHITE));
            }
        });
        for &(x, y, z) in &positions {
            let p = BlockPos::new(x, y, z);
            let a = forward.with_lock(|s| s.block(p).map(|b| b.visible_edges));
            let b = backward.with_lock(|s| s.block(p).map(|b| b.visible_edges));
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn adding_a_block_only_touches_its_neighbourhood(
        positions in proptest::collection::vec(coord(), 1..40),
        added in coord(),
    ) {
        let cache = SpatialCache::new();
        let added = BlockPos::new(added.0, added.1, added.2);
        let before: Vec<(BlockPos, EdgeMask)> = cache.with_lock(|s| {
            for &(x, y, z) in &positions {
                s.update_block(true, SpatialBlock::new(BlockPos::new(x, y, z), Color::WHITE));
            }
            s.records().flat_map(|r| r.blocks().map(|b| (b.pos, b.visible_edges))).collect()
        });
        cache.with_lock(|s| s.update_block(true, SpatialBlock::new(added, Color::WHITE)));
        for (pos, mask) in before {
            let after = cache.with_lock(|s| s.block(pos).map(|b| b.visible_edges));
            if pos.chebyshev(added) > 1 {
                prop_assert_eq!(after, Some(mask));
            }
        }
    }

    #[test]
    fn no_empty_records_after_mixed_updates(
        ops in proptest::collection::vec((any::<bool>(), coord()), 1..80),
    ) {
        let cache = SpatialCache::new();
        cache.with_lock(|s| {
            for (add, (x, y, z)) in ops {
                s.update_block(add, SpatialBlock::new(BlockPos::new(x, y, z), Color::WHITE));
            }
        });
        let empties = cache.with_lock(|s| s.records().filter(|r| !r.has_blocks()).count());
        prop_assert_eq!(empties, 0);
    }
}
