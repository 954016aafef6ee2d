use orelight_geom::{BlockKey, BlockPos, Direction};

use crate::color::Color;
use crate::edge::{EdgeMask, NeighborFlags, visible_edges};

/// One highlighted block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpatialBlock {
    pub pos: BlockPos,
    pub color: Color,
    pub visible_edges: EdgeMask,
}

impl SpatialBlock {
    pub fn new(pos: BlockPos, color: Color) -> Self {
        Self {
            pos,
            color,
            visible_edges: EdgeMask::ALL,
        }
    }

    #[inline]
    pub fn key(&self) -> BlockKey {
        self.pos.key()
    }

    /// Recomputes the edge mask from current membership of the six neighbours.
    pub fn refresh_edges(&mut self, mut is_member: impl FnMut(BlockPos) -> bool) {
        let pos = self.pos;
        let flags = NeighborFlags::from_fn(|dir: Direction| is_member(pos.neighbor(dir)));
        self.visible_edges = visible_edges(flags);
    }
}
