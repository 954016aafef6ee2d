use crate::{ChunkPos, Direction};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    #[inline]
    pub fn neighbor(self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.delta();
        self.offset(dx, dy, dz)
    }

    /// Chunk column containing this block (`x >> 4`, `z >> 4`).
    #[inline]
    pub fn chunk_pos(self) -> ChunkPos {
        ChunkPos::containing(self.x, self.z)
    }

    #[inline]
    pub fn key(self) -> BlockKey {
        BlockKey::from(self)
    }

    /// Largest per-axis distance; 1 means "touches, including diagonals".
    #[inline]
    pub fn chebyshev(self, other: BlockPos) -> i32 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

/// Packed block position: x in the high 26 bits, z in the next 26, y in the low 12.
///
/// Unique for positions inside the packed ranges; never unpacked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey(pub u64);

impl From<BlockPos> for BlockKey {
    #[inline]
    fn from(p: BlockPos) -> Self {
        let x = (p.x as i64 as u64) & 0x3FF_FFFF;
        let z = (p.z as i64 as u64) & 0x3FF_FFFF;
        let y = (p.y as i64 as u64) & 0xFFF;
        BlockKey((x << 38) | (z << 12) | y)
    }
}
