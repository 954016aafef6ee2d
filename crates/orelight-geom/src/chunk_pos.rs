pub const CHUNK_SHIFT: i32 = 4;
pub const CHUNK_WIDTH: i32 = 1 << CHUNK_SHIFT;

/// A 16x16 full-height column of the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkPos {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    #[inline]
    pub const fn containing(wx: i32, wz: i32) -> Self {
        Self {
            cx: wx >> CHUNK_SHIFT,
            cz: wz >> CHUNK_SHIFT,
        }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cz: self.cz + dz,
        }
    }

    #[inline]
    pub const fn min_block_x(self) -> i32 {
        self.cx << CHUNK_SHIFT
    }

    #[inline]
    pub const fn min_block_z(self) -> i32 {
        self.cz << CHUNK_SHIFT
    }

    #[inline]
    pub fn key(self) -> ChunkKey {
        ChunkKey::from(self)
    }

    #[inline]
    pub fn chebyshev(self, other: ChunkPos) -> i32 {
        (self.cx - other.cx).abs().max((self.cz - other.cz).abs())
    }

    /// This chunk and every chunk within `radius` columns of it, row by row.
    pub fn range_closed(self, radius: i32) -> impl Iterator<Item = ChunkPos> {
        let r = radius.max(0);
        (-r..=r).flat_map(move |dz| (-r..=r).map(move |dx| self.offset(dx, dz)))
    }
}

impl From<(i32, i32)> for ChunkPos {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// Packed chunk position: low 32 bits = cx, high 32 bits = cz.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey(pub u64);

impl ChunkKey {
    #[inline]
    pub fn pos(self) -> ChunkPos {
        ChunkPos::new(self.0 as u32 as i32, (self.0 >> 32) as u32 as i32)
    }
}

impl From<ChunkPos> for ChunkKey {
    #[inline]
    fn from(p: ChunkPos) -> Self {
        ChunkKey((p.cx as u32 as u64) | ((p.cz as u32 as u64) << 32))
    }
}
