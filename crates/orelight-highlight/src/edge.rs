//! Wireframe edge numbering and the neighbour-driven visibility reduction.
//!
//! Edges of the unit cube, numbered 1..=12:
//! lower ring 1..=4 around y = 0, vertical corners 5..=8, upper ring 9..=12
//! mirroring the lower ring at y = 1.

use std::ops::{BitAnd, BitOr, Not};

use orelight_geom::{Direction, Vec3};

/// Bit `n - 1` is set when edge `n` is drawn.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EdgeMask(u16);

impl EdgeMask {
    pub const NONE: EdgeMask = EdgeMask(0);
    pub const ALL: EdgeMask = EdgeMask(0x0FFF);

    #[inline]
    pub const fn edge(n: u8) -> Self {
        EdgeMask(1 << (n - 1))
    }

    pub const fn of(edges: &[u8]) -> Self {
        let mut bits = 0u16;
        let mut i = 0;
        while i < edges.len() {
            bits |= 1 << (edges[i] - 1);
            i += 1;
        }
        EdgeMask(bits)
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        EdgeMask(bits & Self::ALL.0)
    }

    #[inline]
    pub const fn contains(self, n: u8) -> bool {
        n >= 1 && n <= 12 && self.0 & (1 << (n - 1)) != 0
    }

    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Edge numbers present in the mask, ascending.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (1u8..=12).filter(move |&n| self.contains(n))
    }
}

impl BitAnd for EdgeMask {
    type Output = EdgeMask;
    fn bitand(self, rhs: EdgeMask) -> EdgeMask {
        EdgeMask(self.0 & rhs.0)
    }
}

impl BitOr for EdgeMask {
    type Output = EdgeMask;
    fn bitor(self, rhs: EdgeMask) -> EdgeMask {
        EdgeMask(self.0 | rhs.0)
    }
}

impl Not for EdgeMask {
    type Output = EdgeMask;
    fn not(self) -> EdgeMask {
        EdgeMask(!self.0 & EdgeMask::ALL.0)
    }
}

/// Edges lying on the face shared with the neighbour in each direction.
pub const FACE_EDGES: [(Direction, EdgeMask); 6] = [
    (Direction::East, EdgeMask::of(&[3, 7, 8, 11])),
    (Direction::West, EdgeMask::of(&[1, 5, 6, 9])),
    (Direction::North, EdgeMask::of(&[4, 5, 8, 12])),
    (Direction::South, EdgeMask::of(&[2, 6, 7, 10])),
    (Direction::Up, EdgeMask::of(&[9, 10, 11, 12])),
    (Direction::Down, EdgeMask::of(&[1, 2, 3, 4])),
];

/// Endpoints of each edge on the unit cube, indexed by `n - 1`.
pub const EDGE_ENDPOINTS: [(Vec3, Vec3); 12] = [
    (Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
    (Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0)),
    (Vec3::new(1.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0)),
    (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0)),
    (Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
    (Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 1.0)),
    (Vec3::new(1.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 1.0)),
    (Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0)),
    (Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 1.0)),
    (Vec3::new(0.0, 1.0, 1.0), Vec3::new(1.0, 1.0, 1.0)),
    (Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 1.0, 0.0)),
    (Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
];

/// Which of the six face neighbours are also highlighted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeighborFlags([bool; 6]);

impl NeighborFlags {
    #[inline]
    pub const fn empty() -> Self {
        Self([false; 6])
    }

    pub fn from_fn(mut present: impl FnMut(Direction) -> bool) -> Self {
        let mut flags = [false; 6];
        for dir in Direction::ALL {
            flags[dir.index()] = present(dir);
        }
        Self(flags)
    }

    /// Low six bits, in `Direction::index` order.
    pub fn from_bits(bits: u8) -> Self {
        Self::from_fn(|d| bits & (1 << d.index()) != 0)
    }

    #[inline]
    pub fn with(mut self, dir: Direction, present: bool) -> Self {
        self.0[dir.index()] = present;
        self
    }

    #[inline]
    pub fn get(self, dir: Direction) -> bool {
        self.0[dir.index()]
    }
}

pub fn visible_edges(flags: NeighborFlags) -> EdgeMask {
    FACE_EDGES
        .iter()
        .filter(|(dir, _)| flags.get(*dir))
        .fold(EdgeMask::ALL, |mask, (_, face)| mask & !*face)
}
