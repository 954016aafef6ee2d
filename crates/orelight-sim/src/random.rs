//! Worldgen random sources, reproducing the generator's stream bit for bit.

const SILVER_RATIO_64: u64 = 0x6A09_E667_F3BC_C909;
const GOLDEN_RATIO_64: u64 = 0x9E37_79B9_7F4A_7C15;

fn mix_stafford13(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Xoroshiro128PlusPlus {
    lo: u64,
    hi: u64,
}

impl Xoroshiro128PlusPlus {
    pub fn new(lo: u64, hi: u64) -> Self {
        if lo | hi == 0 {
            return Self {
                lo: GOLDEN_RATIO_64,
                hi: SILVER_RATIO_64,
            };
        }
        Self { lo, hi }
    }

    /// Expands a 64-bit seed into mixed 128-bit state.
    pub fn from_seed(seed: i64) -> Self {
        let lo = (seed as u64) ^ SILVER_RATIO_64;
        let hi = lo.wrapping_add(GOLDEN_RATIO_64);
        Self::new(mix_stafford13(lo), mix_stafford13(hi))
    }

    pub fn next_long(&mut self) -> u64 {
        let l = self.lo;
        let mut m = self.hi;
        let n = l.wrapping_add(m).rotate_left(17).wrapping_add(l);
        m ^= l;
        self.lo = l.rotate_left(49) ^ m ^ (m << 21);
        self.hi = m.rotate_left(28);
        n
    }
}

/// Bit-source random used for feature decoration.
///
/// All derived draws (`next_int_bounded`, `next_float`, ...) are built on
/// `next(bits)`, the top bits of one xoroshiro long.
#[derive(Clone, Debug)]
pub struct WorldgenRandom {
    source: Xoroshiro128PlusPlus,
}

impl WorldgenRandom {
    pub fn new(seed: i64) -> Self {
        Self {
            source: Xoroshiro128PlusPlus::from_seed(seed),
        }
    }

    pub fn set_seed(&mut self, seed: i64) {
        self.source = Xoroshiro128PlusPlus::from_seed(seed);
    }

    #[inline]
    pub fn next(&mut self, bits: u32) -> i32 {
        (self.source.next_long() >> (64 - bits)) as i32
    }

    pub fn next_int(&mut self) -> i32 {
        self.next(32)
    }

    /// Uniform in `[0, bound)`. Non-positive bounds yield 0.
    pub fn next_int_bounded(&mut self, bound: i32) -> i32 {
        if bound <= 0 {
            log::warn!("next_int_bounded called with bound {}", bound);
            return 0;
        }
        if bound & (bound - 1) == 0 {
            return ((bound as i64 * self.next(31) as i64) >> 31) as i32;
        }
        loop {
            let i = self.next(31);
            let j = i % bound;
            if i.wrapping_sub(j).wrapping_add(bound - 1) >= 0 {
                return j;
            }
        }
    }

    pub fn next_long(&mut self) -> i64 {
        ((self.next(32) as i64) << 32).wrapping_add(self.next(32) as i64)
    }

    pub fn next_float(&mut self) -> f32 {
        self.next(24) as f32 * 5.960_464_5e-8
    }

    pub fn next_double(&mut self) -> f64 {
        let hi = (self.next(26) as i64) << 27;
        let lo = self.next(27) as i64;
        (hi + lo) as f64 * f64::from(1.110_223e-16_f32)
    }

    /// `[min, max]`, inclusive.
    pub fn between_inclusive(&mut self, min: i32, max: i32) -> i32 {
        self.next_int_bounded(max - min + 1) + min
    }

    /// Seeds the per-chunk decoration stream and returns the population seed.
    pub fn set_decoration_seed(&mut self, level_seed: i64, block_x: i32, block_z: i32) -> i64 {
        self.set_seed(level_seed);
        let a = self.next_long() | 1;
        let b = self.next_long() | 1;
        let seed = (block_x as i64)
            .wrapping_mul(a)
            .wrapping_add((block_z as i64).wrapping_mul(b))
            ^ level_seed;
        self.set_seed(seed);
        seed
    }

    pub fn set_feature_seed(&mut self, decoration_seed: i64, index: i32, step: i32) {
        let seed = decoration_seed
            .wrapping_add(index as i64)
            .wrapping_add(10_000i64 * step as i64);
        self.set_seed(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_state_falls_back_to_constants() {
        let a = Xoroshiro128PlusPlus::new(0, 0);
        assert_eq!(a, Xoroshiro128PlusPlus::new(GOLDEN_RATIO_64, SILVER_RATIO_64));
    }

    #[test]
    fn seed_zero_stream() {
        let mut x = Xoroshiro128PlusPlus::from_seed(0);
        assert_eq!(x.next_long(), 0x2a2c_a488_f66f_517e);
        assert_eq!(x.next_long(), 0xccbc_22d7_2e97_c372);
        assert_eq!(x.next_long(), 0x404e_64b8_26f4_b9f4);
    }

    #[test]
    fn decoration_and_feature_seeds() {
        let mut r = WorldgenRandom::new(0);
        assert_eq!(r.set_decoration_seed(12345, 0, 0), 12345);
        r.set_feature_seed(12345, 9, 6);
        let ints: Vec<i32> = (0..6).map(|_| r.next_int_bounded(16)).collect();
        assert_eq!(ints, [3, 2, 1, 1, 10, 15]);

        let pop = r.set_decoration_seed(-4172144997902289642, -160, 320);
        assert_eq!(pop, -7331299067015837194);
        r.set_feature_seed(pop, 18, 6);
        let ints: Vec<i32> = (0..6).map(|_| r.next_int_bounded(3)).collect();
        assert_eq!(ints, [2, 1, 0, 2, 2, 2]);
        assert_eq!(r.next_long(), -5056331260868270141);
        assert_eq!(r.next_long(), -8808361983093998937);
    }

    #[test]
    fn power_of_two_and_general_bounds_stay_in_range() {
        let mut r = WorldgenRandom::new(99);
        for bound in [1, 2, 3, 7, 16, 100, 1 << 30, i32::MAX] {
            for _ in 0..64 {
                let v = r.next_int_bounded(bound);
                assert!((0..bound).contains(&v));
            }
        }
    }

    #[test]
    fn float_and_double_are_unit_interval() {
        let mut r = WorldgenRandom::new(-4);
        for _ in 0..256 {
            let f = r.next_float();
            let d = r.next_double();
            assert!((0.0..1.0).contains(&f));
            assert!((0.0..1.0).contains(&d));
        }
    }

    #[test]
    fn feature_seed_reproduces_stream() {
        let mut r = WorldgenRandom::new(0);
        let pop = r.set_decoration_seed(123_456_789, -32, 48);
        r.set_feature_seed(pop, 9, 6);
        let first: Vec<i32> = (0..8).map(|_| r.next_int_bounded(16)).collect();
        r.set_feature_seed(pop, 9, 6);
        let again: Vec<i32> = (0..8).map(|_| r.next_int_bounded(16)).collect();
        assert_eq!(first, again);
    }
}
