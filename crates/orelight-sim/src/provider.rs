use serde::Deserialize;

use crate::random::WorldgenRandom;

/// Vertical bounds the height providers resolve anchors against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeightContext {
    pub min_y: i32,
    pub gen_depth: i32,
}

impl HeightContext {
    pub const OVERWORLD: HeightContext = HeightContext {
        min_y: -64,
        gen_depth: 384,
    };
    pub const NETHER: HeightContext = HeightContext {
        min_y: 0,
        gen_depth: 128,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAnchor {
    Absolute(i32),
    AboveBottom(i32),
    BelowTop(i32),
    Bottom,
    Top,
}

impl VerticalAnchor {
    pub fn resolve(self, ctx: HeightContext) -> i32 {
        match self {
            VerticalAnchor::Absolute(y) => y,
            VerticalAnchor::AboveBottom(off) => ctx.min_y + off,
            VerticalAnchor::BelowTop(off) => ctx.gen_depth - 1 + ctx.min_y - off,
            VerticalAnchor::Bottom => ctx.min_y,
            VerticalAnchor::Top => ctx.gen_depth - 1 + ctx.min_y,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntProvider {
    Constant(i32),
    Uniform([i32; 2]),
    BiasedToBottom([i32; 2]),
}

impl IntProvider {
    pub fn sample(self, rng: &mut WorldgenRandom) -> i32 {
        match self {
            IntProvider::Constant(v) => v,
            IntProvider::Uniform([min, max]) => rng.between_inclusive(min, max),
            IntProvider::BiasedToBottom([min, max]) => {
                let spread = rng.next_int_bounded(max - min + 1);
                min + rng.next_int_bounded(spread + 1)
            }
        }
    }

    pub fn is_valid(self) -> bool {
        match self {
            IntProvider::Constant(v) => v >= 0,
            IntProvider::Uniform([min, max]) | IntProvider::BiasedToBottom([min, max]) => {
                min >= 0 && min <= max
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeightProvider {
    Uniform {
        min: VerticalAnchor,
        max: VerticalAnchor,
    },
    Trapezoid {
        min: VerticalAnchor,
        max: VerticalAnchor,
        #[serde(default)]
        plateau: i32,
    },
}

impl HeightProvider {
    pub fn sample(self, rng: &mut WorldgenRandom, ctx: HeightContext) -> i32 {
        match self {
            HeightProvider::Uniform { min, max } => {
                let lo = min.resolve(ctx);
                let hi = max.resolve(ctx);
                if lo > hi {
                    log::warn!("empty uniform height range {}..={}", lo, hi);
                    return lo;
                }
                rng.between_inclusive(lo, hi)
            }
            HeightProvider::Trapezoid { min, max, plateau } => {
                let lo = min.resolve(ctx);
                let hi = max.resolve(ctx);
                if lo > hi {
                    log::warn!("empty trapezoid height range {}..={}", lo, hi);
                    return lo;
                }
                let span = hi - lo;
                if plateau >= span {
                    return rng.between_inclusive(lo, hi);
                }
                let slope = (span - plateau) / 2;
                let top = span - slope;
                lo + rng.between_inclusive(0, top) + rng.between_inclusive(0, slope)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_resolve_against_overworld() {
        let ctx = HeightContext::OVERWORLD;
        assert_eq!(VerticalAnchor::Bottom.resolve(ctx), -64);
        assert_eq!(VerticalAnchor::Top.resolve(ctx), 319);
        assert_eq!(VerticalAnchor::AboveBottom(-80).resolve(ctx), -144);
        assert_eq!(VerticalAnchor::BelowTop(10).resolve(ctx), 309);
        assert_eq!(VerticalAnchor::Absolute(7).resolve(ctx), 7);
    }

    #[test]
    fn trapezoid_stays_in_bounds() {
        let mut rng = WorldgenRandom::new(5);
        let h = HeightProvider::Trapezoid {
            min: VerticalAnchor::Absolute(-16),
            max: VerticalAnchor::Absolute(112),
            plateau: 0,
        };
        for _ in 0..500 {
            let y = h.sample(&mut rng, HeightContext::OVERWORLD);
            assert!((-16..=112).contains(&y));
        }
    }

    #[test]
    fn inverted_range_returns_min_without_drawing() {
        let mut a = WorldgenRandom::new(1);
        let mut b = WorldgenRandom::new(1);
        let h = HeightProvider::Uniform {
            min: VerticalAnchor::Absolute(10),
            max: VerticalAnchor::Absolute(0),
        };
        assert_eq!(h.sample(&mut a, HeightContext::OVERWORLD), 10);
        assert_eq!(a.next_int(), b.next_int());
    }

    #[test]
    fn biased_to_bottom_leans_low() {
        let mut rng = WorldgenRandom::new(77);
        let p = IntProvider::BiasedToBottom([0, 9]);
        let samples: Vec<i32> = (0..2000).map(|_| p.sample(&mut rng)).collect();
        assert!(samples.iter().all(|v| (0..=9).contains(v)));
        let low = samples.iter().filter(|v| **v < 5).count();
        assert!(low > 1200);
    }

    #[derive(Deserialize)]
    struct Holder {
        count: IntProvider,
        height: HeightProvider,
    }

    #[test]
    fn parses_from_toml() {
        let src = r#"
count = { uniform = [0, 1] }
height = { kind = "trapezoid", min = { above_bottom = -80 }, max = "top" }
"#;
        let h: Holder = toml::from_str(src).unwrap();
        assert_eq!(h.count, IntProvider::Uniform([0, 1]));
        assert_eq!(
            h.height,
            HeightProvider::Trapezoid {
                min: VerticalAnchor::AboveBottom(-80),
                max: VerticalAnchor::Top,
                plateau: 0
            }
        );
    }
}
