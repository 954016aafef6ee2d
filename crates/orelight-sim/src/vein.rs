use std::f32::consts::PI;

use hashbrown::HashSet;
use orelight_geom::{BlockPos, ChunkPos, Direction};
use orelight_highlight::{ChunkRecord, Color, SpatialBlock};
use orelight_world::{BiomeId, BiomeSource, WorldView};

use crate::ore::{Dimension, OreDescriptor, OreTable};
use crate::provider::HeightContext;
use crate::random::WorldgenRandom;
use crate::scratch::{ScratchPool, VeinScratch};

/// Predicts feature placements for a chunk without reading its generated blocks.
///
/// Implementations track one version of the generator; callers only see records.
pub trait FeatureOracle: Send + Sync {
    fn simulate(
        &self,
        chunk: ChunkPos,
        world: &dyn WorldView,
        biomes: &dyn BiomeSource,
    ) -> ChunkRecord;
}

struct ResolvedOre {
    desc: OreDescriptor,
    // None: every biome
    biomes: Option<HashSet<BiomeId>>,
}

impl ResolvedOre {
    fn allows(&self, biome: BiomeId) -> bool {
        self.biomes.as_ref().is_none_or(|b| b.contains(&biome))
    }

    fn allows_any(&self, near: &HashSet<BiomeId>) -> bool {
        match &self.biomes {
            None => true,
            Some(b) => near.iter().any(|id| b.contains(id)),
        }
    }
}

/// Ore vein simulator for one world seed and dimension.
pub struct VeinSimulator {
    seed: i64,
    dimension: Dimension,
    ores: Vec<ResolvedOre>,
    scratch: ScratchPool,
}

impl VeinSimulator {
    /// Biome names are resolved against `biomes`; unknown names are dropped with a
    /// warning and an ore left with no known biome is skipped.
    pub fn new(
        seed: i64,
        table: &OreTable,
        dimension: Dimension,
        biomes: &dyn BiomeSource,
        workers: usize,
    ) -> Self {
        let mut ores = Vec::new();
        for desc in table.for_dimension(dimension) {
            let resolved = if desc.biomes.is_empty() {
                None
            } else {
                let mut ids = HashSet::new();
                for name in &desc.biomes {
                    match biomes.biome_id(name) {
                        Some(id) => {
                            ids.insert(id);
                        }
                        None => log::debug!("ore {}: unknown biome '{}'", desc.name, name),
                    }
                }
                if ids.is_empty() {
                    log::warn!(
                        "ore {} skipped: none of its biomes exist in this world",
                        desc.name
                    );
                    continue;
                }
                Some(ids)
            };
            ores.push(ResolvedOre {
                desc: desc.clone(),
                biomes: resolved,
            });
        }
        log::info!(
            "vein simulator ready: seed {} {:?}, {} ores",
            seed,
            dimension,
            ores.len()
        );
        Self {
            seed,
            dimension,
            ores,
            scratch: ScratchPool::new(workers.max(1) * 2),
        }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn ores(&self) -> impl Iterator<Item = &OreDescriptor> {
        self.ores.iter().map(|o| &o.desc)
    }

    /// Anchor context: the dimension's generator bounds clipped to the world.
    fn height_context(&self, world: &dyn WorldView) -> HeightContext {
        let dim = self.dimension.height_context();
        let world_depth = world.max_y() - world.min_y() + 1;
        HeightContext {
            min_y: dim.min_y.max(world.min_y()),
            gen_depth: dim.gen_depth.min(world_depth),
        }
    }

    /// Every placement produced by decorating `chunk`; may spill into neighbours.
    pub fn decorate(
        &self,
        chunk: ChunkPos,
        world: &dyn WorldView,
        biomes: &dyn BiomeSource,
    ) -> Vec<(BlockPos, Color)> {
        let ctx = self.height_context(world);
        let near = biomes.biomes_near(chunk, 1);
        let bx = chunk.min_block_x();
        let bz = chunk.min_block_z();
        let mut rng = WorldgenRandom::new(0);
        let population = rng.set_decoration_seed(self.seed, bx, bz);
        let mut scratch = self.scratch.acquire();
        let mut out = Vec::new();
        let mut placed = Vec::new();
        for ore in self.ores.iter().filter(|o| o.allows_any(&near)) {
            let desc = &ore.desc;
            // each ore reseeds, so skipping a disabled one leaves the others untouched
            if !desc.enabled {
                continue;
            }
            rng.set_feature_seed(population, desc.index, desc.step);
            let repeats = desc.count.sample(&mut rng);
            for _ in 0..repeats {
                if desc.rarity < 1.0 && rng.next_float() >= desc.rarity {
                    continue;
                }
                let x = rng.next_int_bounded(16) + bx;
                let z = rng.next_int_bounded(16) + bz;
                let y = desc.height.sample(&mut rng, ctx);
                if !ore.allows(biomes.biome_at(x, y, z)) {
                    continue;
                }
                let origin = BlockPos::new(x, y, z);
                placed.clear();
                if desc.scattered {
                    place_scattered(&mut rng, world, origin, desc, &mut placed);
                } else {
                    place_vein(&mut rng, world, origin, desc, &mut scratch, &mut placed);
                }
                out.extend(placed.iter().map(|p| (*p, desc.color)));
            }
        }
        out
    }
}

impl FeatureOracle for VeinSimulator {
    /// Placements landing in `chunk`, gathered from the decoration of the chunk
    /// and its eight neighbours (veins cross chunk borders).
    fn simulate(
        &self,
        chunk: ChunkPos,
        world: &dyn WorldView,
        biomes: &dyn BiomeSource,
    ) -> ChunkRecord {
        let mut record = ChunkRecord::new(chunk);
        for source in chunk.range_closed(1) {
            for (pos, color) in self.decorate(source, world, biomes) {
                if pos.chunk_pos() == chunk {
                    record.add_block(SpatialBlock::new(pos, color));
                }
            }
        }
        log::trace!("simulated chunk {:?}: {} ore blocks", chunk, record.len());
        record
    }
}

fn ceil_f32(v: f32) -> i32 {
    let i = v as i32;
    if v > i as f32 { i + 1 } else { i }
}

/// Table-backed sine at 65536 steps per turn, matching the generator's lookup.
fn table_sin(v: f64) -> f32 {
    let idx = ((v * 10_430.378_350_470_453) as i64 & 0xFFFF) as f64;
    (idx * std::f64::consts::PI * 2.0 / 65_536.0).sin() as f32
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn exposed(world: &dyn WorldView, pos: BlockPos) -> bool {
    Direction::ALL
        .iter()
        .any(|d| !world.is_opaque(pos.neighbor(*d)))
}

/// Air-exposure gate applied to every candidate voxel.
fn should_place(rng: &mut WorldgenRandom, world: &dyn WorldView, pos: BlockPos, chance: f32) -> bool {
    if chance <= 0.0 {
        return true;
    }
    if chance < 1.0 && rng.next_float() >= chance {
        return true;
    }
    !exposed(world, pos)
}

fn spread_offset(rng: &mut WorldgenRandom, spread: i32) -> i32 {
    let v = (rng.next_float() - rng.next_float()) * spread as f32;
    (v as f64 + 0.5).floor() as i32
}

fn place_scattered(
    rng: &mut WorldgenRandom,
    world: &dyn WorldView,
    origin: BlockPos,
    desc: &OreDescriptor,
    out: &mut Vec<BlockPos>,
) {
    let count = rng.next_int_bounded(desc.size + 1);
    for j in 0..count {
        let spread = j.min(7);
        let dx = spread_offset(rng, spread);
        let dy = spread_offset(rng, spread);
        let dz = spread_offset(rng, spread);
        let pos = origin.offset(dx, dy, dz);
        if world.is_opaque(pos) && should_place(rng, world, pos, desc.discard_on_air) {
            out.push(pos);
        }
    }
}

struct VeinBox {
    min_x: i32,
    min_y: i32,
    min_z: i32,
    horizontal: i32,
    vertical: i32,
}

fn place_vein(
    rng: &mut WorldgenRandom,
    world: &dyn WorldView,
    origin: BlockPos,
    desc: &OreDescriptor,
    scratch: &mut VeinScratch,
    out: &mut Vec<BlockPos>,
) {
    let size = desc.size;
    let angle = rng.next_float() * PI;
    let half_len = size as f32 / 8.0;
    let pad = ceil_f32((size as f32 / 16.0 * 2.0 + 1.0) / 2.0);
    let (sin, cos) = ((angle as f64).sin(), (angle as f64).cos());
    let reach = half_len as f64;
    let start_x = origin.x as f64 + sin * reach;
    let end_x = origin.x as f64 - sin * reach;
    let start_z = origin.z as f64 + cos * reach;
    let end_z = origin.z as f64 - cos * reach;
    let start_y = (origin.y + rng.next_int_bounded(3) - 2) as f64;
    let end_y = (origin.y + rng.next_int_bounded(3) - 2) as f64;

    let c = ceil_f32(half_len);
    let bounds = VeinBox {
        min_x: origin.x - c - pad,
        min_y: origin.y - 2 - pad,
        min_z: origin.z - c - pad,
        horizontal: 2 * (c + pad),
        vertical: 2 * (2 + pad),
    };

    // the vein is only generated when some column of its box reaches down to it
    let reaches_surface = (bounds.min_x..=bounds.min_x + bounds.horizontal).any(|s| {
        (bounds.min_z..=bounds.min_z + bounds.horizontal).any(|t| {
            world
                .surface_height(s, t)
                .is_some_and(|top| bounds.min_y <= top + 1)
        })
    });
    if !reaches_surface {
        return;
    }

    scratch.waypoints.clear();
    for n in 0..size {
        let t = n as f32 / size as f32;
        let px = lerp(t as f64, start_x, end_x);
        let py = lerp(t as f64, start_y, end_y);
        let pz = lerp(t as f64, start_z, end_z);
        let s = rng.next_double() * size as f64 / 16.0;
        let radius = ((table_sin((PI * t) as f64) + 1.0) as f64 * s + 1.0) / 2.0;
        scratch.waypoints.push([px, py, pz, radius]);
    }

    cull_overlapping(&mut scratch.waypoints);
    voxelize(rng, world, desc, &bounds, scratch, out);
}

/// Drops waypoints whose ball is swallowed by another one.
fn cull_overlapping(ds: &mut [[f64; 4]]) {
    let n = ds.len();
    for a in 0..n.saturating_sub(1) {
        if ds[a][3] <= 0.0 {
            continue;
        }
        for b in a + 1..n {
            if ds[b][3] <= 0.0 {
                continue;
            }
            let dx = ds[a][0] - ds[b][0];
            let dy = ds[a][1] - ds[b][1];
            let dz = ds[a][2] - ds[b][2];
            let dr = ds[a][3] - ds[b][3];
            if dr * dr > dx * dx + dy * dy + dz * dz {
                if dr > 0.0 {
                    ds[b][3] = -1.0;
                } else {
                    ds[a][3] = -1.0;
                }
            }
        }
    }
}

fn voxelize(
    rng: &mut WorldgenRandom,
    world: &dyn WorldView,
    desc: &OreDescriptor,
    b: &VeinBox,
    scratch: &mut VeinScratch,
    out: &mut Vec<BlockPos>,
) {
    scratch.visited.clear();
    scratch
        .visited
        .resize((b.horizontal * b.vertical * b.horizontal).max(0) as usize, false);

    for i in 0..scratch.waypoints.len() {
        let [cx, cy, cz, r] = scratch.waypoints[i];
        if r < 0.0 {
            continue;
        }
        let x0 = ((cx - r).floor() as i32).max(b.min_x);
        let y0 = ((cy - r).floor() as i32).max(b.min_y);
        let z0 = ((cz - r).floor() as i32).max(b.min_z);
        let x1 = ((cx + r).floor() as i32).max(x0);
        let y1 = ((cy + r).floor() as i32).max(y0);
        let z1 = ((cz + r).floor() as i32).max(z0);
        for x in x0..=x1 {
            let fx = (x as f64 + 0.5 - cx) / r;
            if fx * fx >= 1.0 {
                continue;
            }
            for y in y0..=y1 {
                let fy = (y as f64 + 0.5 - cy) / r;
                if fx * fx + fy * fy >= 1.0 {
                    continue;
                }
                for z in z0..=z1 {
                    let fz = (z as f64 + 0.5 - cz) / r;
                    if fx * fx + fy * fy + fz * fz >= 1.0 {
                        continue;
                    }
                    let index = (x - b.min_x)
                        + (y - b.min_y) * b.horizontal
                        + (z - b.min_z) * b.horizontal * b.vertical;
                    if scratch.visit(index as usize) {
                        continue;
                    }
                    let pos = BlockPos::new(x, y, z);
                    if world.in_build_height(y)
                        && world.is_opaque(pos)
                        && should_place(rng, world, pos, desc.discard_on_air)
                    {
                        out.push(pos);
                    }
                }
            }
        }
    }
}
