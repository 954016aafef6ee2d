//! Small noise terrain used by the CLI driver and integration tests.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use orelight_geom::{BlockPos, CHUNK_WIDTH, ChunkPos};
use serde::Deserialize;

use crate::block::{Block, BlockTable};
use crate::chunk::ChunkData;

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainParams {
    #[serde(default = "default_base_height")]
    pub base_height: i32,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_height_frequency")]
    pub height_frequency: f32,
    #[serde(default = "default_cave_threshold")]
    pub cave_threshold: f32,
    #[serde(default = "default_cave_frequency")]
    pub cave_frequency: f32,
    /// Fraction of stone turned into a random ore block, for block-list demos.
    #[serde(default = "default_ore_density")]
    pub ore_density: f32,
}

fn default_base_height() -> i32 {
    64
}
fn default_amplitude() -> f32 {
    12.0
}
fn default_height_frequency() -> f32 {
    0.01
}
fn default_cave_threshold() -> f32 {
    0.72
}
fn default_cave_frequency() -> f32 {
    0.035
}
fn default_ore_density() -> f32 {
    0.004
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            base_height: default_base_height(),
            amplitude: default_amplitude(),
            height_frequency: default_height_frequency(),
            cave_threshold: default_cave_threshold(),
            cave_frequency: default_cave_frequency(),
            ore_density: default_ore_density(),
        }
    }
}

struct Palette {
    bedrock: Block,
    deepslate: Block,
    stone: Block,
    dirt: Block,
    grass: Block,
    ores: Vec<Block>,
}

impl Palette {
    fn resolve(table: &BlockTable) -> Self {
        let pick = |name: &str, fallback: Block| table.block(name).unwrap_or(fallback);
        let stone = pick("stone", Block::new(1));
        let ores = [
            "coal_ore",
            "iron_ore",
            "copper_ore",
            "gold_ore",
            "redstone_ore",
            "diamond_ore",
        ]
        .iter()
        .filter_map(|n| table.block(n))
        .collect();
        Self {
            bedrock: pick("bedrock", stone),
            deepslate: pick("deepslate", stone),
            stone,
            dirt: pick("dirt", stone),
            grass: pick("grass_block", stone),
            ores,
        }
    }
}

pub struct TerrainGen {
    params: TerrainParams,
    height: FastNoiseLite,
    caves: FastNoiseLite,
    speckle: FastNoiseLite,
    palette: Palette,
}

impl TerrainGen {
    pub fn new(seed: i32, params: TerrainParams, table: &BlockTable) -> Self {
        let mut height = FastNoiseLite::with_seed(seed);
        height.set_noise_type(Some(NoiseType::OpenSimplex2));
        height.set_frequency(Some(params.height_frequency));
        let mut caves = FastNoiseLite::with_seed(seed ^ 41_337);
        caves.set_noise_type(Some(NoiseType::OpenSimplex2));
        caves.set_frequency(Some(params.cave_frequency));
        let mut speckle = FastNoiseLite::with_seed(seed ^ 99_173);
        speckle.set_noise_type(Some(NoiseType::Value));
        speckle.set_frequency(Some(0.9));
        Self {
            params,
            height,
            caves,
            speckle,
            palette: Palette::resolve(table),
        }
    }

    fn surface_at(&self, wx: i32, wz: i32) -> i32 {
        let h = self.height.get_noise_2d(wx as f32, wz as f32);
        self.params.base_height + (h * self.params.amplitude).round() as i32
    }

    fn block_for(&self, pos: BlockPos, min_y: i32, surface: i32) -> Block {
        if pos.y == min_y {
            return self.palette.bedrock;
        }
        if pos.y > surface {
            return Block::AIR;
        }
        let (fx, fy, fz) = (pos.x as f32, pos.y as f32, pos.z as f32);
        if pos.y < surface - 4 && self.caves.get_noise_3d(fx, fy * 1.6, fz) > self.params.cave_threshold {
            return Block::AIR;
        }
        if pos.y == surface {
            return self.palette.grass;
        }
        if pos.y > surface - 4 {
            return self.palette.dirt;
        }
        if !self.palette.ores.is_empty() {
            let s = self.speckle.get_noise_3d(fx, fy, fz) * 0.5 + 0.5;
            if s < self.params.ore_density {
                let i = (pos.x ^ pos.y ^ pos.z).unsigned_abs() as usize % self.palette.ores.len();
                return self.palette.ores[i];
            }
        }
        if pos.y < 0 {
            self.palette.deepslate
        } else {
            self.palette.stone
        }
    }

    pub fn generate(&self, pos: ChunkPos, min_y: i32, height: usize) -> ChunkData {
        let mut chunk = ChunkData::new(pos, min_y, height);
        let max_y = min_y + height as i32 - 1;
        for lz in 0..CHUNK_WIDTH {
            for lx in 0..CHUNK_WIDTH {
                let wx = pos.min_block_x() + lx;
                let wz = pos.min_block_z() + lz;
                let surface = self.surface_at(wx, wz).clamp(min_y, max_y);
                for wy in min_y..=surface {
                    let p = BlockPos::new(wx, wy, wz);
                    let b = self.block_for(p, min_y, surface);
                    if !b.is_air() {
                        chunk.set_world(p, b);
                    }
                }
            }
        }
        chunk
    }
}
