use std::error::Error;
use std::fs;
use std::path::Path;

use fastnoise_lite::{FastNoiseLite, NoiseType};
use hashbrown::HashSet;
use orelight_geom::ChunkPos;
use serde::Deserialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BiomeId(pub u16);

/// Biome lookup at noise resolution (every 4 blocks, as the generator samples).
pub trait BiomeSource: Send + Sync {
    fn biome_at(&self, x: i32, y: i32, z: i32) -> BiomeId;

    fn biome_id(&self, name: &str) -> Option<BiomeId>;

    fn biome_name(&self, id: BiomeId) -> Option<&str>;

    /// Every biome sampled in the chunks within `radius` of `center`.
    fn biomes_near(&self, center: ChunkPos, radius: i32) -> HashSet<BiomeId> {
        let mut out = HashSet::new();
        for c in center.range_closed(radius) {
            for qz in 0..4 {
                for qx in 0..4 {
                    let x = c.min_block_x() + qx * 4 + 2;
                    let z = c.min_block_z() + qz * 4 + 2;
                    out.insert(self.biome_at(x, 0, z));
                }
            }
        }
        out
    }
}

/// Single biome everywhere.
#[derive(Clone, Debug)]
pub struct FixedBiome {
    name: String,
}

impl FixedBiome {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl BiomeSource for FixedBiome {
    fn biome_at(&self, _x: i32, _y: i32, _z: i32) -> BiomeId {
        BiomeId(0)
    }

    fn biome_id(&self, name: &str) -> Option<BiomeId> {
        (name == self.name).then_some(BiomeId(0))
    }

    fn biome_name(&self, id: BiomeId) -> Option<&str> {
        (id == BiomeId(0)).then_some(self.name.as_str())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Climate2D {
    #[serde(default = "default_climate_freq")]
    pub frequency: f32,
}

fn default_climate_freq() -> f32 {
    0.004
}

impl Default for Climate2D {
    fn default() -> Self {
        Self {
            frequency: default_climate_freq(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BiomeDef {
    pub name: String,
    #[serde(default)]
    pub temp_min: Option<f32>,
    #[serde(default)]
    pub temp_max: Option<f32>,
    #[serde(default)]
    pub moisture_min: Option<f32>,
    #[serde(default)]
    pub moisture_max: Option<f32>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BiomesConfig {
    #[serde(default)]
    pub temp: Climate2D,
    #[serde(default)]
    pub moisture: Climate2D,
    #[serde(default)]
    pub biomes: Vec<BiomeDef>,
}

#[derive(Clone, Debug)]
struct ClimateRange {
    name: String,
    temp_min: f32,
    temp_max: f32,
    moisture_min: f32,
    moisture_max: f32,
}

/// Temperature/moisture noise picks the first biome whose ranges contain the sample.
pub struct ClimateBiomes {
    temp: FastNoiseLite,
    moist: FastNoiseLite,
    defs: Vec<ClimateRange>,
}

impl ClimateBiomes {
    pub fn from_config(seed: i32, cfg: &BiomesConfig) -> Result<Self, Box<dyn Error>> {
        if cfg.biomes.is_empty() {
            return Err("biome config has no biomes".into());
        }
        let mut t = FastNoiseLite::with_seed(seed ^ 0x1203_5F31);
        t.set_noise_type(Some(NoiseType::OpenSimplex2));
        t.set_frequency(Some(cfg.temp.frequency));
        let mut m = FastNoiseLite::with_seed(((seed as u32) ^ 0x92E3_A1B2u32) as i32);
        m.set_noise_type(Some(NoiseType::OpenSimplex2));
        m.set_frequency(Some(cfg.moisture.frequency));
        let defs = cfg
            .biomes
            .iter()
            .map(|d| ClimateRange {
                name: d.name.clone(),
                temp_min: d.temp_min.unwrap_or(0.0),
                temp_max: d.temp_max.unwrap_or(1.01),
                moisture_min: d.moisture_min.unwrap_or(0.0),
                moisture_max: d.moisture_max.unwrap_or(1.01),
            })
            .collect();
        Ok(Self {
            temp: t,
            moist: m,
            defs,
        })
    }

    pub fn from_toml_str(seed: i32, src: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BiomesConfig = toml::from_str(src)?;
        Self::from_config(seed, &cfg)
    }

    pub fn from_path(seed: i32, path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(seed, &s)
    }

    /// Overworld climate table shipped with the crate.
    pub fn overworld(seed: i32) -> Result<Self, Box<dyn Error>> {
        Self::from_toml_str(seed, include_str!("../data/biomes.toml"))
    }

    fn climate(&self, x: i32, z: i32) -> (f32, f32) {
        let (x, z) = (x as f32, z as f32);
        let temp = (self.temp.get_noise_2d(x, z) * 0.5 + 0.5).clamp(0.0, 1.0);
        let moist = (self.moist.get_noise_2d(x, z) * 0.5 + 0.5).clamp(0.0, 1.0);
        (temp, moist)
    }
}

impl BiomeSource for ClimateBiomes {
    fn biome_at(&self, x: i32, _y: i32, z: i32) -> BiomeId {
        // snap to the 4x4 noise grid
        let (temp, moist) = self.climate(x & !3, z & !3);
        let idx = self
            .defs
            .iter()
            .position(|d| {
                temp >= d.temp_min
                    && temp < d.temp_max
                    && moist >= d.moisture_min
                    && moist < d.moisture_max
            })
            .unwrap_or(0);
        BiomeId(idx as u16)
    }

    fn biome_id(&self, name: &str) -> Option<BiomeId> {
        self.defs
            .iter()
            .position(|d| d.name == name)
            .map(|i| BiomeId(i as u16))
    }

    fn biome_name(&self, id: BiomeId) -> Option<&str> {
        self.defs.get(id.0 as usize).map(|d| d.name.as_str())
    }
}
