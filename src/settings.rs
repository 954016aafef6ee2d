use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use orelight_highlight::Color;
use orelight_sim::Dimension;

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    #[serde(default = "default_view_distance")]
    pub view_distance: i32,
    /// Eviction sweeps run once every this many world-render ticks.
    #[serde(default = "default_eviction_interval")]
    pub eviction_interval_ticks: u64,
    #[serde(default)]
    pub block_esp: BlockEspSettings,
    #[serde(default)]
    pub cave_esp: CaveEspSettings,
    #[serde(default)]
    pub ore_esp: OreEspSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            view_distance: default_view_distance(),
            eviction_interval_ticks: default_eviction_interval(),
            block_esp: BlockEspSettings::default(),
            cave_esp: CaveEspSettings::default(),
            ore_esp: OreEspSettings::default(),
        }
    }
}

fn default_view_distance() -> i32 {
    8
}
fn default_eviction_interval() -> u64 {
    20
}
fn default_alpha() -> f32 {
    0.5
}
fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockEspSettings {
    #[serde(default = "default_block_list")]
    pub blocks: Vec<String>,
    #[serde(default = "default_block_color")]
    pub color: Color,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default = "default_true")]
    pub structure_mode: bool,
    #[serde(default)]
    pub tracers: bool,
}

fn default_block_list() -> Vec<String> {
    vec!["diamond_ore".to_string(), "deepslate_diamond_ore".to_string()]
}
fn default_block_color() -> Color {
    Color::rgb(85, 255, 255)
}

impl Default for BlockEspSettings {
    fn default() -> Self {
        Self {
            blocks: default_block_list(),
            color: default_block_color(),
            alpha: default_alpha(),
            structure_mode: true,
            tracers: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaveMode {
    /// Walkable air under a roof.
    Caves,
    /// Two-high air gaps under a ceiling.
    Tunnel,
}

fn default_cave_mode() -> CaveMode {
    CaveMode::Caves
}
fn default_cave_color() -> Color {
    Color::rgb(255, 170, 0)
}

#[derive(Clone, Debug, Deserialize)]
pub struct CaveEspSettings {
    #[serde(default = "default_cave_mode")]
    pub mode: CaveMode,
    #[serde(default = "default_cave_color")]
    pub color: Color,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default = "default_true")]
    pub structure_mode: bool,
}

impl Default for CaveEspSettings {
    fn default() -> Self {
        Self {
            mode: default_cave_mode(),
            color: default_cave_color(),
            alpha: default_alpha(),
            structure_mode: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct OreOverride {
    pub group: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub color: Option<Color>,
}

fn default_dimension() -> Dimension {
    Dimension::Overworld
}

#[derive(Clone, Debug, Deserialize)]
pub struct OreEspSettings {
    /// Kept as text; it must parse as a 64-bit integer before the overlay starts.
    #[serde(default)]
    pub seed: String,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default = "default_dimension")]
    pub dimension: Dimension,
    /// Replaces the embedded ore table when set.
    #[serde(default)]
    pub ore_table: Option<PathBuf>,
    #[serde(default)]
    pub ores: Vec<OreOverride>,
}

impl Default for OreEspSettings {
    fn default() -> Self {
        Self {
            seed: String::new(),
            alpha: default_alpha(),
            dimension: default_dimension(),
            ore_table: None,
            ores: Vec::new(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(src: &str) -> Result<Self, Box<dyn Error>> {
        let settings: Settings = toml::from_str(src)?;
        if settings.view_distance < 0 {
            return Err(format!("view_distance must be >= 0, got {}", settings.view_distance).into());
        }
        Ok(settings)
    }

    pub fn from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let s = Settings::from_toml_str("").unwrap();
        assert_eq!(s.view_distance, 8);
        assert_eq!(s.eviction_interval_ticks, 20);
        assert_eq!(s.cave_esp.mode, CaveMode::Caves);
        assert!(s.block_esp.structure_mode);
        assert!(s.ore_esp.seed.is_empty());
        assert_eq!(s.ore_esp.dimension, Dimension::Overworld);
    }

    #[test]
    fn sections_override_fields() {
        let src = r#"
            view_distance = 4

            [block_esp]
            blocks = ["cobblestone"]
            color = [10, 20, 30]

            [cave_esp]
            mode = "tunnel"

            [ore_esp]
            seed = "-4172144997902289642"
            dimension = "nether"

            [[ore_esp.ores]]
            group = "diamond"
            enabled = false

            [[ore_esp.ores]]
            group = "gold"
            color = [1, 2, 3]
        "#;
        let s = Settings::from_toml_str(src).unwrap();
        assert_eq!(s.view_distance, 4);
        assert_eq!(s.block_esp.blocks, vec!["cobblestone".to_string()]);
        assert_eq!(s.block_esp.color, Color::rgb(10, 20, 30));
        assert_eq!(s.cave_esp.mode, CaveMode::Tunnel);
        assert_eq!(s.ore_esp.dimension, Dimension::Nether);
        assert_eq!(s.ore_esp.ores.len(), 2);
        assert_eq!(s.ore_esp.ores[0].enabled, Some(false));
        assert_eq!(s.ore_esp.ores[1].color, Some(Color::rgb(1, 2, 3)));
    }

    #[test]
    fn negative_view_distance_is_rejected() {
        assert!(Settings::from_toml_str("view_distance = -1").is_err());
    }
}
