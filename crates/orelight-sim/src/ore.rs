use std::fmt;
use std::fs;
use std::path::Path;

use orelight_highlight::Color;
use serde::Deserialize;

use crate::provider::{HeightProvider, IntProvider};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Overworld,
    Nether,
}

impl Dimension {
    pub fn height_context(self) -> crate::provider::HeightContext {
        match self {
            Dimension::Overworld => crate::provider::HeightContext::OVERWORLD,
            Dimension::Nether => crate::provider::HeightContext::NETHER,
        }
    }
}

#[derive(Debug)]
pub enum OreTableError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for OreTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OreTableError::Io(e) => write!(f, "failed to read ore table: {}", e),
            OreTableError::Parse(e) => write!(f, "failed to parse ore table: {}", e),
        }
    }
}

impl std::error::Error for OreTableError {}

impl From<std::io::Error> for OreTableError {
    fn from(e: std::io::Error) -> Self {
        OreTableError::Io(e)
    }
}

impl From<toml::de::Error> for OreTableError {
    fn from(e: toml::de::Error) -> Self {
        OreTableError::Parse(e)
    }
}

fn default_true() -> bool {
    true
}

fn default_color() -> Color {
    Color::WHITE
}

#[derive(Clone, Debug, Deserialize)]
struct OreDef {
    name: String,
    #[serde(default)]
    group: Option<String>,
    dimension: Dimension,
    step: i32,
    index: i32,
    count: IntProvider,
    #[serde(default)]
    rarity: Option<f32>,
    /// One-in-N form of `rarity`.
    #[serde(default)]
    chance: Option<u32>,
    height: HeightProvider,
    size: i32,
    #[serde(default)]
    discard_on_air: f32,
    #[serde(default)]
    scattered: bool,
    #[serde(default)]
    biomes: Vec<String>,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_color")]
    color: Color,
}

/// One placed ore feature and the user-facing toggles carried with it.
#[derive(Clone, Debug, PartialEq)]
pub struct OreDescriptor {
    pub name: String,
    /// Settings key shared by related features (e.g. all diamond variants).
    pub group: String,
    pub dimension: Dimension,
    pub step: i32,
    pub index: i32,
    pub count: IntProvider,
    /// Probability in (0, 1] that a placement attempt survives.
    pub rarity: f32,
    pub height: HeightProvider,
    pub size: i32,
    pub discard_on_air: f32,
    pub scattered: bool,
    /// Biome names; empty means every biome.
    pub biomes: Vec<String>,
    pub enabled: bool,
    pub color: Color,
}

impl OreDef {
    fn validate(self) -> Result<OreDescriptor, String> {
        if self.size < 1 {
            return Err(format!("size {} must be at least 1", self.size));
        }
        if !self.count.is_valid() {
            return Err(format!("invalid count {:?}", self.count));
        }
        let rarity = match (self.rarity, self.chance) {
            (Some(_), Some(_)) => return Err("both rarity and chance given".to_string()),
            (Some(r), None) => r,
            (None, Some(0)) => return Err("chance must be positive".to_string()),
            (None, Some(n)) => 1.0 / n as f32,
            (None, None) => 1.0,
        };
        if !(rarity > 0.0 && rarity <= 1.0) {
            return Err(format!("rarity {} outside (0, 1]", rarity));
        }
        if !(0.0..=1.0).contains(&self.discard_on_air) {
            return Err(format!(
                "discard_on_air {} outside [0, 1]",
                self.discard_on_air
            ));
        }
        let group = self.group.unwrap_or_else(|| self.name.clone());
        Ok(OreDescriptor {
            name: self.name,
            group,
            dimension: self.dimension,
            step: self.step,
            index: self.index,
            count: self.count,
            rarity,
            height: self.height,
            size: self.size,
            discard_on_air: self.discard_on_air,
            scattered: self.scattered,
            biomes: self.biomes,
            enabled: self.enabled,
            color: self.color,
        })
    }
}

#[derive(Deserialize)]
struct RawTable {
    #[serde(default)]
    ore: Vec<toml::Value>,
}

/// Ore descriptors in generation order (step, then index).
#[derive(Clone, Debug, Default)]
pub struct OreTable {
    ores: Vec<OreDescriptor>,
}

impl OreTable {
    /// Parses `[[ore]]` entries. A malformed entry is logged and skipped.
    pub fn from_toml_str(src: &str) -> Result<Self, OreTableError> {
        let raw: RawTable = toml::from_str(src)?;
        let mut ores = Vec::with_capacity(raw.ore.len());
        for (i, value) in raw.ore.into_iter().enumerate() {
            let name = value
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("<unnamed>")
                .to_string();
            let parsed = OreDef::deserialize(value)
                .map_err(|e| e.to_string())
                .and_then(OreDef::validate);
            match parsed {
                Ok(desc) => ores.push(desc),
                Err(e) => log::warn!("skipping ore entry #{} ({}): {}", i, name, e),
            }
        }
        ores.sort_by_key(|o| (o.step, o.index));
        Ok(Self { ores })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OreTableError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Vanilla overworld and nether ores shipped with the crate.
    pub fn builtin() -> Self {
        Self::from_toml_str(include_str!("../data/ores.toml")).unwrap_or_else(|e| {
            log::error!("builtin ore table failed to parse: {}", e);
            Self::default()
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &OreDescriptor> {
        self.ores.iter()
    }

    pub fn for_dimension(&self, dim: Dimension) -> impl Iterator<Item = &OreDescriptor> {
        self.ores.iter().filter(move |o| o.dimension == dim)
    }

    pub fn len(&self) -> usize {
        self.ores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ores.is_empty()
    }

    /// Applies a user toggle to every descriptor of a group.
    pub fn set_group_enabled(&mut self, group: &str, enabled: bool) {
        for o in self.ores.iter_mut().filter(|o| o.group == group) {
            o.enabled = enabled;
        }
    }

    pub fn set_group_color(&mut self, group: &str, color: Color) {
        for o in self.ores.iter_mut().filter(|o| o.group == group) {
            o.color = color;
        }
    }

    pub fn groups(&self) -> Vec<&str> {
        let mut g: Vec<&str> = self.ores.iter().map(|o| o.group.as_str()).collect();
        g.sort_unstable();
        g.dedup();
        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"
[[ore]]
name = "b"
dimension = "overworld"
step = 6
index = 12
count = { constant = 3 }
height = { kind = "uniform", min = "bottom", max = { absolute = 72 } }
size = 4

[[ore]]
name = "a"
dimension = "overworld"
step = 6
index = 9
count = { constant = 30 }
chance = 4
height = { kind = "uniform", min = { absolute = 136 }, max = "top" }
size = 17
"#;

    #[test]
    fn sorts_by_step_then_index_and_converts_chance() {
        let t = OreTable::from_toml_str(GOOD).unwrap();
        let names: Vec<&str> = t.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(t.iter().next().unwrap().rarity, 0.25);
        assert_eq!(t.iter().nth(1).unwrap().group, "b");
    }

    #[test]
    fn malformed_entries_are_skipped_individually() {
        let src = format!(
            "{GOOD}\n[[ore]]\nname = \"bad_shape\"\ndimension = \"overworld\"\nstep = 6\nindex = 1\ncount = {{ triangle = 3 }}\nheight = {{ kind = \"uniform\", min = \"bottom\", max = \"top\" }}\nsize = 3\n\n[[ore]]\nname = \"bad_rarity\"\ndimension = \"overworld\"\nstep = 6\nindex = 2\ncount = {{ constant = 1 }}\nrarity = 1.5\nheight = {{ kind = \"uniform\", min = \"bottom\", max = \"top\" }}\nsize = 3\n"
        );
        let t = OreTable::from_toml_str(&src).unwrap();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn broken_toml_is_an_error() {
        assert!(matches!(
            OreTable::from_toml_str("[[ore]\nname ="),
            Err(OreTableError::Parse(_))
        ));
    }

    #[test]
    fn builtin_table_covers_both_dimensions() {
        let t = OreTable::from_toml_str(include_str!("../data/ores.toml")).unwrap();
        assert!(t.for_dimension(Dimension::Overworld).count() >= 15);
        assert!(t.for_dimension(Dimension::Nether).count() >= 4);
        assert!(t.groups().contains(&"diamond"));
        assert!(t.iter().any(|o| o.scattered));
    }

    #[test]
    fn group_toggles_apply_to_all_members() {
        let mut t = OreTable::builtin();
        t.set_group_enabled("diamond", false);
        assert!(t.iter().filter(|o| o.group == "diamond").all(|o| !o.enabled));
        assert!(t.iter().filter(|o| o.group == "coal").all(|o| o.enabled));
    }
}
