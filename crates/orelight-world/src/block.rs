use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;

pub type BlockId = u16;

/// A block instance; only the type id matters to the highlight layer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Block {
    pub id: BlockId,
}

impl Block {
    pub const AIR: Block = Block { id: 0 };

    #[inline]
    pub const fn new(id: BlockId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn is_air(self) -> bool {
        self.id == 0
    }
}

#[derive(Clone, Debug, Deserialize)]
struct BlockDef {
    name: String,
    #[serde(default = "default_true")]
    opaque: bool,
    #[serde(default)]
    air: bool,
    #[serde(default)]
    liquid: bool,
    #[serde(default)]
    foliage: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
struct BlocksConfig {
    #[serde(default)]
    blocks: Vec<BlockDef>,
}

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub opaque: bool,
    pub air: bool,
    pub liquid: bool,
    /// Leaves, vines, lichen: see-through growth that does not count as a roof.
    pub foliage: bool,
}

/// Block type table, indexed by id. Id 0 is air.
#[derive(Clone, Debug)]
pub struct BlockTable {
    types: Vec<BlockType>,
    by_name: HashMap<String, BlockId>,
}

impl BlockTable {
    pub fn from_toml_str(src: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(src)?;
        Self::from_config(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Table shipped with the crate.
    pub fn builtin() -> Self {
        // The embedded file is covered by tests; an empty air-only table is the fallback.
        Self::from_toml_str(include_str!("../data/blocks.toml")).unwrap_or_else(|e| {
            log::error!("builtin block table failed to parse: {}", e);
            Self::air_only()
        })
    }

    fn air_only() -> Self {
        let air = BlockType {
            id: 0,
            name: "air".to_string(),
            opaque: false,
            air: true,
            liquid: false,
            foliage: false,
        };
        let mut by_name = HashMap::new();
        by_name.insert(air.name.clone(), 0);
        Self {
            types: vec![air],
            by_name,
        }
    }

    fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut types = Vec::with_capacity(cfg.blocks.len());
        let mut by_name = HashMap::with_capacity(cfg.blocks.len());
        for def in cfg.blocks {
            let id = BlockId::try_from(types.len()).map_err(|_| "too many block types")?;
            if by_name.contains_key(&def.name) {
                return Err(format!("duplicate block type '{}'", def.name).into());
            }
            by_name.insert(def.name.clone(), id);
            types.push(BlockType {
                id,
                name: def.name,
                opaque: def.opaque && !def.air,
                air: def.air,
                liquid: def.liquid,
                foliage: def.foliage,
            });
        }
        match types.first() {
            Some(t) if t.air => {}
            _ => return Err("first block type must be air".into()),
        }
        Ok(Self { types, by_name })
    }

    #[inline]
    pub fn get(&self, block: Block) -> Option<&BlockType> {
        self.types.get(block.id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn block(&self, name: &str) -> Option<Block> {
        self.id_by_name(name).map(Block::new)
    }

    pub fn name(&self, block: Block) -> &str {
        self.get(block).map(|t| t.name.as_str()).unwrap_or("unknown")
    }

    #[inline]
    pub fn is_air(&self, block: Block) -> bool {
        self.get(block).is_none_or(|t| t.air)
    }

    /// Unknown ids count as not opaque.
    #[inline]
    pub fn is_opaque(&self, block: Block) -> bool {
        self.get(block).is_some_and(|t| t.opaque)
    }

    #[inline]
    pub fn is_liquid(&self, block: Block) -> bool {
        self.get(block).is_some_and(|t| t.liquid)
    }

    #[inline]
    pub fn is_foliage(&self, block: Block) -> bool {
        self.get(block).is_some_and(|t| t.foliage)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.types.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses_with_air_first() {
        let t = BlockTable::from_toml_str(include_str!("../data/blocks.toml")).unwrap();
        assert!(t.is_air(Block::AIR));
        assert!(!t.is_opaque(Block::AIR));
        let stone = t.block("stone").unwrap();
        assert!(t.is_opaque(stone));
        let water = t.block("water").unwrap();
        assert!(t.is_liquid(water) && !t.is_opaque(water));
        assert!(t.is_foliage(t.block("oak_leaves").unwrap()));
    }

    #[test]
    fn rejects_table_without_leading_air() {
        let err = BlockTable::from_toml_str("[[blocks]]\nname = \"stone\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn rejects_duplicate_names() {
        let src = "[[blocks]]\nname=\"air\"\nair=true\n[[blocks]]\nname=\"a\"\n[[blocks]]\nname=\"a\"\n";
        assert!(BlockTable::from_toml_str(src).is_err());
    }

    #[test]
    fn unknown_ids_are_air_and_not_opaque() {
        let t = BlockTable::builtin();
        let bogus = Block::new(60_000);
        assert!(t.is_air(bogus));
        assert!(!t.is_opaque(bogus));
        assert_eq!(t.name(bogus), "unknown");
    }
}
