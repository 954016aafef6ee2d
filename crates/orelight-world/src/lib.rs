//! World-side collaborators: block table, chunk columns, world and biome views.
#![forbid(unsafe_code)]

pub mod biome;
pub mod block;
pub mod chunk;
pub mod terrain;
pub mod world;

pub use biome::{BiomeId, BiomeSource, ClimateBiomes, FixedBiome};
pub use block::{Block, BlockId, BlockTable, BlockType};
pub use chunk::ChunkData;
pub use terrain::{TerrainGen, TerrainParams};
pub use world::{GridWorld, WorldView};
