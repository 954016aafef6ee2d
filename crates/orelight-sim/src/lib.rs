//! Seeded ore placement: worldgen random, providers, ore table, and the vein simulator.
#![forbid(unsafe_code)]

pub mod ore;
pub mod provider;
pub mod random;
pub mod scratch;
pub mod seed;
pub mod vein;

pub use ore::{Dimension, OreDescriptor, OreTable, OreTableError};
pub use provider::{HeightContext, HeightProvider, IntProvider, VerticalAnchor};
pub use random::{WorldgenRandom, Xoroshiro128PlusPlus};
pub use scratch::{ScratchPool, VeinScratch};
pub use seed::{SeedError, parse_seed};
pub use vein::{FeatureOracle, VeinSimulator};
