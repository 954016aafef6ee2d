//! Highlight controllers: block list, cave air and simulated ore veins.

mod block;
mod cave;
mod common;
mod ore;

pub use block::BlockEsp;
pub use cave::{CaveEsp, cave_cell};
pub use common::EspCore;
pub use ore::OreEsp;

use std::fmt;

use orelight_geom::{BlockPos, ChunkPos, Vec3};
use orelight_highlight::LineSink;
use orelight_sim::{OreTableError, SeedError};
use orelight_world::Block;

use crate::event::Event;
use crate::settings::Settings;

#[derive(Debug)]
pub enum EnableError {
    InvalidSeed(SeedError),
    OreTable(OreTableError),
}

impl fmt::Display for EnableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnableError::InvalidSeed(e) => write!(f, "invalid seed: {e}"),
            EnableError::OreTable(e) => write!(f, "ore table: {e}"),
        }
    }
}

impl std::error::Error for EnableError {}

impl From<SeedError> for EnableError {
    fn from(e: SeedError) -> Self {
        EnableError::InvalidSeed(e)
    }
}

impl From<OreTableError> for EnableError {
    fn from(e: OreTableError) -> Self {
        EnableError::OreTable(e)
    }
}

/// Lifecycle and notification surface shared by every highlight mode.
pub trait EspController {
    fn core(&self) -> &EspCore;
    fn core_mut(&mut self) -> &mut EspCore;

    fn on_enable(&mut self) -> Result<(), EnableError>;
    fn on_disable(&mut self);

    /// Takes new settings; an enabled controller rediscovers with them.
    fn apply_settings(&mut self, settings: &Settings) -> Result<(), EnableError>;

    /// Clears the cache and rediscovers every visible chunk.
    fn reload(&mut self) -> Result<(), EnableError>;

    fn search_chunk(&mut self, pos: ChunkPos);
    fn on_block_changed(&mut self, pos: BlockPos, old: Block, new: Block);
    fn eviction_radius(&self) -> i32;
    fn render(&self, camera: Vec3, sink: &mut dyn LineSink) -> usize;

    fn is_enabled(&self) -> bool {
        self.core().is_listening()
    }

    fn on_chunk_loaded(&mut self, pos: ChunkPos) {
        self.search_chunk(pos);
    }

    fn on_world_render(&mut self, player: ChunkPos) -> usize {
        let radius = self.eviction_radius();
        self.core_mut().sweep(player, radius)
    }

    /// Rediscovers every loaded chunk within view distance.
    fn search_visible(&mut self) {
        let chunks = self.core().visible_chunks();
        log::debug!(
            "{}: queueing {} visible chunks",
            self.core().name(),
            chunks.len()
        );
        for pos in chunks {
            self.search_chunk(pos);
        }
    }

    /// Routes a world notification; ignored while unsubscribed.
    fn handle(&mut self, event: &Event) {
        if !self.core().is_listening() {
            return;
        }
        match event {
            Event::BlockChanged { pos, old, new } => self.on_block_changed(*pos, *old, *new),
            Event::ChunkLoaded { pos } => self.on_chunk_loaded(*pos),
            Event::WorldRenderTick { player } => {
                self.on_world_render(*player);
            }
            Event::PlayerMoved { camera } => {
                let player = ChunkPos::containing(camera.x.floor() as i32, camera.z.floor() as i32);
                self.core_mut().set_player(player);
            }
            Event::SettingsChanged => {}
        }
    }
}
