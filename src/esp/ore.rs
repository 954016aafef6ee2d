use std::sync::Arc;

use orelight_geom::{BlockPos, ChunkPos, Vec3};
use orelight_highlight::{Color, LineSink, SpatialBlock};
use orelight_sim::{FeatureOracle, OreTable, VeinSimulator, parse_seed};
use orelight_world::{Block, BiomeSource};

use super::{EnableError, EspController, EspCore};
use crate::settings::{OreEspSettings, Settings};

/// Overlay of ore positions predicted from the world seed.
pub struct OreEsp {
    core: EspCore,
    settings: OreEspSettings,
    biomes: Arc<dyn BiomeSource>,
    simulator: Option<Arc<VeinSimulator>>,
}

impl OreEsp {
    pub fn new(mut core: EspCore, settings: &Settings, biomes: Arc<dyn BiomeSource>) -> Self {
        core.set_view_distance(settings.view_distance);
        core.set_eviction_interval(settings.eviction_interval_ticks);
        Self {
            core,
            settings: settings.ore_esp.clone(),
            biomes,
            simulator: None,
        }
    }

    pub fn simulator(&self) -> Option<&VeinSimulator> {
        self.simulator.as_deref()
    }

    fn build_simulator(&self) -> Result<VeinSimulator, EnableError> {
        let seed = parse_seed(&self.settings.seed)?;
        let mut table = match &self.settings.ore_table {
            Some(path) => OreTable::from_path(path)?,
            None => OreTable::builtin(),
        };
        for o in &self.settings.ores {
            if let Some(enabled) = o.enabled {
                table.set_group_enabled(&o.group, enabled);
            }
            if let Some(color) = o.color {
                table.set_group_color(&o.group, color);
            }
        }
        Ok(VeinSimulator::new(
            seed,
            &table,
            self.settings.dimension,
            self.biomes.as_ref(),
            self.core.runtime.w_bg,
        ))
    }

    /// Rebuilds the simulator; on failure the overlay is shut off.
    fn start(&mut self) -> Result<(), EnableError> {
        match self.build_simulator() {
            Ok(sim) => {
                self.simulator = Some(Arc::new(sim));
                Ok(())
            }
            Err(e) => {
                let msg = match &e {
                    EnableError::InvalidSeed(_) => "An invalid seed was provided!".to_string(),
                    other => format!("Ore ESP could not start: {other}"),
                };
                self.core.messages.error(&msg);
                self.simulator = None;
                self.core.unsubscribe();
                self.core.reset();
                Err(e)
            }
        }
    }
}

impl EspController for OreEsp {
    fn core(&self) -> &EspCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EspCore {
        &mut self.core
    }

    fn on_enable(&mut self) -> Result<(), EnableError> {
        self.start()?;
        self.core.reset();
        self.core.subscribe();
        self.search_visible();
        log::info!("ore esp enabled (seed {})", self.settings.seed.trim());
        Ok(())
    }

    fn on_disable(&mut self) {
        self.core.unsubscribe();
        self.core.reset();
        self.simulator = None;
        log::info!("ore esp disabled");
    }

    fn apply_settings(&mut self, settings: &Settings) -> Result<(), EnableError> {
        self.core.set_view_distance(settings.view_distance);
        self.core.set_eviction_interval(settings.eviction_interval_ticks);
        self.settings = settings.ore_esp.clone();
        if self.is_enabled() {
            self.reload()?;
        }
        Ok(())
    }

    fn reload(&mut self) -> Result<(), EnableError> {
        self.start()?;
        self.core.reset();
        self.search_visible();
        Ok(())
    }

    fn search_chunk(&mut self, pos: ChunkPos) {
        let Some(sim) = self.simulator.clone() else {
            return;
        };
        if !self.core.world.is_loaded(pos) {
            return;
        }
        // the simulation never changes for a chunk, so one pass is enough
        if self.core.cache.with_lock(|state| state.contains_chunk(pos)) {
            return;
        }
        let world = Arc::clone(&self.core.world);
        let biomes = Arc::clone(&self.biomes);
        self.core.discover(pos, move || {
            Some(sim.simulate(pos, world.as_ref(), biomes.as_ref()))
        });
    }

    /// Any change at a predicted position means the ore is gone or was never there.
    fn on_block_changed(&mut self, pos: BlockPos, _old: Block, _new: Block) {
        if self.core.cache.with_lock(|state| state.contains_block(pos)) {
            self.core
                .update_block(false, SpatialBlock::new(pos, Color::RED_ORANGE));
        }
    }

    fn eviction_radius(&self) -> i32 {
        (self.core.view_distance() / 2).max(1)
    }

    fn render(&self, camera: Vec3, sink: &mut dyn LineSink) -> usize {
        let mut view = self.core.render_view(camera);
        view.alpha = self.settings.alpha;
        view.structure_mode = false;
        view.tracers = false;
        self.core.draw(&view, sink)
    }
}
