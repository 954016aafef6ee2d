use std::sync::Arc;

use hashbrown::HashSet;
use orelight_geom::{BlockPos, ChunkPos, Vec3};
use orelight_highlight::{LineSink, SpatialBlock, scan_chunk};
use orelight_world::{Block, BlockId, BlockTable};

use super::{EnableError, EspController, EspCore};
use crate::settings::{BlockEspSettings, Settings};

/// Highlights every block whose type is on a configured list.
pub struct BlockEsp {
    core: EspCore,
    settings: BlockEspSettings,
    targets: Arc<HashSet<BlockId>>,
}

fn resolve_targets(table: &BlockTable, names: &[String]) -> HashSet<BlockId> {
    let mut ids = HashSet::new();
    for name in names {
        match table.id_by_name(name) {
            Some(id) if id != Block::AIR.id => {
                ids.insert(id);
            }
            Some(_) => log::warn!("block esp: ignoring air in block list"),
            None => log::warn!("block esp: unknown block '{}'", name),
        }
    }
    ids
}

impl BlockEsp {
    pub fn new(mut core: EspCore, settings: &Settings) -> Self {
        core.set_view_distance(settings.view_distance);
        core.set_eviction_interval(settings.eviction_interval_ticks);
        let targets = resolve_targets(core.world.blocks(), &settings.block_esp.blocks);
        Self {
            core,
            settings: settings.block_esp.clone(),
            targets: Arc::new(targets),
        }
    }

    fn matches(&self, block: Block) -> bool {
        self.targets.contains(&block.id)
    }
}

impl EspController for BlockEsp {
    fn core(&self) -> &EspCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EspCore {
        &mut self.core
    }

    fn on_enable(&mut self) -> Result<(), EnableError> {
        self.core.reset();
        self.core.subscribe();
        self.search_visible();
        log::info!("block esp enabled ({} block types)", self.targets.len());
        Ok(())
    }

    fn on_disable(&mut self) {
        self.core.unsubscribe();
        self.core.reset();
        log::info!("block esp disabled");
    }

    fn apply_settings(&mut self, settings: &Settings) -> Result<(), EnableError> {
        self.core.set_view_distance(settings.view_distance);
        self.core.set_eviction_interval(settings.eviction_interval_ticks);
        self.targets = Arc::new(resolve_targets(
            self.core.world.blocks(),
            &settings.block_esp.blocks,
        ));
        self.settings = settings.block_esp.clone();
        if self.is_enabled() {
            self.reload()?;
        }
        Ok(())
    }

    fn reload(&mut self) -> Result<(), EnableError> {
        self.core.reset();
        self.search_visible();
        Ok(())
    }

    fn search_chunk(&mut self, pos: ChunkPos) {
        let world = Arc::clone(&self.core.world);
        let targets = Arc::clone(&self.targets);
        let color = self.settings.color;
        self.core.discover(pos, move || {
            let chunk = world.chunk(pos)?;
            Some(scan_chunk(&chunk, color, |_, block| targets.contains(&block.id)))
        });
    }

    fn on_block_changed(&mut self, pos: BlockPos, old: Block, new: Block) {
        let added = self.matches(new) && !self.matches(old);
        let removed = !added && self.matches(old) && !self.matches(new);
        if !added && !removed {
            return;
        }
        self.core
            .update_block(added, SpatialBlock::new(pos, self.settings.color));
    }

    fn eviction_radius(&self) -> i32 {
        self.core.view_distance()
    }

    fn render(&self, camera: Vec3, sink: &mut dyn LineSink) -> usize {
        let mut view = self.core.render_view(camera);
        view.alpha = self.settings.alpha;
        view.structure_mode = self.settings.structure_mode;
        view.tracers = self.settings.tracers;
        self.core.draw(&view, sink)
    }
}
