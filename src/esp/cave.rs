use std::sync::Arc;

use orelight_geom::{BlockPos, ChunkPos, Vec3};
use orelight_highlight::{LineSink, SpatialBlock, scan_chunk};
use orelight_world::{Block, BlockTable};

use super::{EnableError, EspController, EspCore};
use crate::settings::{CaveEspSettings, CaveMode, Settings};

/// Whether the air cell at `pos` counts as cave space under `mode`.
///
/// A cell needs a roof: some block above it, below `max_y`, that is neither
/// air nor foliage.
pub fn cave_cell(
    table: &BlockTable,
    mode: CaveMode,
    pos: BlockPos,
    max_y: i32,
    block_at: impl Fn(BlockPos) -> Block,
) -> bool {
    if !table.is_air(block_at(pos)) {
        return false;
    }
    let air_above = table.is_air(block_at(pos.offset(0, 1, 0)));
    let open = match mode {
        CaveMode::Caves => air_above || table.is_air(block_at(pos.offset(0, -1, 0))),
        CaveMode::Tunnel => air_above && !table.is_air(block_at(pos.offset(0, 2, 0))),
    };
    open && has_roof(table, pos, max_y, &block_at)
}

fn has_roof(table: &BlockTable, pos: BlockPos, max_y: i32, block_at: &impl Fn(BlockPos) -> Block) -> bool {
    (pos.y..max_y).any(|y| {
        let b = block_at(BlockPos::new(pos.x, y, pos.z));
        !table.is_air(b) && !table.is_foliage(b)
    })
}

/// Highlights reachable air pockets under ground.
pub struct CaveEsp {
    core: EspCore,
    settings: CaveEspSettings,
}

impl CaveEsp {
    pub fn new(mut core: EspCore, settings: &Settings) -> Self {
        core.set_view_distance(settings.view_distance);
        core.set_eviction_interval(settings.eviction_interval_ticks);
        Self {
            core,
            settings: settings.cave_esp.clone(),
        }
    }

    pub fn mode(&self) -> CaveMode {
        self.settings.mode
    }
}

impl EspController for CaveEsp {
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
        log::info!("cave esp enabled ({:?})", self.settings.mode);
        Ok(())
    }

    fn on_disable(&mut self) {
        self.core.unsubscribe();
        self.core.reset();
        log::info!("cave esp disabled");
    }

    fn apply_settings(&mut self, settings: &Settings) -> Result<(), EnableError> {
        self.core.set_view_distance(settings.view_distance);
        self.core.set_eviction_interval(settings.eviction_interval_ticks);
        self.settings = settings.cave_esp.clone();
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
        let mode = self.settings.mode;
        let color = self.settings.color;
        self.core.discover(pos, move || {
            let chunk = world.chunk(pos)?;
            let table = world.blocks();
            let max_y = chunk.max_y();
            // every lookup stays inside this column
            let at = |p: BlockPos| chunk.get_world(p).unwrap_or(Block::AIR);
            Some(scan_chunk(&chunk, color, |p, block| {
                table.is_air(block) && cave_cell(table, mode, p, max_y, at)
            }))
        });
    }

    fn on_block_changed(&mut self, pos: BlockPos, old: Block, new: Block) {
        let table = self.core.world.blocks();
        let added = table.is_air(new) && !table.is_air(old);
        let removed = !added && !table.is_air(new) && table.is_air(old);
        if removed {
            self.core
                .update_block(false, SpatialBlock::new(pos, self.settings.color));
        } else if added {
            let world = &self.core.world;
            if cave_cell(table, self.settings.mode, pos, world.max_y(), |p| world.block_at(p)) {
                self.core
                    .update_block(true, SpatialBlock::new(pos, self.settings.color));
            }
        }
    }

    fn eviction_radius(&self) -> i32 {
        self.core.view_distance()
    }

    fn render(&self, camera: Vec3, sink: &mut dyn LineSink) -> usize {
        let mut view = self.core.render_view(camera);
        view.alpha = self.settings.alpha;
        view.structure_mode = self.settings.structure_mode;
        self.core.draw(&view, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    fn column(table: &BlockTable, cells: &[(i32, &str)]) -> HashMap<i32, Block> {
        cells
            .iter()
            .map(|(y, name)| (*y, table.block(name).unwrap()))
            .collect()
    }

    #[test]
    fn cave_needs_open_neighbour_and_roof() {
        let t = BlockTable::builtin();
        // stone floor at 0, air 1..=2, stone roof at 3
        let col = column(&t, &[(0, "stone"), (3, "stone")]);
        let at = |p: BlockPos| col.get(&p.y).copied().unwrap_or(Block::AIR);
        assert!(cave_cell(&t, CaveMode::Caves, BlockPos::new(0, 1, 0), 10, at));
        assert!(cave_cell(&t, CaveMode::Caves, BlockPos::new(0, 2, 0), 10, at));
        assert!(!cave_cell(&t, CaveMode::Caves, BlockPos::new(0, 0, 0), 10, at));
        // above the roof: nothing covers it
        assert!(!cave_cell(&t, CaveMode::Caves, BlockPos::new(0, 5, 0), 10, at));
    }

    #[test]
    fn leaves_do_not_count_as_roof() {
        let t = BlockTable::builtin();
        let col = column(&t, &[(0, "stone"), (3, "oak_leaves")]);
        let at = |p: BlockPos| col.get(&p.y).copied().unwrap_or(Block::AIR);
        assert!(!cave_cell(&t, CaveMode::Caves, BlockPos::new(0, 1, 0), 10, at));
    }

    #[test]
    fn tunnel_needs_ceiling_two_above() {
        let t = BlockTable::builtin();
        let col = column(&t, &[(0, "stone"), (3, "stone")]);
        let at = |p: BlockPos| col.get(&p.y).copied().unwrap_or(Block::AIR);
        assert!(cave_cell(&t, CaveMode::Tunnel, BlockPos::new(0, 1, 0), 10, at));
        // y=2 has stone directly above, not two above
        assert!(!cave_cell(&t, CaveMode::Tunnel, BlockPos::new(0, 2, 0), 10, at));
    }
}
