use std::sync::Arc;
use std::time::Duration;

use orelight_geom::{ChunkPos, Vec3};
use orelight_highlight::{ChunkRecord, LineSink, RenderPass, RenderView, SpatialBlock, SpatialCache};
use orelight_runtime::{Lane, Revisions, Runtime, TaskOutcome};
use orelight_world::WorldView;

use crate::messages::UserMessages;

/// State every highlight controller shares: its own cache, a discovery scope
/// on the shared runtime, and the world it observes.
pub struct EspCore {
    name: &'static str,
    pub cache: Arc<SpatialCache>,
    pub runtime: Arc<Runtime>,
    pub world: Arc<dyn WorldView>,
    pub messages: Arc<dyn UserMessages>,
    scope: Arc<Revisions>,
    view_distance: i32,
    eviction_interval: u64,
    ticks_since_sweep: u64,
    player: ChunkPos,
    listening: bool,
}

impl EspCore {
    pub fn new(
        name: &'static str,
        runtime: Arc<Runtime>,
        world: Arc<dyn WorldView>,
        messages: Arc<dyn UserMessages>,
    ) -> Self {
        Self {
            name,
            cache: Arc::new(SpatialCache::new()),
            runtime,
            world,
            messages,
            scope: Arc::new(Revisions::default()),
            view_distance: 8,
            eviction_interval: 1,
            ticks_since_sweep: 0,
            player: ChunkPos::default(),
            listening: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn set_view_distance(&mut self, chunks: i32) {
        self.view_distance = chunks.max(0);
    }

    pub fn view_distance(&self) -> i32 {
        self.view_distance
    }

    pub fn set_eviction_interval(&mut self, ticks: u64) {
        self.eviction_interval = ticks.max(1);
    }

    pub fn player(&self) -> ChunkPos {
        self.player
    }

    pub fn set_player(&mut self, player: ChunkPos) {
        self.player = player;
    }

    pub fn subscribe(&mut self) {
        self.listening = true;
    }

    pub fn unsubscribe(&mut self) {
        self.listening = false;
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Empties the cache and invalidates every queued discovery job.
    pub fn reset(&mut self) -> usize {
        self.scope.clear();
        self.ticks_since_sweep = 0;
        let dropped = self.cache.with_lock(|state| state.clear());
        log::debug!("{}: cleared {} chunk records", self.name, dropped);
        dropped
    }

    /// Loaded chunks within view distance of the player, nearest first.
    pub fn visible_chunks(&self) -> Vec<ChunkPos> {
        let mut out: Vec<ChunkPos> = self
            .world
            .loaded_chunks()
            .into_iter()
            .filter(|c| c.chebyshev(self.player) <= self.view_distance)
            .collect();
        out.sort_by_key(|c| (c.chebyshev(self.player), *c));
        out
    }

    /// Runs `scan` on the background lane and commits its record, unless a
    /// newer scan of the same chunk was queued meanwhile.
    pub fn discover<F>(&self, pos: ChunkPos, scan: F)
    where
        F: FnOnce() -> Option<ChunkRecord> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        let name = self.name;
        let label = format!("{} scan {},{}", name, pos.cx, pos.cz);
        self.runtime
            .submit_discovery(&self.scope, pos, label, move |ticket| {
                let Some(record) = scan() else {
                    return;
                };
                let found = record.len();
                cache.with_lock(|state| {
                    if ticket.is_current() {
                        state.commit_chunk(record);
                        log::trace!("{}: committed {:?} ({} blocks)", name, pos, found);
                    }
                });
            });
    }

    /// Queues a single-block add or remove on the edit lane.
    pub fn update_block(&self, added: bool, block: SpatialBlock) {
        let cache = Arc::clone(&self.cache);
        let label = format!("{} update {:?}", self.name, block.pos);
        self.runtime.execute(Lane::Edit, label, move || {
            cache.with_lock(|state| state.update_block(added, block));
        });
    }

    /// Counts ticks and, once the interval elapses, evicts records outside
    /// `radius` of the player. Returns how many records were dropped.
    pub fn sweep(&mut self, player: ChunkPos, radius: i32) -> usize {
        self.player = player;
        self.ticks_since_sweep += 1;
        if self.ticks_since_sweep < self.eviction_interval {
            return 0;
        }
        self.ticks_since_sweep = 0;
        self.scope.retain(|c| c.chebyshev(player) <= radius);
        self.cache
            .with_lock(|state| state.evict_outside(player, radius))
    }

    pub fn draw(&self, view: &RenderView, sink: &mut dyn LineSink) -> usize {
        RenderPass::draw(&self.cache, view, sink)
    }

    pub fn render_view(&self, camera: Vec3) -> RenderView {
        RenderView::new(camera, self.view_distance)
    }

    /// Waits for queued work and logs any failed task. Returns false on timeout.
    pub fn flush(&self, timeout: Duration) -> bool {
        let idle = self.runtime.wait_idle(timeout);
        self.pump_reports();
        idle
    }

    /// Drains this controller's task reports, leaving other controllers'
    /// reports on the shared runtime.
    pub fn pump_reports(&self) -> usize {
        let reports = self
            .runtime
            .drain_reports_where(|r| owned_by(&r.label, self.name));
        for r in &reports {
            if let TaskOutcome::Failed(msg) = &r.outcome {
                log::warn!("{}: task '{}' failed: {}", self.name, r.label, msg);
            }
        }
        reports.len()
    }
}

/// Task labels are `"<controller> <action> ..."`.
fn owned_by(label: &str, name: &str) -> bool {
    label
        .strip_prefix(name)
        .is_some_and(|rest| rest.starts_with(' '))
}

#[cfg(test)]
mod tests {
    use super::owned_by;

    #[test]
    fn labels_match_whole_controller_names() {
        assert!(owned_by("block-esp scan 1,2", "block-esp"));
        assert!(!owned_by("block-esp2 scan 1,2", "block-esp"));
        assert!(!owned_by("cave-esp update (0, 0, 0)", "block-esp"));
        assert!(!owned_by("block-esp", "block-esp"));
    }
}
