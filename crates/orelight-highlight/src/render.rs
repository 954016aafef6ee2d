use orelight_geom::{ChunkPos, Vec3};

use crate::cache::SpatialCache;
use crate::color::Color;
use crate::edge::{EDGE_ENDPOINTS, EdgeMask};

/// One line in camera-relative space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Color,
    pub alpha: f32,
}

pub type LineBatch = Vec<LineSegment>;

/// Consumer of finished line batches (GPU upload lives behind this).
pub trait LineSink {
    fn submit(&mut self, batch: &[LineSegment]);
}

impl LineSink for Vec<LineSegment> {
    fn submit(&mut self, batch: &[LineSegment]) {
        self.extend_from_slice(batch);
    }
}

/// Per-frame render inputs.
#[derive(Clone, Copy, Debug)]
pub struct RenderView {
    pub camera: Vec3,
    /// Tracer start, relative to the camera.
    pub look: Vec3,
    pub view_distance: i32,
    pub alpha: f32,
    pub structure_mode: bool,
    pub tracers: bool,
}

impl RenderView {
    pub fn new(camera: Vec3, view_distance: i32) -> Self {
        Self {
            camera,
            look: Vec3::ZERO,
            view_distance,
            alpha: 1.0,
            structure_mode: true,
            tracers: false,
        }
    }

    pub fn player_chunk(&self) -> ChunkPos {
        ChunkPos::containing(self.camera.x.floor() as i32, self.camera.z.floor() as i32)
    }
}

pub struct RenderPass;

impl RenderPass {
    /// Snapshots the in-range records into a line batch under the cache lock.
    pub fn collect(cache: &SpatialCache, view: &RenderView) -> LineBatch {
        let center = view.player_chunk();
        cache.with_lock(|state| {
            let mut out = Vec::new();
            for record in state
                .records()
                .filter(|r| r.pos.chebyshev(center) <= view.view_distance)
            {
                for block in record.blocks() {
                    let origin = Vec3::from_block(block.pos) - view.camera;
                    let mask = if view.structure_mode {
                        block.visible_edges
                    } else {
                        EdgeMask::ALL
                    };
                    for n in mask.iter() {
                        let (a, b) = EDGE_ENDPOINTS[(n - 1) as usize];
                        out.push(LineSegment {
                            start: origin + a,
                            end: origin + b,
                            color: block.color,
                            alpha: view.alpha,
                        });
                    }
                    if view.tracers {
                        out.push(LineSegment {
                            start: view.look,
                            end: origin + Vec3::HALF,
                            color: block.color,
                            alpha: view.alpha,
                        });
                    }
                }
            }
            out
        })
    }

    pub fn submit(batch: &[LineSegment], sink: &mut dyn LineSink) {
        if !batch.is_empty() {
            sink.submit(batch);
        }
    }

    /// Collects then submits; the lock is released before the sink runs.
    pub fn draw(cache: &SpatialCache, view: &RenderView, sink: &mut dyn LineSink) -> usize {
        let batch = Self::collect(cache, view);
        Self::submit(&batch, sink);
        batch.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::SpatialBlock;
    use orelight_geom::BlockPos;

    fn cache_with(blocks: &[(i32, i32, i32)]) -> SpatialCache {
        let cache = SpatialCache::new();
        cache.with_lock(|s| {
            for &(x, y, z) in blocks {
                s.update_block(true, SpatialBlock::new(BlockPos::new(x, y, z), Color::WHITE));
            }
        });
        cache
    }

    #[test]
    fn structure_mode_drops_shared_edges() {
        let cache = cache_with(&[(0, 0, 0), (1, 0, 0)]);
        let mut view = RenderView::new(Vec3::new(0.5, 0.5, 0.5), 2);
        assert_eq!(RenderPass::collect(&cache, &view).len(), 16);
        view.structure_mode = false;
        assert_eq!(RenderPass::collect(&cache, &view).len(), 24);
    }

    #[test]
    fn far_records_are_skipped_and_positions_are_camera_relative() {
        let cache = cache_with(&[(2, 3, 4), (200, 0, 0)]);
        let view = RenderView::new(Vec3::new(2.0, 3.0, 4.0), 1);
        let batch = RenderPass::collect(&cache, &view);
        assert_eq!(batch.len(), 12);
        assert!(batch.iter().all(|s| s.start.x >= 0.0 && s.start.x <= 1.0));
    }

    #[test]
    fn tracers_add_one_line_per_block() {
        let cache = cache_with(&[(0, 0, 0)]);
        let mut view = RenderView::new(Vec3::ZERO, 1);
        view.tracers = true;
        let mut sink: Vec<LineSegment> = Vec::new();
        assert_eq!(RenderPass::draw(&cache, &view, &mut sink), 13);
        assert_eq!(sink.len(), 13);
        assert_eq!(sink[12].end, Vec3::HALF);
    }
}
