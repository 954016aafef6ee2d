use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use hashbrown::HashMap;
use orelight_geom::{BlockPos, ChunkKey, ChunkPos, Direction};

use crate::block::SpatialBlock;
use crate::chunk::ChunkRecord;
use crate::edge::EdgeMask;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub commits: u64,
    pub block_updates: u64,
    pub evictions: u64,
    pub chunks: usize,
    pub blocks: usize,
}

#[derive(Default)]
struct Counters {
    commits: AtomicU64,
    block_updates: AtomicU64,
    evictions: AtomicU64,
}

/// Chunk-keyed highlight map. Every access goes through [`SpatialCache::with_lock`].
pub struct SpatialCache {
    state: Mutex<CacheState>,
    counters: Arc<Counters>,
}

impl Default for SpatialCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialCache {
    pub fn new() -> Self {
        let counters = Arc::new(Counters::default());
        Self {
            state: Mutex::new(CacheState {
                chunks: HashMap::new(),
                counters: Arc::clone(&counters),
            }),
            counters,
        }
    }

    /// Runs `f` inside the cache's critical section.
    ///
    /// A panic inside an earlier critical section poisons the mutex; the state is
    /// still structurally valid (every mutation keeps the no-empty-record
    /// invariant step by step), so the poison is cleared and work continues.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut CacheState) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("spatial cache lock poisoned; recovering");
                self.state.clear_poison();
                poisoned.into_inner()
            }
        };
        f(&mut guard)
    }

    pub fn stats(&self) -> CacheStats {
        let (chunks, blocks) = self.with_lock(|s| (s.len(), s.block_count()));
        CacheStats {
            commits: self.counters.commits.load(Ordering::Relaxed),
            block_updates: self.counters.block_updates.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            chunks,
            blocks,
        }
    }
}

/// The locked contents of a [`SpatialCache`].
pub struct CacheState {
    chunks: HashMap<ChunkKey, ChunkRecord>,
    counters: Arc<Counters>,
}

impl CacheState {
    /// Replaces the chunk's record (or drops it when empty), then refreshes the 3x3 area.
    pub fn commit_chunk(&mut self, record: ChunkRecord) {
        let pos = record.pos;
        if record.has_blocks() {
            self.chunks.insert(pos.key(), record);
        } else {
            self.chunks.remove(&pos.key());
        }
        self.counters.commits.fetch_add(1, Ordering::Relaxed);
        self.refresh_around(pos);
    }

    /// Adds or removes one block. Returns whether membership changed.
    pub fn update_block(&mut self, added: bool, block: SpatialBlock) -> bool {
        let cpos = block.pos.chunk_pos();
        let key = cpos.key();
        let changed = if added {
            let record = self
                .chunks
                .entry(key)
                .or_insert_with(|| ChunkRecord::new(cpos));
            let fresh = !record.contains(block.pos);
            record.add_block(block);
            fresh
        } else {
            let mut removed = false;
            if let Some(record) = self.chunks.get_mut(&key) {
                removed = record.remove_block(block.pos).is_some();
                if record.is_empty() {
                    self.chunks.remove(&key);
                }
            }
            removed
        };
        self.counters.block_updates.fetch_add(1, Ordering::Relaxed);
        self.refresh_block_area(block.pos);
        self.refresh_around(cpos);
        changed
    }

    /// Drops every record farther than `radius` chunks (Chebyshev) from `center`.
    pub fn evict_outside(&mut self, center: ChunkPos, radius: i32) -> usize {
        let evicted: Vec<ChunkPos> = self
            .chunks
            .values()
            .filter(|r| r.pos.chebyshev(center) > radius)
            .map(|r| r.pos)
            .collect();
        for pos in &evicted {
            self.chunks.remove(&pos.key());
        }
        // survivors bordering an evicted chunk may now show edges toward it
        for pos in &evicted {
            self.refresh_around(*pos);
        }
        if !evicted.is_empty() {
            self.counters
                .evictions
                .fetch_add(evicted.len() as u64, Ordering::Relaxed);
            log::debug!(
                "evicted {} chunk records outside radius {} of {:?}",
                evicted.len(),
                radius,
                center
            );
        }
        evicted.len()
    }

    /// Recomputes edge masks for every block in the 3x3 chunks around `center`.
    pub fn refresh_around(&mut self, center: ChunkPos) {
        for pos in center.range_closed(1) {
            let updates: Vec<(BlockPos, EdgeMask)> = match self.chunks.get(&pos.key()) {
                Some(record) => record.blocks().map(|b| self.recomputed(b)).collect(),
                None => continue,
            };
            self.apply(&updates);
        }
    }

    /// Recomputes the block at `pos` and its six face neighbours.
    fn refresh_block_area(&mut self, pos: BlockPos) {
        let updates: Vec<(BlockPos, EdgeMask)> = std::iter::once(pos)
            .chain(Direction::ALL.iter().map(|d| pos.neighbor(*d)))
            .filter_map(|p| self.block(p).map(|b| self.recomputed(b)))
            .collect();
        self.apply(&updates);
    }

    fn recomputed(&self, block: &SpatialBlock) -> (BlockPos, EdgeMask) {
        let mut b = *block;
        b.refresh_edges(|p| self.contains_block(p));
        (b.pos, b.visible_edges)
    }

    fn apply(&mut self, updates: &[(BlockPos, EdgeMask)]) {
        for (pos, mask) in updates {
            if let Some(b) = self
                .chunks
                .get_mut(&pos.chunk_pos().key())
                .and_then(|r| r.get_mut(*pos))
            {
                b.visible_edges = *mask;
            }
        }
    }

    pub fn contains_block(&self, pos: BlockPos) -> bool {
        self.chunks
            .get(&pos.chunk_pos().key())
            .is_some_and(|r| r.contains(pos))
    }

    pub fn block(&self, pos: BlockPos) -> Option<&SpatialBlock> {
        self.chunks.get(&pos.chunk_pos().key())?.get(pos)
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&ChunkRecord> {
        self.chunks.get(&pos.key())
    }

    pub fn contains_chunk(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos.key())
    }

    pub fn records(&self) -> impl Iterator<Item = &ChunkRecord> {
        self.chunks.values()
    }

    /// Removes everything; returns the number of records dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.chunks.len();
        self.chunks.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.chunks.values().map(|r| r.len()).sum()
    }
}
