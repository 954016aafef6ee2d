use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use bitvec::vec::BitVec;
use crossbeam_channel::{Receiver, Sender, bounded};

/// Reusable buffers for one vein placement.
#[derive(Default)]
pub struct VeinScratch {
    pub visited: BitVec,
    /// `[x, y, z, radius]` per waypoint; a negative radius marks a culled waypoint.
    pub waypoints: Vec<[f64; 4]>,
}

impl VeinScratch {
    fn reset(&mut self) {
        self.visited.clear();
        self.waypoints.clear();
    }

    /// Marks `index` visited and returns whether it already was.
    pub fn visit(&mut self, index: usize) -> bool {
        let previous = if index >= self.visited.len() {
            self.visited.resize(index + 1, false);
            false
        } else {
            self.visited[index]
        };
        self.visited.set(index, true);
        previous
    }
}

/// Lock-free pool so concurrent simulations reuse their vein buffers.
pub struct ScratchPool {
    available_tx: Sender<VeinScratch>,
    available_rx: Receiver<VeinScratch>,
    allocated: AtomicUsize,
    max_buffers: usize,
}

impl ScratchPool {
    pub fn new(max_buffers: usize) -> Self {
        let max_buffers = max_buffers.max(1);
        let (tx, rx) = bounded(max_buffers);
        Self {
            available_tx: tx,
            available_rx: rx,
            allocated: AtomicUsize::new(0),
            max_buffers,
        }
    }

    /// Takes a buffer, allocating while under capacity and waiting otherwise.
    pub fn acquire(&self) -> PooledScratch<'_> {
        if let Ok(mut scratch) = self.available_rx.try_recv() {
            scratch.reset();
            return PooledScratch {
                scratch,
                pool: self,
            };
        }
        loop {
            let current = self.allocated.load(Ordering::Acquire);
            if current < self.max_buffers {
                let prev = self.allocated.fetch_add(1, Ordering::AcqRel);
                if prev < self.max_buffers {
                    return PooledScratch {
                        scratch: VeinScratch::default(),
                        pool: self,
                    };
                }
                self.allocated.fetch_sub(1, Ordering::AcqRel);
            }
            if let Ok(mut scratch) = self.available_rx.recv() {
                scratch.reset();
                return PooledScratch {
                    scratch,
                    pool: self,
                };
            }
        }
    }

    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    fn release(&self, scratch: VeinScratch) {
        let _ = self.available_tx.send(scratch);
    }
}

pub struct PooledScratch<'pool> {
    scratch: VeinScratch,
    pool: &'pool ScratchPool,
}

impl Deref for PooledScratch<'_> {
    type Target = VeinScratch;

    fn deref(&self) -> &Self::Target {
        &self.scratch
    }
}

impl DerefMut for PooledScratch<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.scratch
    }
}

impl Drop for PooledScratch<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.scratch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_buffers_are_reused_and_reset() {
        let pool = ScratchPool::new(1);
        {
            let mut s = pool.acquire();
            assert!(!s.visit(40));
            assert!(s.visit(40));
            s.waypoints.push([0.0; 4]);
        }
        let s = pool.acquire();
        assert_eq!(pool.allocated(), 1);
        assert!(s.visited.is_empty() && s.waypoints.is_empty());
    }
}
