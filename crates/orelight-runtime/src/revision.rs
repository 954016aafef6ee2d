use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use hashbrown::HashMap;
use orelight_geom::ChunkPos;

/// Latest submission per chunk. Revisions come from one global counter, so a
/// forgotten-then-resubmitted chunk never reuses an old number.
#[derive(Default)]
pub struct Revisions {
    next: AtomicU64,
    latest: Mutex<HashMap<ChunkPos, u64>>,
}

impl Revisions {
    pub fn bump(&self, pos: ChunkPos) -> u64 {
        let rev = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.insert(pos, rev);
        rev
    }

    pub fn current(&self, pos: ChunkPos) -> Option<u64> {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.get(&pos).copied()
    }

    pub fn is_current(&self, pos: ChunkPos, rev: u64) -> bool {
        self.current(pos) == Some(rev)
    }

    /// Invalidates every outstanding job for chunks failing `keep`.
    pub fn retain(&self, mut keep: impl FnMut(ChunkPos) -> bool) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.retain(|pos, _| keep(*pos));
    }

    pub fn clear(&self) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.clear();
    }

    pub fn len(&self) -> usize {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handed to a chunk job; tells it whether a newer submission replaced it.
#[derive(Clone)]
pub struct JobTicket {
    pub chunk: ChunkPos,
    pub rev: u64,
    revisions: Arc<Revisions>,
}

impl JobTicket {
    pub(crate) fn new(chunk: ChunkPos, rev: u64, revisions: Arc<Revisions>) -> Self {
        Self {
            chunk,
            rev,
            revisions,
        }
    }

    pub fn is_current(&self) -> bool {
        self.revisions.is_current(self.chunk, self.rev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_bump_supersedes_and_forgetting_never_revives() {
        let revs = Arc::new(Revisions::default());
        let c = ChunkPos::new(3, 4);
        let first = JobTicket::new(c, revs.bump(c), Arc::clone(&revs));
        assert!(first.is_current());
        let second = JobTicket::new(c, revs.bump(c), Arc::clone(&revs));
        assert!(!first.is_current());
        assert!(second.is_current());
        revs.retain(|_| false);
        assert!(!second.is_current());
        let third = revs.bump(c);
        assert!(third > second.rev);
        assert!(!first.is_current() && !second.is_current());
    }
}
