use std::collections::{BTreeMap, VecDeque};

use orelight_geom::{BlockPos, ChunkPos, Vec3};
use orelight_world::Block;

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    // World notifications
    BlockChanged { pos: BlockPos, old: Block, new: Block },
    ChunkLoaded { pos: ChunkPos },

    // Frame housekeeping
    WorldRenderTick { player: ChunkPos },
    PlayerMoved { camera: Vec3 },

    SettingsChanged,
}

pub struct EventEnvelope {
    pub id: u64,
    pub tick: u64,
    pub kind: Event,
}

/// Tick-ordered event queue. Events due on the same tick fire in emission
/// order; an event whose tick has already passed fires on the next pop.
pub struct EventQueue {
    by_tick: BTreeMap<u64, VecDeque<EventEnvelope>>,
    now: u64,
    next_id: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self {
            by_tick: BTreeMap::new(),
            now: 0,
            next_id: 1,
        }
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    fn schedule(&mut self, tick: u64, kind: Event) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        log::trace!(target: "events", "emit #{} @{}: {:?}", id, tick, kind);
        self.by_tick
            .entry(tick)
            .or_default()
            .push_back(EventEnvelope { id, tick, kind });
        id
    }

    pub fn emit_now(&mut self, kind: Event) -> u64 {
        self.schedule(self.now, kind)
    }

    /// Schedules `kind` for `delay` ticks from now.
    pub fn emit_after(&mut self, delay: u64, kind: Event) -> u64 {
        self.schedule(self.now.saturating_add(delay), kind)
    }

    /// Next event due at or before the current tick, oldest tick first.
    pub fn pop_ready(&mut self) -> Option<EventEnvelope> {
        let mut slot = self.by_tick.first_entry()?;
        if *slot.key() > self.now {
            return None;
        }
        let env = slot.get_mut().pop_front();
        if slot.get().is_empty() {
            slot.remove();
        }
        env
    }

    pub fn advance_tick(&mut self) {
        self.now = self.now.wrapping_add(1);
    }

    pub fn pending(&self) -> usize {
        self.by_tick.values().map(VecDeque::len).sum()
    }

    pub fn is_scheduled(&self, kind: &Event) -> bool {
        self.by_tick.values().flatten().any(|e| &e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_fire_on_their_tick_in_fifo_order() {
        let mut q = EventQueue::new();
        q.emit_after(1, Event::SettingsChanged);
        q.emit_now(Event::ChunkLoaded {
            pos: ChunkPos::new(0, 0),
        });
        q.emit_now(Event::ChunkLoaded {
            pos: ChunkPos::new(1, 0),
        });
        assert_eq!(q.pending(), 3);

        let a = q.pop_ready().unwrap();
        let b = q.pop_ready().unwrap();
        assert!(a.id < b.id);
        assert_eq!(
            b.kind,
            Event::ChunkLoaded {
                pos: ChunkPos::new(1, 0)
            }
        );
        assert!(q.pop_ready().is_none());

        q.advance_tick();
        assert_eq!(q.pop_ready().map(|e| e.kind), Some(Event::SettingsChanged));
        assert_eq!(q.pending(), 0);
    }

    #[test]
    fn overdue_events_are_not_stranded() {
        let mut q = EventQueue::new();
        q.emit_after(2, Event::SettingsChanged);
        assert!(q.is_scheduled(&Event::SettingsChanged));
        for _ in 0..5 {
            q.advance_tick();
        }
        q.emit_now(Event::ChunkLoaded {
            pos: ChunkPos::new(3, 3),
        });

        // the older tick drains first
        assert_eq!(q.pop_ready().map(|e| e.tick), Some(2));
        assert_eq!(q.pop_ready().map(|e| e.tick), Some(5));
        assert!(q.pop_ready().is_none());
        assert!(!q.is_scheduled(&Event::SettingsChanged));
    }
}
