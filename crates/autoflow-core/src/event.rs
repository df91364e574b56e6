//! Typed automation events.
//!
//! Events are recorded during [`crate::engine::Engine::step`] and drained
//! by the embedding game — the reporting sink for faults, pauses, and
//! reload activity. The log is bounded: when full, the oldest events are
//! dropped and counted.

use crate::id::{LocationKey, Ticks};
use crate::item::ItemKey;
use crate::machine::MachineKey;
use std::collections::VecDeque;

/// An automation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A location was rescanned after a reload request.
    LocationScanned {
        location: LocationKey,
        groups: usize,
        tick: Ticks,
    },

    /// A machine raised a fault while fetching or storing output; the
    /// instance was paused and the rest of its group continued.
    MachineFaulted {
        machine: MachineKey,
        message: String,
        tick: Ticks,
    },

    /// A machine was paused until the given tick.
    MachinePaused {
        machine: MachineKey,
        until: Ticks,
        tick: Ticks,
    },

    /// Finished output was moved into group storage.
    OutputStored {
        machine: MachineKey,
        item: ItemKey,
        quantity: u32,
        tick: Ticks,
    },

    /// A machine accepted ingredients and began a new cycle.
    InputLoaded { machine: MachineKey, tick: Ticks },
}

/// Discriminant tag for event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    LocationScanned,
    MachineFaulted,
    MachinePaused,
    OutputStored,
    InputLoaded,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::LocationScanned { .. } => EventKind::LocationScanned,
            Event::MachineFaulted { .. } => EventKind::MachineFaulted,
            Event::MachinePaused { .. } => EventKind::MachinePaused,
            Event::OutputStored { .. } => EventKind::OutputStored,
            Event::InputLoaded { .. } => EventKind::InputLoaded,
        }
    }
}

/// A bounded event log. Oldest events are dropped when full.
#[derive(Debug)]
pub struct EventLog {
    events: VecDeque<Event>,
    capacity: usize,
    dropped: u64,
}

impl EventLog {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events dropped so far because the log was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Remove and return all buffered events, oldest first.
    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanned(n: usize) -> Event {
        Event::LocationScanned {
            location: LocationKey::new("farm"),
            groups: n,
            tick: 0,
        }
    }

    #[test]
    fn push_and_drain_in_order() {
        let mut log = EventLog::new(8);
        log.push(scanned(1));
        log.push(scanned(2));
        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], Event::LocationScanned { groups: 1, .. }));
        assert!(log.is_empty());
    }

    #[test]
    fn full_log_drops_oldest() {
        let mut log = EventLog::new(2);
        log.push(scanned(1));
        log.push(scanned(2));
        log.push(scanned(3));
        assert_eq!(log.len(), 2);
        assert_eq!(log.dropped(), 1);
        let drained = log.drain();
        assert!(matches!(drained[0], Event::LocationScanned { groups: 2, .. }));
    }

    #[test]
    fn event_kind_discriminant() {
        assert_eq!(scanned(0).kind(), EventKind::LocationScanned);
    }
}
