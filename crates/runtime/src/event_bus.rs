use std::collections::VecDeque;

use crate::frame::Frame;

/// Events kept before the oldest are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    PointFieldReady,
    RasterFallback,
    RouteSpawned,
    RouteRejected,
    RouteRetired,
    Suspended,
    Resumed,
    Unmounted,
}

/// Trace event with the frame it happened on.
///
/// `subject` carries the numeric id the event is about (a route id, a point
/// count), or 0 when there is none.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Event {
    pub frame_index: u64,
    pub kind: EventKind,
    pub subject: u64,
}

/// Bounded event log.
///
/// Holds at most `capacity` events; once full, each new event evicts the
/// oldest one and bumps [`EventBus::dropped`]. Readers that need every event
/// call [`EventBus::drain`] at least once per `capacity` emits.
#[derive(Debug)]
pub struct EventBus {
    events: VecDeque<Event>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
            capacity,
            dropped: 0,
        }
    }

    pub fn emit(&mut self, frame: Frame, kind: EventKind, subject: u64) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(Event {
            frame_index: frame.index,
            kind,
            subject,
        });
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> impl ExactSizeIterator<Item = &Event> + '_ {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events evicted since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, EventKind};
    use crate::frame::Frame;

    #[test]
    fn records_events_with_frame_index() {
        let mut bus = EventBus::new();
        let f = Frame::first(0.1).next(0.1).next(0.1);
        bus.emit(f, EventKind::RouteSpawned, 7);
        assert_eq!(bus.len(), 1);
        let event = bus.events().next().unwrap();
        assert_eq!(event.frame_index, 2);
        assert_eq!(event.subject, 7);
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(Frame::first(1.0), EventKind::Suspended, 0);
        bus.emit(Frame::first(1.0), EventKind::Resumed, 0);
        assert_eq!(bus.count(EventKind::Suspended), 1);
        let drained = bus.drain();
        assert_eq!(drained.len(), 2);
        assert!(bus.is_empty());
    }

    #[test]
    fn full_bus_evicts_oldest() {
        let mut bus = EventBus::with_capacity(3);
        let mut frame = Frame::first(0.016);
        for subject in 0..5 {
            bus.emit(frame, EventKind::RouteSpawned, subject);
            frame = frame.next(0.016);
        }
        assert_eq!(bus.len(), 3);
        assert_eq!(bus.dropped(), 2);
        let subjects: Vec<u64> = bus.events().map(|e| e.subject).collect();
        assert_eq!(subjects, vec![2, 3, 4]);

        bus.drain();
        bus.emit(frame, EventKind::RouteRetired, 9);
        assert_eq!(bus.len(), 1);
        assert_eq!(bus.dropped(), 2);
    }
}
