use std::collections::VecDeque;

use runtime::{Event, EventKind};
use scene::routes::RouteId;
use tracing::warn;

/// Retirements held for the host before the oldest are dropped.
pub const MAX_PENDING_RETIREMENTS: usize = 1024;

/// Route ids the host has not picked up yet.
///
/// A route that retires before its spawn was taken is cancelled out of both
/// lists, so the pending spawns never exceed the route cap. Hosts that take
/// spawns must also take retirements every frame; past
/// [`MAX_PENDING_RETIREMENTS`] the oldest retirement is dropped with a warning.
#[derive(Debug, Default)]
pub struct RouteChanges {
    spawned: Vec<RouteId>,
    retired: VecDeque<RouteId>,
}

impl RouteChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &Event) {
        let id = RouteId(event.subject);
        match event.kind {
            EventKind::RouteSpawned => self.spawned.push(id),
            EventKind::RouteRetired => {
                if let Some(pos) = self.spawned.iter().position(|s| *s == id) {
                    self.spawned.remove(pos);
                    return;
                }
                if self.retired.len() == MAX_PENDING_RETIREMENTS {
                    if let Some(lost) = self.retired.pop_front() {
                        warn!(route = lost.0, "retired route never taken by host, dropping");
                    }
                }
                self.retired.push_back(id);
            }
            _ => {}
        }
    }

    pub fn pending_spawned(&self) -> usize {
        self.spawned.len()
    }

    pub fn pending_retired(&self) -> usize {
        self.retired.len()
    }

    pub fn take_spawned(&mut self) -> Vec<RouteId> {
        std::mem::take(&mut self.spawned)
    }

    pub fn take_retired(&mut self) -> Vec<RouteId> {
        self.retired.drain(..).collect()
    }
}
