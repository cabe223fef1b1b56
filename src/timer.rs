//! Cancellable timer handles.
//!
//! The host owns the actual clock. Arming a slot hands out a [`TimerId`] the
//! host must pass back when the timer fires; any id issued before the last
//! `arm` or `cancel` is stale and fires nothing.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Autoplay,
    RayPulse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId {
    kind: TimerKind,
    generation: u64,
}

impl TimerId {
    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

/// Request to the host: deliver `id` back after `after` has elapsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub id: TimerId,
    pub after: Duration,
}

/// Result of delivering a timer tick to its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Whether anything visible changed.
    pub changed: bool,
    /// Next tick to deliver, None once the owner has stopped.
    pub reschedule: Option<Schedule>,
}

impl Tick {
    pub const IGNORED: Tick = Tick {
        changed: false,
        reschedule: None,
    };
}

#[derive(Clone, Debug)]
pub struct TimerSlot {
    kind: TimerKind,
    generation: u64,
    armed: bool,
}

impl TimerSlot {
    pub fn new(kind: TimerKind) -> Self {
        TimerSlot {
            kind,
            generation: 0,
            armed: false,
        }
    }

    /// Arm the slot, invalidating any earlier id.
    pub fn arm(&mut self, after: Duration) -> Schedule {
        self.generation += 1;
        self.armed = true;
        Schedule {
            id: TimerId {
                kind: self.kind,
                generation: self.generation,
            },
            after,
        }
    }

    pub fn cancel(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Consume a fired id. Returns false for stale or foreign ids.
    pub fn fire(&mut self, id: TimerId) -> bool {
        let current = self.armed && id.kind == self.kind && id.generation == self.generation;
        if current {
            self.armed = false;
        } else {
            log::trace!("ignoring stale timer {:?}", id);
        }
        current
    }
}
