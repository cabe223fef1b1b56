//! Timer-driven stepping through a timeline.

use crate::navigation::Navigator;
use crate::timer::{Schedule, Tick, TimerId, TimerKind, TimerSlot};
use std::time::Duration;

pub const MIN_INTERVAL_MS: u64 = 100;
pub const MAX_INTERVAL_MS: u64 = 2000;

#[derive(Clone, Debug)]
pub struct Autoplay {
    interval: Duration,
    repeat: bool,
    slot: TimerSlot,
}

impl Autoplay {
    /// The starting interval is taken as given, only key steps are clamped.
    pub fn new(interval_ms: u64, repeat: bool) -> Self {
        Autoplay {
            interval: Duration::from_millis(interval_ms.max(1)),
            repeat,
            slot: TimerSlot::new(TimerKind::Autoplay),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.slot.is_armed()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Applies from the next scheduled tick on. Clamped to 100..=2000 ms.
    pub fn set_interval(&mut self, interval_ms: u64) {
        self.interval = Duration::from_millis(clamp_interval(interval_ms));
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    /// Start playing. Returns None when already at the end with repeat off.
    pub fn play(&mut self, nav: &Navigator) -> Option<Schedule> {
        if nav.at_end() && !self.repeat {
            log::debug!("autoplay not started, already at the last position");
            return None;
        }
        Some(self.slot.arm(self.interval))
    }

    pub fn pause(&mut self) {
        self.slot.cancel();
    }

    /// Advance on a fired timer. Stale ids leave the cursor alone.
    pub fn on_tick(&mut self, id: TimerId, nav: &mut Navigator) -> Tick {
        if !self.slot.fire(id) {
            return Tick::IGNORED;
        }

        let changed = if nav.at_end() {
            // only reachable with repeat on, or when play() started at the end
            if self.repeat {
                nav.first()
            } else {
                false
            }
        } else {
            nav.next()
        };

        let reschedule = if nav.at_end() && !self.repeat {
            log::debug!("autoplay reached the last position");
            None
        } else {
            Some(self.slot.arm(self.interval))
        };

        Tick {
            changed,
            reschedule,
        }
    }
}

fn clamp_interval(interval_ms: u64) -> u64 {
    interval_ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deliver ticks until playback stops, returning the number delivered.
    fn run_to_completion(autoplay: &mut Autoplay, nav: &mut Navigator, first: Schedule) -> usize {
        let mut ticks = 0;
        let mut next = Some(first);
        while let Some(schedule) = next {
            ticks += 1;
            next = autoplay.on_tick(schedule.id, nav).reschedule;
            assert!(ticks <= 100, "autoplay never stopped");
        }
        ticks
    }

    #[test]
    fn test_plays_to_end_and_stops() {
        let mut nav = Navigator::new(10);
        let mut autoplay = Autoplay::new(200, false);
        let first = autoplay.play(&nav).unwrap();
        assert_eq!(first.after, Duration::from_millis(200));

        let ticks = run_to_completion(&mut autoplay, &mut nav, first);
        assert_eq!(ticks, 10);
        assert_eq!(nav.cursor(), 10);
        assert!(!autoplay.is_playing());
    }

    #[test]
    fn test_play_at_end_without_repeat() {
        let mut nav = Navigator::new(3);
        nav.jump_to(3).unwrap();
        let mut autoplay = Autoplay::new(500, false);
        assert!(autoplay.play(&nav).is_none());
        assert!(!autoplay.is_playing());
    }

    #[test]
    fn test_repeat_wraps_to_start() {
        let mut nav = Navigator::new(2);
        let mut autoplay = Autoplay::new(500, true);
        let mut schedule = autoplay.play(&nav).unwrap();
        let mut seen = Vec::new();
        for _ in 0..4 {
            let tick = autoplay.on_tick(schedule.id, &mut nav);
            assert!(tick.changed);
            seen.push(nav.cursor());
            schedule = tick.reschedule.unwrap();
        }
        assert_eq!(seen, vec![1, 2, 0, 1]);
    }

    #[test]
    fn test_pause_makes_pending_tick_stale() {
        let mut nav = Navigator::new(10);
        let mut autoplay = Autoplay::new(200, false);
        let schedule = autoplay.play(&nav).unwrap();
        autoplay.pause();
        let tick = autoplay.on_tick(schedule.id, &mut nav);
        assert_eq!(tick, Tick::IGNORED);
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn test_interval_clamped() {
        let mut autoplay = Autoplay::new(5, false);
        assert_eq!(autoplay.interval(), Duration::from_millis(5));
        autoplay.set_interval(5);
        assert_eq!(autoplay.interval(), Duration::from_millis(MIN_INTERVAL_MS));
        autoplay.set_interval(10_000);
        assert_eq!(autoplay.interval(), Duration::from_millis(MAX_INTERVAL_MS));
    }
}
