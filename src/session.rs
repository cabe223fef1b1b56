//! An interactive viewing session over one timeline.
//!
//! The session is the only place where navigation, autoplay and the attack
//! overlay meet. Hosts feed it [`Event`]s (or call the `on_*` handlers
//! directly), arm the timers listed in each [`Response`], and draw
//! [`HeatmapSession::frame`] whenever `redraw` is set.

use crate::attacks::{attack_rays, wave_highlights, AttackRay, Highlight, RayColor, RayPulse};
use crate::autoplay::Autoplay;
use crate::config::HeatmapConfig;
use crate::error::OutOfRangeError;
use crate::navigation::Navigator;
use crate::render::{CellLabel, HeatmapFrame};
use crate::snapshot::{square_to_cell, Occupancy};
use crate::timeline::{Timeline, TimelineEntry};
use crate::timer::{Schedule, TimerId, TimerKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Next,
    Previous,
    Jump(usize),
    First,
    Last,
    TogglePlay,
    ToggleRepeat,
    ToggleRays,
    TogglePieces,
    SetInterval(u64),
    CycleRayColor,
    TimerTick(TimerId),
}

/// What the host has to do after an event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use = "timers in the response have to be armed by the host"]
pub struct Response {
    pub redraw: bool,
    /// Timers to arm. Earlier timers of the same kind are stale from now on.
    pub schedule: Vec<Schedule>,
}

impl Response {
    fn redraw() -> Self {
        Response {
            redraw: true,
            schedule: Vec::new(),
        }
    }

    fn unchanged() -> Self {
        Response::default()
    }
}

pub struct HeatmapSession {
    timeline: Timeline,
    nav: Navigator,
    autoplay: Autoplay,
    pulse: RayPulse,
    rays: Vec<AttackRay>,
    show_rays: bool,
    show_pieces: bool,
    ray_color: RayColor,
    scale_max: u8,
}

impl HeatmapSession {
    /// Session positioned at `config.start_move`.
    pub fn new(timeline: Timeline, config: &HeatmapConfig) -> Result<Self, OutOfRangeError> {
        let mut nav = Navigator::new(timeline.last_index());
        nav.jump_to(config.start_move)?;
        let rays = attack_rays(&timeline.entries()[nav.cursor()].position);
        Ok(HeatmapSession {
            timeline,
            nav,
            autoplay: Autoplay::new(config.interval_ms, config.repeat),
            pulse: RayPulse::default(),
            rays,
            show_rays: config.show_rays,
            show_pieces: config.show_pieces,
            ray_color: config.ray_color,
            scale_max: config.piece_values.max(),
        })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn cursor(&self) -> usize {
        self.nav.cursor()
    }

    pub fn current(&self) -> &TimelineEntry {
        &self.timeline.entries()[self.nav.cursor()]
    }

    pub fn is_playing(&self) -> bool {
        self.autoplay.is_playing()
    }

    pub fn autoplay(&self) -> &Autoplay {
        &self.autoplay
    }

    pub fn show_rays(&self) -> bool {
        self.show_rays
    }

    pub fn show_pieces(&self) -> bool {
        self.show_pieces
    }

    pub fn ray_color(&self) -> RayColor {
        self.ray_color
    }

    /// Attack rays of the current position.
    pub fn rays(&self) -> &[AttackRay] {
        &self.rays
    }

    /// Arm the timers for the first draw: the overlay pulse, and autoplay when it
    /// was switched on before the host started.
    pub fn start(&mut self) -> Response {
        let mut schedule: Vec<Schedule> = self.restart_pulse().into_iter().collect();
        if self.autoplay.is_playing() {
            match self.autoplay.play(&self.nav) {
                Some(next) => schedule.push(next),
                None => self.autoplay.pause(),
            }
        }
        Response {
            redraw: true,
            schedule,
        }
    }

    /// Cancel every timer. Ticks delivered after this are ignored.
    pub fn close(&mut self) {
        self.autoplay.pause();
        self.pulse.stop();
        log::debug!("session closed at position {}", self.nav.cursor());
    }

    pub fn handle(&mut self, event: Event) -> Result<Response, OutOfRangeError> {
        let response = match event {
            Event::Next => self.on_next(),
            Event::Previous => self.on_previous(),
            Event::Jump(index) => self.on_jump(index)?,
            Event::First => self.on_first(),
            Event::Last => self.on_last(),
            Event::TogglePlay => self.on_toggle_play(),
            Event::ToggleRepeat => self.on_toggle_repeat(),
            Event::ToggleRays => self.on_toggle_rays(),
            Event::TogglePieces => self.on_toggle_pieces(),
            Event::SetInterval(ms) => self.on_set_interval(ms),
            Event::CycleRayColor => self.on_cycle_ray_color(),
            Event::TimerTick(id) => self.on_timer_tick(id),
        };
        Ok(response)
    }

    // Manual navigation always pauses autoplay.

    pub fn on_next(&mut self) -> Response {
        self.autoplay.pause();
        let moved = self.nav.next();
        self.after_navigation(moved)
    }

    pub fn on_previous(&mut self) -> Response {
        self.autoplay.pause();
        let moved = self.nav.previous();
        self.after_navigation(moved)
    }

    pub fn on_jump(&mut self, index: usize) -> Result<Response, OutOfRangeError> {
        let before = self.nav.cursor();
        self.nav.jump_to(index)?;
        self.autoplay.pause();
        Ok(self.after_navigation(before != index))
    }

    pub fn on_first(&mut self) -> Response {
        self.autoplay.pause();
        let moved = self.nav.first();
        self.after_navigation(moved)
    }

    pub fn on_last(&mut self) -> Response {
        self.autoplay.pause();
        let moved = self.nav.last_position();
        self.after_navigation(moved)
    }

    pub fn on_toggle_play(&mut self) -> Response {
        if self.autoplay.is_playing() {
            self.autoplay.pause();
            return Response::redraw();
        }
        match self.autoplay.play(&self.nav) {
            Some(schedule) => Response {
                redraw: true,
                schedule: vec![schedule],
            },
            None => Response::unchanged(),
        }
    }

    pub fn on_toggle_repeat(&mut self) -> Response {
        self.autoplay.set_repeat(!self.autoplay.repeat());
        Response::redraw()
    }

    pub fn on_toggle_rays(&mut self) -> Response {
        self.show_rays = !self.show_rays;
        if !self.show_rays {
            self.pulse.stop();
            return Response::redraw();
        }
        Response {
            redraw: true,
            schedule: self.restart_pulse().into_iter().collect(),
        }
    }

    pub fn on_toggle_pieces(&mut self) -> Response {
        self.show_pieces = !self.show_pieces;
        Response::redraw()
    }

    /// Takes effect on the next autoplay tick.
    pub fn on_set_interval(&mut self, interval_ms: u64) -> Response {
        self.autoplay.set_interval(interval_ms);
        Response::redraw()
    }

    pub fn on_cycle_ray_color(&mut self) -> Response {
        self.ray_color = self.ray_color.cycle();
        Response::redraw()
    }

    pub fn on_timer_tick(&mut self, id: TimerId) -> Response {
        match id.kind() {
            TimerKind::Autoplay => {
                let tick = self.autoplay.on_tick(id, &mut self.nav);
                let mut response = if tick.changed {
                    self.after_navigation(true)
                } else {
                    Response::unchanged()
                };
                response.schedule.extend(tick.reschedule);
                response
            }
            TimerKind::RayPulse => {
                let tick = self.pulse.on_tick(id);
                Response {
                    redraw: tick.changed,
                    schedule: tick.reschedule.into_iter().collect(),
                }
            }
        }
    }

    fn after_navigation(&mut self, moved: bool) -> Response {
        if !moved {
            return Response::unchanged();
        }
        self.rays = attack_rays(&self.current().position);
        Response {
            redraw: true,
            schedule: self.restart_pulse().into_iter().collect(),
        }
    }

    fn restart_pulse(&mut self) -> Option<Schedule> {
        if self.show_rays && !self.rays.is_empty() {
            Some(self.pulse.start())
        } else {
            self.pulse.stop();
            None
        }
    }

    /// Window title for the current position.
    pub fn title(&self) -> String {
        self.title_at(self.nav.cursor())
    }

    fn title_at(&self, index: usize) -> String {
        let entry = &self.timeline.entries()[index];
        let mut title = format!(
            "Chess Board Heatmap - {} ({}/{})",
            entry.description,
            index + 1,
            self.timeline.len()
        );
        if let Some(played) = &entry.played {
            let notes = played.annotations.to_string();
            if !notes.is_empty() {
                title.push_str(&format!(" [{}]", notes));
            }
        }
        title
    }

    /// Frame for the current position with the live pulse overlay.
    pub fn frame(&self) -> HeatmapFrame {
        let highlights = if self.show_rays && self.pulse.is_active() {
            wave_highlights(&self.rays, self.pulse.phase())
        } else {
            Vec::new()
        };
        self.build_frame(self.nav.cursor(), highlights)
    }

    /// Frame for any position at a fixed wave phase, for offline rendering.
    /// The cursor is left where it is.
    pub fn frame_at(&self, index: usize, phase: Option<f32>) -> Result<HeatmapFrame, OutOfRangeError> {
        let entry = self.timeline.get(index).ok_or(OutOfRangeError {
            index,
            last: self.timeline.last_index(),
        })?;
        let highlights = match phase {
            Some(phase) if self.show_rays => wave_highlights(&attack_rays(&entry.position), phase),
            _ => Vec::new(),
        };
        Ok(self.build_frame(index, highlights))
    }

    fn build_frame(&self, index: usize, highlights: Vec<Highlight>) -> HeatmapFrame {
        let entry = &self.timeline.entries()[index];
        let mut labels = [[CellLabel::Empty; 8]; 8];
        if self.show_pieces {
            for (sq, piece) in Occupancy::occupied(&entry.position) {
                let (row, col) = square_to_cell(sq);
                labels[row][col] = CellLabel::Piece(piece);
            }
        } else {
            for (row, values) in entry.snapshot.rows().iter().enumerate() {
                for (col, &value) in values.iter().enumerate() {
                    labels[row][col] = CellLabel::Value(value);
                }
            }
        }

        HeatmapFrame {
            title: self.title_at(index),
            snapshot: entry.snapshot,
            labels,
            highlights,
            highlight_color: self.ray_color.rgb(),
            scale_max: self.scale_max,
        }
    }
}

#[cfg(test)]
#[allow(unused_must_use)]
mod tests {
    use super::*;
    use crate::parse_game_str;
    use crate::snapshot::PieceValues;
    use crate::timeline::TimelineBuilder;

    const TEN_PLIES: &str = "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7 *";

    fn session_with(pgn: &str, config: HeatmapConfig) -> HeatmapSession {
        let game = parse_game_str(pgn).unwrap();
        let timeline = TimelineBuilder::new(PieceValues::default())
            .build(&game)
            .unwrap();
        HeatmapSession::new(timeline, &config).unwrap()
    }

    fn session(pgn: &str) -> HeatmapSession {
        session_with(pgn, HeatmapConfig::default())
    }

    fn autoplay_schedule(response: &Response) -> Option<Schedule> {
        response
            .schedule
            .iter()
            .copied()
            .find(|s| s.id.kind() == TimerKind::Autoplay)
    }

    #[test]
    fn test_start_move_out_of_range() {
        let game = parse_game_str(TEN_PLIES).unwrap();
        let timeline = TimelineBuilder::default().build(&game).unwrap();
        let config = HeatmapConfig {
            start_move: 11,
            ..HeatmapConfig::default()
        };
        let err = HeatmapSession::new(timeline, &config).err().unwrap();
        assert_eq!(err, OutOfRangeError { index: 11, last: 10 });
    }

    #[test]
    fn test_manual_navigation() {
        let mut s = session(TEN_PLIES);
        assert_eq!(s.cursor(), 0);
        assert!(!s.on_previous().redraw);
        assert!(s.on_next().redraw);
        assert!(s.on_next().redraw);
        assert!(s.on_previous().redraw);
        assert_eq!(s.cursor(), 1);

        assert!(s.on_last().redraw);
        assert_eq!(s.cursor(), 10);
        assert!(!s.on_next().redraw);
        assert_eq!(s.cursor(), 10);

        assert!(s.on_first().redraw);
        assert_eq!(s.cursor(), 0);
    }

    #[test]
    fn test_jump() {
        let mut s = session(TEN_PLIES);
        assert!(s.on_jump(7).unwrap().redraw);
        assert_eq!(s.cursor(), 7);
        assert_eq!(s.on_jump(11), Err(OutOfRangeError { index: 11, last: 10 }));
        assert_eq!(s.cursor(), 7);
        assert!(s.handle(Event::Jump(99)).is_err());
        assert_eq!(s.current().ply, 7);
    }

    #[test]
    fn test_autoplay_reaches_end_and_stops() {
        let mut s = session(TEN_PLIES);
        let response = s.on_toggle_play();
        let mut next = autoplay_schedule(&response);
        let mut ticks = 0;
        while let Some(schedule) = next {
            let response = s.on_timer_tick(schedule.id);
            next = autoplay_schedule(&response);
            ticks += 1;
            assert!(ticks <= 20);
        }
        assert_eq!(ticks, 10);
        assert_eq!(s.cursor(), 10);
        assert!(!s.is_playing());
    }

    #[test]
    fn test_pause_then_previous_stays_paused() {
        let mut s = session(TEN_PLIES);
        let mut schedule = autoplay_schedule(&s.on_toggle_play()).unwrap();
        for _ in 0..5 {
            schedule = autoplay_schedule(&s.on_timer_tick(schedule.id)).unwrap();
        }
        assert_eq!(s.cursor(), 5);

        s.on_toggle_play();
        assert!(!s.is_playing());
        s.on_previous();
        assert_eq!(s.cursor(), 4);
        assert!(!s.is_playing());

        // the tick that was pending when we paused must not move the cursor
        let response = s.on_timer_tick(schedule.id);
        assert_eq!(response, Response::unchanged());
        assert_eq!(s.cursor(), 4);
    }

    #[test]
    fn test_manual_step_pauses_autoplay() {
        let mut s = session(TEN_PLIES);
        let schedule = autoplay_schedule(&s.on_toggle_play()).unwrap();
        s.on_next();
        assert!(!s.is_playing());
        s.on_timer_tick(schedule.id);
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn test_play_at_end_is_noop_without_repeat() {
        let mut s = session(TEN_PLIES);
        s.on_last();
        let response = s.on_toggle_play();
        assert!(response.schedule.is_empty());
        assert!(!s.is_playing());

        s.on_toggle_repeat();
        let schedule = autoplay_schedule(&s.on_toggle_play()).unwrap();
        s.on_timer_tick(schedule.id);
        assert_eq!(s.cursor(), 0);
        assert!(s.is_playing());
    }

    #[test]
    fn test_title() {
        let mut s = session("1. e4 { [%eval 0.17] } e5 1-0");
        assert_eq!(s.title(), "Chess Board Heatmap - Initial Position (1/3)");
        s.on_next();
        assert_eq!(s.title(), "Chess Board Heatmap - Move 1: e2e4 (2/3) [eval +0.17]");
        s.on_next();
        assert_eq!(s.title(), "Chess Board Heatmap - Move 2: e7e5 (3/3)");
    }

    #[test]
    fn test_frame_labels() {
        let mut s = session(TEN_PLIES);
        let frame = s.frame();
        assert!(matches!(frame.labels[0][4], CellLabel::Piece(p) if p.role == shakmaty::Role::King));
        assert_eq!(frame.labels[4][4], CellLabel::Empty);
        assert_eq!(frame.scale_max, 10);

        s.on_toggle_pieces();
        let frame = s.frame();
        assert_eq!(frame.labels[0][3], CellLabel::Value(10));
        assert_eq!(frame.labels[4][4], CellLabel::Value(0));
    }

    #[test]
    fn test_rays_pulse_after_capture_becomes_available() {
        // after 1. e4 d5 white can take on d5
        let mut s = session("1. e4 d5 2. exd5 *");
        assert!(s.start().schedule.is_empty());
        s.on_next();
        let response = s.on_next();
        assert_eq!(s.rays().len(), 1);
        let pulse = response
            .schedule
            .iter()
            .find(|sch| sch.id.kind() == TimerKind::RayPulse)
            .copied()
            .unwrap();

        let response = s.on_timer_tick(pulse.id);
        assert!(response.redraw);
        assert!(!s.frame().highlights.is_empty());

        s.on_toggle_rays();
        assert!(s.frame().highlights.is_empty());
        assert!(!s.on_timer_tick(pulse.id).redraw);
    }

    #[test]
    fn test_frame_at_fixed_phase() {
        let s = session("1. e4 d5 2. exd5 *");
        let frame = s.frame_at(2, Some(0.25)).unwrap();
        // the wave crest sits on the attacking pawn at a quarter period
        assert!(frame.highlights.iter().any(|h| h.cell == (4, 4)));
        assert!(s.frame_at(2, None).unwrap().highlights.is_empty());
        assert!(s.frame_at(4, None).is_err());
        assert_eq!(s.cursor(), 0);
    }

    #[test]
    fn test_play_before_start_arms_autoplay() {
        let mut s = session(TEN_PLIES);
        s.on_toggle_play();
        assert!(s.is_playing());

        let start = s.start();
        let schedule = autoplay_schedule(&start).unwrap();
        assert_eq!(schedule.after, s.autoplay().interval());

        let response = s.on_timer_tick(schedule.id);
        assert!(response.redraw);
        assert_eq!(s.cursor(), 1);
        assert!(autoplay_schedule(&response).is_some());
    }

    #[test]
    fn test_configured_interval_outside_key_range() {
        let config = HeatmapConfig {
            interval_ms: 50,
            ..HeatmapConfig::default()
        };
        let mut s = session_with(TEN_PLIES, config);
        let schedule = autoplay_schedule(&s.on_toggle_play()).unwrap();
        assert_eq!(schedule.after, std::time::Duration::from_millis(50));
    }

    #[test]
    fn test_start_without_play_has_no_autoplay_timer() {
        let mut s = session(TEN_PLIES);
        assert!(autoplay_schedule(&s.start()).is_none());
        assert!(!s.is_playing());
    }

    #[test]
    fn test_close_invalidates_timers() {
        let mut s = session(TEN_PLIES);
        let schedule = autoplay_schedule(&s.on_toggle_play()).unwrap();
        s.close();
        assert!(!s.on_timer_tick(schedule.id).redraw);
        assert_eq!(s.cursor(), 0);
    }
}
