//! Attack overlay: legal captures of the side to move, drawn as waves
//! traveling from the attacker to its target.

use crate::snapshot::square_to_cell;
use crate::timer::{Schedule, Tick, TimerId, TimerKind, TimerSlot};
use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Move, Position};
use std::f32::consts::TAU;
use std::time::Duration;

/// Board cell in display orientation, `(row, col)` with row 0 = rank 8.
pub type Cell = (usize, usize);

/// Phase advance per pulse tick, in hundredths of a period.
pub const PULSE_STEP: u32 = 15;
pub const PULSE_INTERVAL_MS: u64 = 50;
/// Pulses shown after each position change before the overlay clears.
pub const MAX_PULSES: u32 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RayColor {
    #[default]
    Red,
    Blue,
    Green,
    Yellow,
    Magenta,
    Cyan,
}

impl RayColor {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            RayColor::Red => [255, 0, 0],
            RayColor::Blue => [0, 0, 255],
            RayColor::Green => [0, 255, 0],
            RayColor::Yellow => [255, 255, 0],
            RayColor::Magenta => [255, 0, 255],
            RayColor::Cyan => [0, 255, 255],
        }
    }

    /// Next color in menu order, wrapping around.
    pub fn cycle(self) -> Self {
        match self {
            RayColor::Red => RayColor::Blue,
            RayColor::Blue => RayColor::Green,
            RayColor::Green => RayColor::Yellow,
            RayColor::Yellow => RayColor::Magenta,
            RayColor::Magenta => RayColor::Cyan,
            RayColor::Cyan => RayColor::Red,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackRay {
    pub from: Cell,
    pub to: Cell,
}

/// A translucent square drawn over the heatmap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Highlight {
    pub cell: Cell,
    pub alpha: f32,
}

/// Every legal capture available to the side to move.
///
/// En passant is left out: its target square is empty.
pub fn attack_rays(pos: &Chess) -> Vec<AttackRay> {
    let mut rays: Vec<AttackRay> = Vec::new();
    for m in pos.legal_moves() {
        if let Move::Normal {
            from,
            to,
            capture: Some(_),
            ..
        } = m
        {
            let ray = AttackRay {
                from: square_to_cell(from),
                to: square_to_cell(to),
            };
            // capture-promotions yield one move per promoted role
            if !rays.contains(&ray) {
                rays.push(ray);
            }
        }
    }
    rays
}

/// Cells on the straight line from `from` to `to`, both ends included.
/// Knight jumps yield the two ends and one rounded midpoint.
pub fn path_cells(from: Cell, to: Cell) -> Vec<Cell> {
    let (from_row, from_col) = (from.0 as i32, from.1 as i32);
    let delta_row = to.0 as i32 - from_row;
    let delta_col = to.1 as i32 - from_col;
    let steps = delta_row.abs().max(delta_col.abs());
    if steps == 0 {
        return vec![from];
    }

    (0..=steps)
        .map(|i| {
            let row = from_row + (delta_row * i).div_euclid(steps);
            let col = from_col + (delta_col * i).div_euclid(steps);
            (row as usize, col as usize)
        })
        .collect()
}

/// Opacity of the wave at `index` along a path of `len` cells, None when the
/// cell is between crests.
pub fn wave_alpha(index: usize, len: usize, phase: f32) -> Option<f32> {
    let delay = index as f32 / len.max(1) as f32;
    let offset = (phase - delay).rem_euclid(1.0);
    let intensity = 0.3 + 0.5 * (offset * TAU).sin();
    (intensity > 0.35).then_some(intensity * 0.6)
}

/// Highlights for all rays at the given wave phase.
pub fn wave_highlights(rays: &[AttackRay], phase: f32) -> Vec<Highlight> {
    let mut highlights = Vec::new();
    for ray in rays {
        let path = path_cells(ray.from, ray.to);
        for (i, &cell) in path.iter().enumerate() {
            if let Some(alpha) = wave_alpha(i, path.len(), phase) {
                highlights.push(Highlight { cell, alpha });
            }
        }
    }
    highlights
}

/// A few wave pulses played after every position change.
#[derive(Clone, Debug)]
pub struct RayPulse {
    steps: u32,
    slot: TimerSlot,
}

impl Default for RayPulse {
    fn default() -> Self {
        RayPulse {
            steps: 0,
            slot: TimerSlot::new(TimerKind::RayPulse),
        }
    }
}

impl RayPulse {
    /// Restart the pulse sequence from phase 0.
    pub fn start(&mut self) -> Schedule {
        self.steps = 0;
        self.slot.arm(Duration::from_millis(PULSE_INTERVAL_MS))
    }

    pub fn stop(&mut self) {
        self.slot.cancel();
    }

    /// Waves are only drawn while pulsing.
    pub fn is_active(&self) -> bool {
        self.slot.is_armed()
    }

    pub fn phase(&self) -> f32 {
        ((self.steps * PULSE_STEP) % 100) as f32 / 100.0
    }

    /// Completed pulses, one per wrap of the phase.
    pub fn pulses(&self) -> u32 {
        self.steps * PULSE_STEP / 100
    }

    pub fn on_tick(&mut self, id: TimerId) -> Tick {
        if !self.slot.fire(id) {
            return Tick::IGNORED;
        }

        self.steps += 1;
        let reschedule = (self.pulses() < MAX_PULSES)
            .then(|| self.slot.arm(Duration::from_millis(PULSE_INTERVAL_MS)));
        Tick {
            changed: true,
            reschedule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen;
    use shakmaty::CastlingMode;

    fn position(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap()
    }

    #[test]
    fn test_no_captures_at_start() {
        assert!(attack_rays(&Chess::default()).is_empty());
    }

    #[test]
    fn test_pawn_capture() {
        let pos = position("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        let rays = attack_rays(&pos);
        // e4xd5 and nothing else
        assert_eq!(
            rays,
            vec![AttackRay {
                from: (4, 4),
                to: (3, 3)
            }]
        );
    }

    #[test]
    fn test_blocked_rook() {
        let open = position("r3k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert!(attack_rays(&open).contains(&AttackRay {
            from: (7, 0),
            to: (0, 0)
        }));

        let blocked = position("r3k3/8/8/p7/8/8/8/R3K3 w - - 0 1");
        let rays = attack_rays(&blocked);
        assert!(rays.contains(&AttackRay {
            from: (7, 0),
            to: (3, 0)
        }));
        assert!(rays.iter().all(|ray| ray.to != (0, 0)));
    }

    #[test]
    fn test_knight_jumps() {
        // b3 jumps over its own pawn on b4 to take c5
        let pos = position("4k3/8/8/2p5/1P6/1N6/8/4K3 w - - 0 1");
        let rays = attack_rays(&pos);
        assert_eq!(rays.len(), 2);
        assert!(rays.contains(&AttackRay {
            from: (5, 1),
            to: (3, 2)
        }));
        // bxc5
        assert!(rays.contains(&AttackRay {
            from: (4, 1),
            to: (3, 2)
        }));
    }

    #[test]
    fn test_path_cells() {
        assert_eq!(path_cells((7, 0), (3, 0)), vec![(7, 0), (6, 0), (5, 0), (4, 0), (3, 0)]);
        assert_eq!(path_cells((4, 4), (3, 3)), vec![(4, 4), (3, 3)]);
        assert_eq!(path_cells((5, 1), (3, 2)), vec![(5, 1), (4, 1), (3, 2)]);
        assert_eq!(path_cells((2, 2), (2, 2)), vec![(2, 2)]);
    }

    #[test]
    fn test_wave_alpha() {
        // crest a quarter period behind the phase
        let alpha = wave_alpha(0, 4, 0.25).unwrap();
        assert!((alpha - 0.48).abs() < 1e-5);
        // trough
        assert_eq!(wave_alpha(0, 4, 0.75), None);
        // start of a period sits right at the threshold and is hidden
        assert_eq!(wave_alpha(0, 4, 0.0), None);
    }

    #[test]
    fn test_pulse_runs_three_times() {
        let mut pulse = RayPulse::default();
        let mut schedule = Some(pulse.start());
        let mut ticks = 0;
        while let Some(s) = schedule {
            assert!(pulse.is_active());
            schedule = pulse.on_tick(s.id).reschedule;
            ticks += 1;
            assert!(ticks < 100);
        }
        assert!(!pulse.is_active());
        // three wraps of 0.15 steps
        assert_eq!(ticks, 20);
        assert_eq!(pulse.pulses(), MAX_PULSES);
    }

    #[test]
    fn test_ray_color_cycle() {
        let mut color = RayColor::Red;
        for _ in 0..6 {
            color = color.cycle();
        }
        assert_eq!(color, RayColor::Red);
        assert_eq!(RayColor::Green.rgb(), [0, 255, 0]);
    }
}
