//! Heat colormap shared by all renderers: dark gray for empty squares through
//! orange and red up to magenta for the most valuable piece.

use palette::{LinSrgb, Mix, Srgb};

const STOPS: [[u8; 3]; 6] = [
    [0x2b, 0x2b, 0x2b],
    [0x4a, 0x4a, 0x4a],
    [0xff, 0xa5, 0x00],
    [0xff, 0x6b, 0x00],
    [0xff, 0x00, 0x00],
    [0xff, 0x00, 0xff],
];

fn linear(stop: [u8; 3]) -> LinSrgb<f32> {
    Srgb::new(stop[0], stop[1], stop[2]).into_linear()
}

/// Color at position `t` in `[0, 1]` along the scale.
pub fn sample(t: f32) -> [u8; 3] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let segments = (STOPS.len() - 1) as f32;
    let scaled = t * segments;
    let index = (scaled.floor() as usize).min(STOPS.len() - 2);
    let local = scaled - index as f32;

    let mixed = linear(STOPS[index]).mix(linear(STOPS[index + 1]), local);
    let (r, g, b) = Srgb::<u8>::from_linear(mixed).into_components();
    [r, g, b]
}

/// Color for a piece value on a scale from 0 to `max`.
pub fn heat_color(value: u8, max: u8) -> [u8; 3] {
    if max == 0 {
        return STOPS[0];
    }
    sample(f32::from(value) / f32::from(max))
}
