//! 3x5 bitmap glyphs for labels in raster output.
//!
//! Each glyph is five rows of three bits, most significant bit on the left.
//! Lowercase is only provided for the file letters and the black piece
//! letters; anything else falls back to uppercase or a blank.

pub const GLYPH_WIDTH: u32 = 3;
pub const GLYPH_HEIGHT: u32 = 5;

pub fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],

        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],

        'a' => [0b000, 0b011, 0b101, 0b101, 0b011],
        'b' => [0b100, 0b100, 0b110, 0b101, 0b110],
        'c' => [0b000, 0b011, 0b100, 0b100, 0b011],
        'd' => [0b001, 0b001, 0b011, 0b101, 0b011],
        'e' => [0b000, 0b010, 0b111, 0b100, 0b011],
        'f' => [0b001, 0b010, 0b111, 0b010, 0b010],
        'g' => [0b011, 0b101, 0b011, 0b001, 0b110],
        'h' => [0b100, 0b100, 0b110, 0b101, 0b101],
        'k' => [0b100, 0b101, 0b110, 0b110, 0b101],
        'n' => [0b000, 0b110, 0b101, 0b101, 0b101],
        'p' => [0b000, 0b110, 0b101, 0b110, 0b100],
        'q' => [0b000, 0b011, 0b101, 0b011, 0b001],
        'r' => [0b000, 0b101, 0b110, 0b100, 0b100],

        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '[' => [0b110, 0b100, 0b100, 0b100, 0b110],
        ']' => [0b011, 0b001, 0b001, 0b001, 0b011],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        ' ' => [0; 5],

        c if c.is_ascii_lowercase() => return glyph(c.to_ascii_uppercase()),
        _ => return None,
    };
    Some(rows)
}

/// Pixel offsets `(x, y)` of the lit dots of `text`, one column of spacing
/// between glyphs. Unknown characters are left blank.
pub fn layout(text: &str) -> impl Iterator<Item = (u32, u32)> + '_ {
    text.chars().enumerate().flat_map(|(i, c)| {
        let origin = i as u32 * (GLYPH_WIDTH + 1);
        let rows = glyph(c).unwrap_or([0; 5]);
        (0..GLYPH_HEIGHT).flat_map(move |y| {
            (0..GLYPH_WIDTH).filter_map(move |x| {
                let lit = rows[y as usize] & (0b100 >> x) != 0;
                lit.then_some((origin + x, y))
            })
        })
    })
}

/// Unscaled width of `text` in pixels.
pub fn text_width(text: &str) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        0
    } else {
        n * (GLYPH_WIDTH + 1) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_fallback() {
        assert_eq!(glyph('m'), glyph('M'));
        assert_ne!(glyph('a'), glyph('A'));
        assert_eq!(glyph('~'), None);
    }

    #[test]
    fn test_layout_digit_one() {
        let dots: Vec<(u32, u32)> = layout("1").collect();
        assert_eq!(dots.len(), 8);
        assert!(dots.contains(&(1, 0)));
        assert!(dots.contains(&(0, 4)));
    }

    #[test]
    fn test_layout_offsets_second_glyph() {
        let dots: Vec<(u32, u32)> = layout(" -").collect();
        assert_eq!(dots, vec![(4, 2), (5, 2), (6, 2)]);
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width(""), 0);
        assert_eq!(text_width("a"), 3);
        assert_eq!(text_width("ab"), 7);
    }
}
