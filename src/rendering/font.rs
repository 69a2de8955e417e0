//! Built-in 5x7 bitmap font for the score badge.
//!
//! Only the characters a badge can contain are defined. Each row is a bit
//! mask whose most significant of `width` bits is the leftmost column.

pub const GLYPH_ROWS: usize = 7;

/// Blank columns between two glyphs
pub const GLYPH_GAP: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub width: usize,
    pub rows: [u8; GLYPH_ROWS],
}

const fn g5(rows: [u8; GLYPH_ROWS]) -> Glyph {
    Glyph { width: 5, rows }
}

const SPACE: Glyph = Glyph { width: 2, rows: [0; GLYPH_ROWS] };
const COLON: Glyph = Glyph { width: 2, rows: [0b00, 0b11, 0b11, 0b00, 0b11, 0b11, 0b00] };
const PERIOD: Glyph = Glyph { width: 2, rows: [0b00, 0b00, 0b00, 0b00, 0b00, 0b11, 0b11] };

pub fn glyph(c: char) -> Option<Glyph> {
    let g = match c {
        '0' => g5([0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
        '1' => g5([0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        '2' => g5([0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
        '3' => g5([0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
        '4' => g5([0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
        '5' => g5([0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
        '6' => g5([0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
        '7' => g5([0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
        '8' => g5([0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
        '9' => g5([0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
        'C' => g5([0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
        'L' => g5([0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
        'S' => g5([0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
        '-' => g5([0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]),
        ':' => COLON,
        '.' => PERIOD,
        ' ' => SPACE,
        _ => return None,
    };
    Some(g)
}

impl Glyph {
    pub fn is_set(&self, col: usize, row: usize) -> bool {
        col < self.width && row < GLYPH_ROWS && (self.rows[row] >> (self.width - 1 - col)) & 1 == 1
    }
}

/// Size of one font pixel for a given font size.
///
/// Seven rows cover roughly the cap height of the font size.
pub fn cell_size(font_size: f64) -> f64 {
    font_size / 9.0
}

/// Width of `text` in font pixels (unknown characters count as spaces)
pub fn text_columns(text: &str) -> usize {
    let widths: Vec<usize> = text.chars().map(|c| glyph(c).unwrap_or(SPACE).width).collect();
    widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * GLYPH_GAP
}

/// Lit cells of `text` as `(column, row)` pairs, left to right
pub fn cells(text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut origin = 0;
    for c in text.chars() {
        let g = glyph(c).unwrap_or(SPACE);
        for row in 0..GLYPH_ROWS {
            for col in 0..g.width {
                if g.is_set(col, row) {
                    out.push((origin + col, row));
                }
            }
        }
        origin += g.width + GLYPH_GAP;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_characters_are_defined() {
        for c in "CLS: 0123456789.".chars() {
            assert!(glyph(c).is_some(), "missing glyph {:?}", c);
        }
        assert!(glyph('x').is_none());
    }

    #[test]
    fn badge_text_fits_the_badge() {
        // 8px left padding plus text must stay inside the 110px badge at scale 1
        let width = text_columns("CLS: 0.040") as f64 * cell_size(18.0);
        assert!(8.0 + width <= 110.0, "text is {}px wide", width);
    }

    #[test]
    fn cells_stay_within_measured_width() {
        let text = "CLS: 1.234";
        let cols = text_columns(text);
        assert!(cells(text).iter().all(|(c, r)| *c < cols && *r < GLYPH_ROWS));
    }

    #[test]
    fn l_is_a_left_bar_with_a_foot() {
        let l = glyph('L').unwrap();
        assert!(l.is_set(0, 0));
        assert!(!l.is_set(4, 0));
        assert!(l.is_set(4, 6));
    }
}
