//! Built-in AFM advance widths for the Helvetica family.
//!
//! Widths are in 1/1000 em units for the printable ASCII range (32..=126),
//! straight from the Adobe AFM files. The oblique variants share the upright
//! widths, so two tables cover all four fonts. Characters outside the table
//! fall back to the width of a digit, which keeps measurement conservative
//! for the occasional non-ASCII character in clinic-supplied text.

use crate::style::FontId;

/// Helvetica (and Helvetica-Oblique) advance widths for chars 32..=126.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold (and Helvetica-BoldOblique) advance widths for chars 32..=126.
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333,
    584, 584, 584, 611, 975, 722, 722, 722, 722, 667, 611, 778, 722, 278,
    556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
    333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Fallback width (per mille) for characters outside the table.
const DEFAULT_WIDTH: u16 = 556;

fn table_for(font: FontId) -> &'static [u16; 95] {
    match font {
        FontId::Helvetica | FontId::HelveticaOblique => &HELVETICA,
        FontId::HelveticaBold | FontId::HelveticaBoldOblique => &HELVETICA_BOLD,
    }
}

/// Advance width of a single character in points at the given size.
pub fn char_width(ch: char, font: FontId, font_size: f64) -> f64 {
    let code = ch as u32;
    let per_mille = if (32..=126).contains(&code) {
        table_for(font)[(code - 32) as usize]
    } else {
        DEFAULT_WIDTH
    };
    per_mille as f64 / 1000.0 * font_size
}

/// Width of a string in points at the given size.
pub fn string_width(text: &str, font: FontId, font_size: f64) -> f64 {
    text.chars().map(|ch| char_width(ch, font, font_size)).sum()
}
