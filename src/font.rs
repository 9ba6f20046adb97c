//! Font metrics for text measurement and encoding
//!
//! Overlay text is set in the base-14 Helvetica font, so widths come from its
//! standard AFM table and text is encoded as WinAnsi bytes.

/// Trait for measuring text dimensions and encoding text for PDF rendering.
pub trait FontMetrics {
    /// Width of a single character in points at the given font size
    fn char_width(&self, ch: char, font_size: f32) -> f32;

    /// Total width of a string in points at the given font size
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }

    /// Encode text for the PDF Tj operator
    fn encode_text(&self, text: &str) -> Vec<u8>;
}

/// Glyph widths of Helvetica for codes 32..=126, in 1/1000 em
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Width used for characters outside the ASCII table
const HELVETICA_FALLBACK_WIDTH: u16 = 556;

/// Metrics for the standard Helvetica Type1 font with WinAnsi encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct HelveticaMetrics;

impl FontMetrics for HelveticaMetrics {
    fn char_width(&self, ch: char, font_size: f32) -> f32 {
        let code = ch as u32;
        let units = if (32..=126).contains(&code) {
            HELVETICA_ASCII_WIDTHS[(code - 32) as usize]
        } else {
            HELVETICA_FALLBACK_WIDTH
        };
        units as f32 / 1000.0 * font_size
    }

    fn encode_text(&self, text: &str) -> Vec<u8> {
        text.chars().map(win_ansi_byte).collect()
    }
}

/// Map a character to its WinAnsiEncoding byte, `?` when it has none
fn win_ansi_byte(ch: char) -> u8 {
    let code = ch as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => code as u8,
        _ => match ch {
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            '\t' => b' ',
            _ => b'?',
        },
    }
}
