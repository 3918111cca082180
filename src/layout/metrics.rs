// Advance widths of the PDF base-14 Helvetica faces, in 1/1000 em, for
// printable ASCII (0x20..=0x7E). Oblique shares the regular widths.
use super::FontStyle;

const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

const ELLIPSIS_WIDTH: u16 = 1000;
const FALLBACK_WIDTH: u16 = 556;

/// Points to millimetres.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

fn advance(c: char, style: FontStyle) -> u16 {
    let table = match style {
        FontStyle::Bold => &HELVETICA_BOLD,
        FontStyle::Regular | FontStyle::Italic => &HELVETICA,
    };
    match c {
        ' '..='~' => table[c as usize - 0x20],
        '…' => ELLIPSIS_WIDTH,
        _ => FALLBACK_WIDTH,
    }
}

/// Advance of one character in 1/1000 em.
pub fn char_units(c: char, style: FontStyle) -> u32 {
    u32::from(advance(c, style))
}

pub fn units_to_mm(units: u32, size_pt: f32) -> f32 {
    units as f32 / 1000.0 * size_pt * PT_TO_MM
}

/// Rendered width of `text` in millimetres at `size_pt`.
pub fn text_width_mm(text: &str, size_pt: f32, style: FontStyle) -> f32 {
    let units: u32 = text.chars().map(|c| char_units(c, style)).sum();
    units_to_mm(units, size_pt)
}
