//! Greedy line wrapping against Helvetica advance widths.
//!
//! printpdf positions text but does not measure it, so wrapping needs its own
//! width model. The table below carries the standard Helvetica AFM advance
//! widths for the printable ASCII range in 1/1000 em units; text is sanitized
//! to that range before it reaches this module.

/// Advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u32; 95] = [
    278, // space
    278, // !
    355, // "
    556, // #
    556, // $
    889, // %
    667, // &
    191, // '
    333, // (
    333, // )
    389, // *
    584, // +
    278, // ,
    333, // -
    278, // .
    278, // /
    556, // 0
    556, // 1
    556, // 2
    556, // 3
    556, // 4
    556, // 5
    556, // 6
    556, // 7
    556, // 8
    556, // 9
    278, // :
    278, // ;
    584, // <
    584, // =
    584, // >
    556, // ?
    1015, // @
    667, // A
    667, // B
    722, // C
    722, // D
    667, // E
    611, // F
    778, // G
    722, // H
    278, // I
    500, // J
    667, // K
    556, // L
    833, // M
    722, // N
    778, // O
    667, // P
    778, // Q
    722, // R
    667, // S
    611, // T
    722, // U
    667, // V
    944, // W
    667, // X
    667, // Y
    611, // Z
    278, // [
    278, // \
    278, // ]
    469, // ^
    556, // _
    333, // `
    556, // a
    556, // b
    500, // c
    556, // d
    556, // e
    278, // f
    556, // g
    556, // h
    222, // i
    222, // j
    500, // k
    222, // l
    833, // m
    556, // n
    556, // o
    556, // p
    556, // q
    333, // r
    500, // s
    278, // t
    556, // u
    500, // v
    722, // w
    500, // x
    500, // y
    500, // z
    334, // {
    260, // |
    334, // }
    584, // ~
];

/// Fallback width for characters outside the table, in 1/1000 em.
const FALLBACK_WIDTH: u32 = 556;

const PT_PER_MM: f64 = 72.0 / 25.4;

fn char_width_milliem(c: char) -> u32 {
    let code = c as u32;
    if (32..=126).contains(&code) {
        HELVETICA_WIDTHS[(code - 32) as usize]
    } else {
        FALLBACK_WIDTH
    }
}

/// Width of `text` at `font_size_pt`, in millimeters.
pub fn text_width_mm(text: &str, font_size_pt: f64) -> f64 {
    let milliems: u32 = text.chars().map(char_width_milliem).sum();
    (milliems as f64 / 1000.0) * font_size_pt / PT_PER_MM
}

/// Greedily wrap `text` into lines no wider than `max_width_mm`.
///
/// Always returns at least one line. A single word wider than the budget is
/// emitted on its own line rather than split mid-word; callers size their
/// column widths so this stays a pathological case.
pub fn wrap(text: &str, font_size_pt: f64, max_width_mm: f64) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if current.is_empty() || text_width_mm(&candidate, font_size_pt) <= max_width_mm {
            current = candidate;
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    lines
}
