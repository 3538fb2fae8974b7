//! Text normalization for the PDF layout routines.
//!
//! The embedded font subset only covers a constrained ASCII repertoire, so
//! typographic punctuation is mapped onto ASCII equivalents and anything else
//! non-representable becomes a single space before whitespace collapsing.
//! Fidelity to the original Unicode text is explicitly not guaranteed.

/// Normalize one line of text for layout. Idempotent.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            // Hyphen/dash family and the Unicode minus.
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            // Curly single quotes and prime.
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            // Curly double quotes and double prime.
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            // Bullet glyphs commonly surviving PDF extraction.
            '\u{2022}' | '\u{25CF}' | '\u{25CB}' | '\u{25AA}' | '\u{25AB}' | '\u{2023}' => {
                out.push('-')
            }
            c if c.is_ascii_graphic() || c == ' ' => out.push(c),
            // Everything else (controls, remaining non-ASCII) becomes a space.
            _ => out.push(' '),
        }
    }

    // Collapse whitespace runs and trim the ends.
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
