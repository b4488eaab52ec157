//! Font metrics, text encoding and line wrapping for the brief renderer.
//!
//! The brief uses the PDF standard Type1 Helvetica family, so no font files
//! are embedded. The flip side is that we have to measure text ourselves:
//! the tables below are the advance widths from the Adobe AFM files, in
//! 1/1000 em, for the printable ASCII range. Bytes outside that range (the
//! WinAnsi extras) use the average Latin width.
//!
//! Text is encoded to WinAnsi (Windows-1252) before it is measured, so the
//! width of a replacement `?` is what gets counted for unsupported glyphs.

/// Helvetica / Helvetica-Oblique widths for bytes 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold widths for bytes 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

const FALLBACK_WIDTH: u16 = 556;

/// The three faces the brief uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    pub const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Oblique];

    /// PostScript name of the standard font.
    pub fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
        }
    }

    /// Name of the font in the page resource dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
        }
    }

    fn byte_width(self, byte: u8) -> u16 {
        let table = match self {
            Font::Regular | Font::Oblique => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        match byte {
            32..=126 => table[(byte - 32) as usize],
            _ => FALLBACK_WIDTH,
        }
    }

    /// Width of `text` in points at `size`.
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| self.byte_width(win_ansi_byte(c)) as u32)
            .sum();
        units as f32 * size / 1000.0
    }
}

/// Map a character to its WinAnsi (Windows-1252) code, or `?`.
pub fn win_ansi_byte(c: char) -> u8 {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => code as u8,
        0x09 => b' ',
        _ => match c {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        },
    }
}

/// Encode `text` as WinAnsi bytes for a PDF string operand.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

/// Break `text` into lines no wider than `max_width` points.
///
/// Explicit newlines start a new line. Words are packed greedily and joined
/// by single spaces; a word that alone exceeds the width is split between
/// characters. Never returns an empty vector.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let space = font.text_width(" ", size);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in paragraph.split_whitespace() {
            let word_width = font.text_width(word, size);

            if !current.is_empty() && current_width + space + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }

            if word_width <= max_width {
                current.push_str(word);
                current_width = word_width;
            } else {
                for piece in split_long_word(word, font, size, max_width) {
                    if !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                    current_width = font.text_width(&piece, size);
                    current = piece;
                }
            }
        }

        lines.push(current);
    }

    lines
}

fn split_long_word(word: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0_f32;

    for c in word.chars() {
        let w = font.byte_width(win_ansi_byte(c)) as f32 * size / 1000.0;
        if !piece.is_empty() && width + w > max_width {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_tables_cover_printable_ascii() {
        assert_eq!(HELVETICA_WIDTHS.len(), 126 - 32 + 1);
        assert_eq!(HELVETICA_BOLD_WIDTHS.len(), 126 - 32 + 1);
        assert_eq!(Font::Regular.byte_width(b'W'), 944);
        assert_eq!(Font::Regular.byte_width(b'i'), 222);
        assert_eq!(Font::Bold.byte_width(b'i'), 278);
        assert_eq!(Font::Oblique.byte_width(b'~'), 584);
    }

    #[test]
    fn text_width_scales_with_size() {
        let w12 = Font::Regular.text_width("Hello", 12.0);
        let w24 = Font::Regular.text_width("Hello", 24.0);
        assert!((w24 - 2.0 * w12).abs() < 1e-3);
        // H(722) e(556) l(222) l(222) o(556) = 2278 units
        assert!((w12 - 2278.0 * 12.0 / 1000.0).abs() < 1e-3);
    }

    #[test]
    fn win_ansi_maps_typographic_punctuation() {
        assert_eq!(encode_win_ansi("“Hi” – ok…"), vec![0x93, b'H', b'i', 0x94, b' ', 0x96, b' ', b'o', b'k', 0x85]);
        assert_eq!(win_ansi_byte('é'), 0xE9);
        assert_eq!(win_ansi_byte('漢'), b'?');
        assert_eq!(win_ansi_byte('\u{7}'), b'?');
    }

    #[test]
    fn short_text_is_one_line() {
        let lines = wrap_text("Key Points:", Font::Regular, 12.0, 500.0);
        assert_eq!(lines, vec!["Key Points:"]);
    }

    #[test]
    fn long_text_wraps_within_width() {
        let text = "word ".repeat(200);
        let max = 300.0;
        let lines = wrap_text(&text, Font::Regular, 12.0, max);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Font::Regular.text_width(line, 12.0) <= max, "too wide: {line}");
        }
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split(' ')).collect();
        assert_eq!(rejoined.len(), 200);
    }

    #[test]
    fn over_long_word_is_hard_split() {
        let url = format!("https://example.com/{}", "x".repeat(300));
        let lines = wrap_text(&url, Font::Regular, 12.0, 200.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), url);
        for line in &lines {
            assert!(Font::Regular.text_width(line, 12.0) <= 200.0);
        }
    }

    #[test]
    fn explicit_newlines_start_new_lines() {
        let lines = wrap_text("first\nsecond", Font::Regular, 12.0, 500.0);
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        assert_eq!(wrap_text("", Font::Regular, 12.0, 100.0), vec![String::new()]);
    }
}
