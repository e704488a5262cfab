use crate::truetype::TrueTypeFont;

/// Index into the document's TrueType font list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrueTypeFontId(pub usize);

/// Either one of the builtin Helvetica faces or a loaded TrueType font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontRef {
    Builtin(BuiltinFont),
    TrueType(TrueTypeFontId),
}

impl From<BuiltinFont> for FontRef {
    fn from(font: BuiltinFont) -> Self {
        FontRef::Builtin(font)
    }
}

/// The Helvetica faces of the standard 14 fonts. Always available in
/// PDF viewers, never embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
}

impl BuiltinFont {
    /// Resource name used in content streams.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "F1",
            BuiltinFont::HelveticaBold => "F2",
            BuiltinFont::HelveticaOblique => "F3",
            BuiltinFont::HelveticaBoldOblique => "F4",
        }
    }

    pub fn pdf_base_name(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::HelveticaOblique => "Helvetica-Oblique",
            BuiltinFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
        }
    }

    fn is_bold(&self) -> bool {
        matches!(self, BuiltinFont::HelveticaBold | BuiltinFont::HelveticaBoldOblique)
    }
}

/// Face selector within a [`FontFamily`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
}

/// Three faces that belong together. Text is drawn by picking a
/// [`FontStyle`] rather than a concrete font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontFamily {
    pub regular: FontRef,
    pub bold: FontRef,
    pub italic: FontRef,
}

impl FontFamily {
    pub fn helvetica() -> Self {
        FontFamily {
            regular: BuiltinFont::Helvetica.into(),
            bold: BuiltinFont::HelveticaBold.into(),
            italic: BuiltinFont::HelveticaOblique.into(),
        }
    }

    pub fn face(&self, style: FontStyle) -> FontRef {
        match style {
            FontStyle::Regular => self.regular,
            FontStyle::Bold => self.bold,
            FontStyle::Italic => self.italic,
        }
    }
}

impl Default for FontFamily {
    fn default() -> Self {
        Self::helvetica()
    }
}

/// A concrete font at a concrete size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontRef,
    pub font_size: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font: BuiltinFont::Helvetica.into(),
            font_size: 12.0,
        }
    }
}

/// Helvetica advance widths for WinAnsi bytes 0x20..=0xFF, 1/1000 em
/// (Adobe AFM). Slots the encoding leaves undefined hold 350.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 224] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 350,
    556, 350, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    350, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 350, 500, 667,
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

/// Helvetica-Bold advance widths for WinAnsi bytes 0x20..=0xFF.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 224] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 350,
    556, 350, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    350, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 350, 500, 667,
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

/// Drawn in place of characters WinAnsi cannot encode.
const REPLACEMENT: u8 = b'?';

/// Font metrics for the builtin faces.
pub struct FontMetrics;

impl FontMetrics {
    /// Width of a character in 1/1000 em units, taken from the glyph
    /// the character is actually drawn with.
    pub fn char_width(font: BuiltinFont, ch: char) -> u16 {
        let code = winansi_code(ch).unwrap_or(REPLACEMENT);
        let index = (code - 0x20) as usize;
        if font.is_bold() {
            HELVETICA_BOLD_WIDTHS[index]
        } else {
            HELVETICA_WIDTHS[index]
        }
    }

    /// Width of `text` in points.
    pub fn measure_text(text: &str, font: BuiltinFont, font_size: f64) -> f64 {
        let total: u32 = text.chars().map(|ch| Self::char_width(font, ch) as u32).sum();
        total as f64 * font_size / 1000.0
    }
}

/// WinAnsiEncoding byte for `ch`, if the encoding has one. Never below
/// 0x20.
fn winansi_code(ch: char) -> Option<u8> {
    match ch {
        ' '..='~' => Some(ch as u8),
        '\u{a0}'..='\u{ff}' => Some(ch as u32 as u8),
        '€' => Some(0x80),
        '‚' => Some(0x82),
        'ƒ' => Some(0x83),
        '„' => Some(0x84),
        '…' => Some(0x85),
        '†' => Some(0x86),
        '‡' => Some(0x87),
        'ˆ' => Some(0x88),
        '‰' => Some(0x89),
        'Š' => Some(0x8A),
        '‹' => Some(0x8B),
        'Œ' => Some(0x8C),
        'Ž' => Some(0x8E),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        '˜' => Some(0x98),
        '™' => Some(0x99),
        'š' => Some(0x9A),
        '›' => Some(0x9B),
        'œ' => Some(0x9C),
        'ž' => Some(0x9E),
        'Ÿ' => Some(0x9F),
        _ => None,
    }
}

/// Encode `text` as the body of a PDF literal string for a builtin
/// font: delimiters escaped, non-ASCII WinAnsi bytes written as octal
/// escapes, unmappable characters replaced by `?`.
pub(crate) fn encode_winansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match winansi_code(ch) {
            Some(b'\\') => out.push_str("\\\\"),
            Some(b'(') => out.push_str("\\("),
            Some(b')') => out.push_str("\\)"),
            Some(b) if b < 0x80 => out.push(b as char),
            Some(b) => out.push_str(&format!("\\{:03o}", b)),
            None => out.push(REPLACEMENT as char),
        }
    }
    out
}

/// Width of `text` in points for any font kind.
pub(crate) fn measure_word(text: &str, style: &TextStyle, tt_fonts: &[TrueTypeFont]) -> f64 {
    match style.font {
        FontRef::Builtin(b) => FontMetrics::measure_text(text, b, style.font_size),
        FontRef::TrueType(id) => tt_fonts[id.0].measure_text(text, style.font_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_tables_cover_printable_ascii() {
        assert_eq!(FontMetrics::char_width(BuiltinFont::Helvetica, 'A'), 667);
        assert_eq!(FontMetrics::char_width(BuiltinFont::HelveticaBold, 'A'), 722);
        assert_eq!(FontMetrics::char_width(BuiltinFont::HelveticaOblique, 'm'), 833);
    }

    #[test]
    fn accented_letters_use_base_width() {
        for font in [BuiltinFont::Helvetica, BuiltinFont::HelveticaBold] {
            assert_eq!(
                FontMetrics::char_width(font, 'é'),
                FontMetrics::char_width(font, 'e')
            );
        }
        assert_eq!(FontMetrics::char_width(BuiltinFont::Helvetica, '€'), 556);
    }

    #[test]
    fn french_punctuation_and_ligatures_use_their_own_widths() {
        let w = |ch| FontMetrics::char_width(BuiltinFont::Helvetica, ch);
        assert_eq!(w('œ'), 944);
        assert_eq!(w('Œ'), 1000);
        assert_eq!(w('«'), 556);
        assert_eq!(w('»'), 556);
        assert_eq!(w('—'), 1000);
        assert_eq!(w('°'), 400);
        assert_eq!(w('’'), 222);
        assert_eq!(w('\''), 191);
        assert_eq!(FontMetrics::char_width(BuiltinFont::HelveticaBold, 'œ'), 944);
        assert_eq!(FontMetrics::char_width(BuiltinFont::HelveticaBold, 'ç'), 556);
    }

    #[test]
    fn unencodable_characters_measure_as_their_replacement() {
        for font in [BuiltinFont::Helvetica, BuiltinFont::HelveticaBold] {
            assert_eq!(
                FontMetrics::char_width(font, '漢'),
                FontMetrics::char_width(font, '?')
            );
        }
    }

    #[test]
    fn measure_scales_with_size() {
        let w10 = FontMetrics::measure_text("Total", BuiltinFont::Helvetica, 10.0);
        let w20 = FontMetrics::measure_text("Total", BuiltinFont::Helvetica, 20.0);
        assert!((w20 - 2.0 * w10).abs() < 1e-9);
    }

    #[test]
    fn winansi_escapes_non_ascii() {
        assert_eq!(encode_winansi("Relevé"), "Relev\\351");
        assert_eq!(encode_winansi("12,50 €"), "12,50 \\200");
        assert_eq!(encode_winansi("(x)"), "\\(x\\)");
        assert_eq!(encode_winansi("漢"), "?");
        assert_eq!(encode_winansi("œuvre"), "\\234uvre");
        assert_eq!(encode_winansi("«Œ» Ÿ"), "\\253\\214\\273 \\237");
    }

    #[test]
    fn family_picks_faces() {
        let fam = FontFamily::helvetica();
        assert_eq!(fam.face(FontStyle::Bold), FontRef::Builtin(BuiltinFont::HelveticaBold));
        assert_eq!(fam.face(FontStyle::Italic), FontRef::Builtin(BuiltinFont::HelveticaOblique));
    }
}
