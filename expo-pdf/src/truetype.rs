use std::collections::BTreeMap;
use std::io;

use crate::writer::{ObjId, PdfObject};

/// A parsed TrueType font, embedded as a Type0/CIDFontType2 composite
/// font with Identity-H encoding (glyph ids written as 2-byte codes).
pub struct TrueTypeFont {
    postscript_name: String,
    font_data: Vec<u8>,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    bbox: [i16; 4],
    cap_height: i16,
    italic_angle: f64,
    flags: u32,
    stem_v: i16,
    /// Unicode codepoint -> glyph id.
    cmap: BTreeMap<u32, u16>,
    /// Horizontal advance per glyph id, in font units.
    advances: Vec<u16>,
    /// Glyphs drawn so far with the character that produced them.
    /// Drives the /W array and the ToUnicode CMap.
    used: BTreeMap<u16, char>,
    pub(crate) pdf_name: String,
}

/// Object ids reserved for one embedded font.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EmbedIds {
    pub type0: ObjId,
    pub cid_font: ObjId,
    pub descriptor: ObjId,
    pub font_file: ObjId,
    pub to_unicode: ObjId,
}

impl TrueTypeFont {
    /// Parse a font from raw `.ttf` bytes. `resource_name` becomes the
    /// font's name in page resource dictionaries.
    pub fn from_bytes(data: Vec<u8>, resource_name: &str) -> Result<Self, String> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| format!("failed to parse TrueType font: {}", e))?;

        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return Err("font reports zero units per em".to_string());
        }
        let ascent = face.ascender();
        let descent = face.descender();
        let rect = face.global_bounding_box();
        let cap_height = face.capital_height().unwrap_or(ascent);
        let italic_angle = face.italic_angle() as f64;
        let flags = descriptor_flags(&face);
        let stem_v = approximate_stem_v(&face);
        let postscript_name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME && n.is_unicode())
            .and_then(|n| n.to_string())
            .unwrap_or_else(|| resource_name.to_string());

        let tables = face.tables().cmap.ok_or("font has no cmap table")?;
        let mut cmap = BTreeMap::new();
        for subtable in tables.subtables.into_iter().filter(|s| s.is_unicode()) {
            subtable.codepoints(|cp| {
                if let Some(gid) = subtable.glyph_index(cp) {
                    cmap.entry(cp).or_insert(gid.0);
                }
            });
        }

        let advances = (0..face.number_of_glyphs())
            .map(|gid| face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0))
            .collect();

        Ok(TrueTypeFont {
            postscript_name: postscript_name.replace(' ', ""),
            font_data: data,
            units_per_em,
            ascent,
            descent,
            bbox: [rect.x_min, rect.y_min, rect.x_max, rect.y_max],
            cap_height,
            italic_angle,
            flags,
            stem_v,
            cmap,
            advances,
            used: BTreeMap::new(),
            pdf_name: resource_name.to_string(),
        })
    }

    fn glyph_for(&self, ch: char) -> u16 {
        self.cmap.get(&(ch as u32)).copied().unwrap_or(0)
    }

    fn to_pdf_units(&self, value: i64) -> i64 {
        value * 1000 / self.units_per_em as i64
    }

    /// Advance of a glyph in 1/1000 em. Missing glyphs use .notdef.
    fn glyph_advance(&self, gid: u16) -> i64 {
        let raw = self
            .advances
            .get(gid as usize)
            .or_else(|| self.advances.first())
            .copied()
            .unwrap_or(0);
        self.to_pdf_units(raw as i64)
    }

    /// Width of `text` in points.
    pub fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        let total: i64 = text.chars().map(|ch| self.glyph_advance(self.glyph_for(ch))).sum();
        total as f64 * font_size / 1000.0
    }

    /// Hex string of glyph ids for a `Tj` operator, e.g. `<00480065>`.
    /// Records every glyph as used.
    pub fn encode_text_hex(&mut self, text: &str) -> String {
        let mut hex = String::with_capacity(text.len() * 4 + 2);
        hex.push('<');
        for ch in text.chars() {
            let gid = self.glyph_for(ch);
            self.used.entry(gid).or_insert(ch);
            hex.push_str(&format!("{:04X}", gid));
        }
        hex.push('>');
        hex
    }

    /// `/W` array entries: `start [w1 w2 ...]` for each run of
    /// consecutive used glyph ids.
    fn width_array(&self) -> Vec<PdfObject> {
        let mut result = Vec::new();
        let mut run_start: Option<u16> = None;
        let mut run: Vec<PdfObject> = Vec::new();
        let mut previous = 0u16;

        for &gid in self.used.keys() {
            if let Some(start) = run_start {
                if gid != previous + 1 {
                    result.push(PdfObject::Integer(start as i64));
                    result.push(PdfObject::Array(std::mem::take(&mut run)));
                    run_start = Some(gid);
                }
            } else {
                run_start = Some(gid);
            }
            run.push(PdfObject::Integer(self.glyph_advance(gid)));
            previous = gid;
        }
        if let Some(start) = run_start {
            result.push(PdfObject::Integer(start as i64));
            result.push(PdfObject::Array(run));
        }
        result
    }

    /// ToUnicode CMap so text copied out of the PDF is readable.
    fn to_unicode_cmap(&self) -> Vec<u8> {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );
        let pairs: Vec<(&u16, &char)> = self.used.iter().collect();
        // At most 100 entries per bfchar block.
        for chunk in pairs.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, ch) in chunk {
                let mut units = [0u16; 2];
                let hex: String = ch.encode_utf16(&mut units).iter().map(|u| format!("{:04X}", u)).collect();
                cmap.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
            }
            cmap.push_str("endbfchar\n");
        }
        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap.into_bytes()
    }

    /// Every object needed to embed this font, keyed by the reserved ids.
    pub(crate) fn embed_objects(&self, ids: EmbedIds, compress: bool) -> io::Result<Vec<(ObjId, PdfObject)>> {
        let base_font = PdfObject::name(&self.postscript_name);
        let type0 = PdfObject::dict(vec![
            ("Type", PdfObject::name("Font")),
            ("Subtype", PdfObject::name("Type0")),
            ("BaseFont", base_font.clone()),
            ("Encoding", PdfObject::name("Identity-H")),
            ("DescendantFonts", PdfObject::Array(vec![PdfObject::Reference(ids.cid_font)])),
            ("ToUnicode", PdfObject::Reference(ids.to_unicode)),
        ]);
        let cid_font = PdfObject::dict(vec![
            ("Type", PdfObject::name("Font")),
            ("Subtype", PdfObject::name("CIDFontType2")),
            ("BaseFont", base_font.clone()),
            (
                "CIDSystemInfo",
                PdfObject::dict(vec![
                    ("Registry", PdfObject::literal_string("Adobe")),
                    ("Ordering", PdfObject::literal_string("Identity")),
                    ("Supplement", PdfObject::Integer(0)),
                ]),
            ),
            ("FontDescriptor", PdfObject::Reference(ids.descriptor)),
            ("DW", PdfObject::Integer(self.glyph_advance(0))),
            ("W", PdfObject::Array(self.width_array())),
            ("CIDToGIDMap", PdfObject::name("Identity")),
        ]);
        let bbox = self
            .bbox
            .iter()
            .map(|&v| PdfObject::Integer(self.to_pdf_units(v as i64)))
            .collect();
        let descriptor = PdfObject::dict(vec![
            ("Type", PdfObject::name("FontDescriptor")),
            ("FontName", base_font),
            ("Flags", PdfObject::Integer(self.flags as i64)),
            ("FontBBox", PdfObject::Array(bbox)),
            ("ItalicAngle", PdfObject::Real(self.italic_angle)),
            ("Ascent", PdfObject::Integer(self.to_pdf_units(self.ascent as i64))),
            ("Descent", PdfObject::Integer(self.to_pdf_units(self.descent as i64))),
            ("CapHeight", PdfObject::Integer(self.to_pdf_units(self.cap_height as i64))),
            ("StemV", PdfObject::Integer(self.stem_v as i64)),
            ("FontFile2", PdfObject::Reference(ids.font_file)),
        ]);
        let font_file = PdfObject::stream_maybe_compressed(
            vec![("Length1", PdfObject::Integer(self.font_data.len() as i64))],
            self.font_data.clone(),
            compress,
        )?;
        let to_unicode = PdfObject::stream_maybe_compressed(vec![], self.to_unicode_cmap(), compress)?;

        Ok(vec![
            (ids.type0, type0),
            (ids.cid_font, cid_font),
            (ids.descriptor, descriptor),
            (ids.font_file, font_file),
            (ids.to_unicode, to_unicode),
        ])
    }
}

/// FontDescriptor /Flags: FixedPitch (1), Nonsymbolic (32), Italic (64).
fn descriptor_flags(face: &ttf_parser::Face) -> u32 {
    let mut flags = 32;
    if face.is_monospaced() {
        flags |= 1;
    }
    if face.is_italic() {
        flags |= 64;
    }
    flags
}

/// StemV is not stored in TrueType files; derive it from the weight class.
fn approximate_stem_v(face: &ttf_parser::Face) -> i16 {
    let w = face.weight().to_number() as f64 / 1000.0;
    (10.0 + 220.0 * w * w) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_garbage_bytes() {
        let err = TrueTypeFont::from_bytes(b"not a font".to_vec(), "TT1").err();
        assert!(err.unwrap().contains("failed to parse"));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(TrueTypeFont::from_bytes(Vec::new(), "TT1").is_err());
    }
}
