use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::Path;

use crate::fonts::{self, BuiltinFont, FontRef, TextStyle, TrueTypeFontId};
use crate::truetype::{EmbedIds, TrueTypeFont};
use crate::writer::{ObjId, PdfObject, PdfWriter};

const CATALOG_OBJ: ObjId = ObjId(1, 0);
const PAGES_OBJ: ObjId = ObjId(2, 0);
const FIRST_FREE_OBJ_NUM: u32 = 3;

/// Low-level PDF builder: pages, fonts, text and strokes in PDF
/// coordinates (origin bottom-left, points).
///
/// Generic over `Write` so it works with files (`BufWriter<File>`) or
/// in-memory buffers (`Vec<u8>`).
///
/// Pages are written incrementally: `end_page()` flushes the page to
/// the writer and frees its content. Font objects are only written by
/// `end_document()`, once the set of used glyphs is known.
pub struct PdfDocument<W: Write> {
    writer: PdfWriter<W>,
    info: Vec<(String, String)>,
    page_obj_ids: Vec<ObjId>,
    current_page: Option<PageBuilder>,
    next_obj_num: u32,
    compress: bool,
    builtin_fonts: BTreeMap<BuiltinFont, ObjId>,
    tt_fonts: Vec<TrueTypeFont>,
    tt_font_ids: Vec<ObjId>,
}

struct PageBuilder {
    width: f64,
    height: f64,
    content_ops: Vec<u8>,
    fonts: BTreeSet<FontRef>,
}

impl<W: Write> PdfDocument<W> {
    /// Start a document on `writer`. The header is written immediately.
    pub fn new(writer: W) -> io::Result<Self> {
        let mut pdf_writer = PdfWriter::new(writer);
        pdf_writer.write_header()?;
        Ok(PdfDocument {
            writer: pdf_writer,
            info: Vec::new(),
            page_obj_ids: Vec::new(),
            current_page: None,
            next_obj_num: FIRST_FREE_OBJ_NUM,
            compress: false,
            builtin_fonts: BTreeMap::new(),
            tt_fonts: Vec::new(),
            tt_font_ids: Vec::new(),
        })
    }

    /// Flate-compress page content and embedded font streams.
    pub fn set_compression(&mut self, enabled: bool) -> &mut Self {
        self.compress = enabled;
        self
    }

    /// Add a document info entry (e.g. "Creator", "Title").
    pub fn set_info(&mut self, key: &str, value: &str) -> &mut Self {
        self.info.push((key.to_string(), value.to_string()));
        self
    }

    fn alloc_id(&mut self) -> ObjId {
        let id = ObjId(self.next_obj_num, 0);
        self.next_obj_num += 1;
        id
    }

    /// Register a TrueType font from raw bytes.
    pub fn load_font_bytes(&mut self, data: Vec<u8>) -> Result<FontRef, String> {
        let index = self.tt_fonts.len();
        let font = TrueTypeFont::from_bytes(data, &format!("TT{}", index + 1))?;
        let id = self.alloc_id();
        self.tt_fonts.push(font);
        self.tt_font_ids.push(id);
        Ok(FontRef::TrueType(TrueTypeFontId(index)))
    }

    /// Register a TrueType font from a `.ttf` file.
    pub fn load_font_file<P: AsRef<Path>>(&mut self, path: P) -> Result<FontRef, String> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        self.load_font_bytes(data).map_err(|e| format!("{}: {}", path.display(), e))
    }

    /// Width of `text` in points.
    pub fn measure_text(&self, text: &str, style: &TextStyle) -> f64 {
        fonts::measure_word(text, style, &self.tt_fonts)
    }

    /// Begin a new page of the given size in points. An open page is
    /// closed first.
    pub fn begin_page(&mut self, width: f64, height: f64) -> io::Result<&mut Self> {
        if self.current_page.is_some() {
            self.end_page()?;
        }
        self.current_page = Some(PageBuilder {
            width,
            height,
            content_ops: Vec::new(),
            fonts: BTreeSet::new(),
        });
        Ok(self)
    }

    /// Pages finished so far plus the open one, if any.
    pub fn page_count(&self) -> usize {
        self.page_obj_ids.len() + usize::from(self.current_page.is_some())
    }

    fn page_mut(&mut self) -> io::Result<&mut PageBuilder> {
        self.current_page
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "no open page"))
    }

    /// Draw `text` with its baseline starting at (x, y).
    pub fn place_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let (resource, encoded) = match style.font {
            FontRef::Builtin(b) => (b.pdf_name().to_string(), format!("({})", fonts::encode_winansi(text))),
            FontRef::TrueType(id) => {
                let font = self
                    .tt_fonts
                    .get_mut(id.0)
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "unknown TrueType font"))?;
                (font.pdf_name.clone(), font.encode_text_hex(text))
            }
        };
        let page = self.page_mut()?;
        page.fonts.insert(style.font);
        let ops = format!(
            "BT\n/{} {} Tf\n{} {} Td\n{} Tj\nET\n",
            resource,
            format_coord(style.font_size),
            format_coord(x),
            format_coord(y),
            encoded,
        );
        page.content_ops.extend_from_slice(ops.as_bytes());
        Ok(())
    }

    /// Stroke a straight line.
    pub fn stroke_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, line_width: f64) -> io::Result<()> {
        let ops = format!(
            "{} w\n{} {} m\n{} {} l\nS\n",
            format_coord(line_width),
            format_coord(x1),
            format_coord(y1),
            format_coord(x2),
            format_coord(y2),
        );
        self.page_mut()?.content_ops.extend_from_slice(ops.as_bytes());
        Ok(())
    }

    /// Stroke a rectangle whose lower-left corner is (x, y).
    pub fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64, line_width: f64) -> io::Result<()> {
        let ops = format!(
            "{} w\n{} {} {} {} re\nS\n",
            format_coord(line_width),
            format_coord(x),
            format_coord(y),
            format_coord(width),
            format_coord(height),
        );
        self.page_mut()?.content_ops.extend_from_slice(ops.as_bytes());
        Ok(())
    }

    fn font_resource(&mut self, font: FontRef) -> (String, ObjId) {
        match font {
            FontRef::Builtin(b) => {
                let id = match self.builtin_fonts.get(&b).copied() {
                    Some(id) => id,
                    None => {
                        let id = self.alloc_id();
                        self.builtin_fonts.insert(b, id);
                        id
                    }
                };
                (b.pdf_name().to_string(), id)
            }
            FontRef::TrueType(id) => (self.tt_fonts[id.0].pdf_name.clone(), self.tt_font_ids[id.0]),
        }
    }

    /// End the current page: write its content stream and page
    /// dictionary, then drop the content from memory.
    pub fn end_page(&mut self) -> io::Result<()> {
        let page = self
            .current_page
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "end_page called with no open page"))?;

        let font_entries: Vec<(String, PdfObject)> = page
            .fonts
            .iter()
            .map(|&f| {
                let (name, id) = self.font_resource(f);
                (name, PdfObject::Reference(id))
            })
            .collect();

        let content_id = self.alloc_id();
        let page_id = self.alloc_id();

        let content = PdfObject::stream_maybe_compressed(vec![], page.content_ops, self.compress)?;
        self.writer.write_object(content_id, &content)?;

        let page_dict = PdfObject::dict(vec![
            ("Type", PdfObject::name("Page")),
            ("Parent", PdfObject::Reference(PAGES_OBJ)),
            (
                "MediaBox",
                PdfObject::Array(vec![
                    PdfObject::Integer(0),
                    PdfObject::Integer(0),
                    PdfObject::Real(page.width),
                    PdfObject::Real(page.height),
                ]),
            ),
            ("Contents", PdfObject::Reference(content_id)),
            (
                "Resources",
                PdfObject::dict(vec![("Font", PdfObject::Dictionary(font_entries))]),
            ),
        ]);
        self.writer.write_object(page_id, &page_dict)?;
        self.page_obj_ids.push(page_id);
        Ok(())
    }

    /// Finish the document: fonts, info, page tree, catalog, xref and
    /// trailer. Returns the underlying writer.
    pub fn end_document(mut self) -> io::Result<W> {
        if self.current_page.is_some() {
            self.end_page()?;
        }

        let builtin: Vec<(BuiltinFont, ObjId)> = self.builtin_fonts.iter().map(|(&b, &id)| (b, id)).collect();
        for (font, id) in builtin {
            let dict = PdfObject::dict(vec![
                ("Type", PdfObject::name("Font")),
                ("Subtype", PdfObject::name("Type1")),
                ("BaseFont", PdfObject::name(font.pdf_base_name())),
                ("Encoding", PdfObject::name("WinAnsiEncoding")),
            ]);
            self.writer.write_object(id, &dict)?;
        }

        for index in 0..self.tt_fonts.len() {
            let ids = EmbedIds {
                type0: self.tt_font_ids[index],
                cid_font: self.alloc_id(),
                descriptor: self.alloc_id(),
                font_file: self.alloc_id(),
                to_unicode: self.alloc_id(),
            };
            for (id, obj) in self.tt_fonts[index].embed_objects(ids, self.compress)? {
                self.writer.write_object(id, &obj)?;
            }
        }

        let info_id = if self.info.is_empty() {
            None
        } else {
            let id = self.alloc_id();
            let entries = self
                .info
                .iter()
                .map(|(k, v)| (k.as_str(), PdfObject::text_string(v)))
                .collect();
            self.writer.write_object(id, &PdfObject::dict(entries))?;
            Some(id)
        };

        let kids = self.page_obj_ids.iter().map(|&id| PdfObject::Reference(id)).collect();
        let pages = PdfObject::dict(vec![
            ("Type", PdfObject::name("Pages")),
            ("Kids", PdfObject::Array(kids)),
            ("Count", PdfObject::Integer(self.page_obj_ids.len() as i64)),
        ]);
        self.writer.write_object(PAGES_OBJ, &pages)?;

        let catalog = PdfObject::dict(vec![
            ("Type", PdfObject::name("Catalog")),
            ("Pages", PdfObject::Reference(PAGES_OBJ)),
        ]);
        self.writer.write_object(CATALOG_OBJ, &catalog)?;

        self.writer.write_xref_and_trailer(CATALOG_OBJ, info_id)?;
        Ok(self.writer.into_inner())
    }
}

/// Format a coordinate for content streams: integers stay bare, other
/// values keep up to four decimals.
pub(crate) fn format_coord(v: f64) -> String {
    if v == v.floor() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.4}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
