use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;

/// Object identifier: (object_number, generation_number).
/// Generation is always 0 for documents written here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub u32, pub u16);

/// The subset of PDF object types (PDF 32000-1:2008 §7.3) that the
/// invoice documents need.
#[derive(Debug, Clone)]
pub enum PdfObject {
    Integer(i64),
    Real(f64),
    /// Stored without the leading `/`.
    Name(String),
    /// Stored without the enclosing parens; escaped on output.
    LiteralString(String),
    /// Raw bytes, written as `<...>`.
    HexString(Vec<u8>),
    Array(Vec<PdfObject>),
    /// Key-value pairs. Vec keeps the output order deterministic.
    Dictionary(Vec<(String, PdfObject)>),
    Stream {
        dict: Vec<(String, PdfObject)>,
        data: Vec<u8>,
    },
    Reference(ObjId),
}

impl PdfObject {
    pub fn name(s: &str) -> Self {
        PdfObject::Name(s.to_string())
    }

    pub fn literal_string(s: &str) -> Self {
        PdfObject::LiteralString(s.to_string())
    }

    /// A text string for metadata. ASCII stays a literal string, anything
    /// else becomes UTF-16BE with a byte-order mark.
    pub fn text_string(s: &str) -> Self {
        if s.is_ascii() {
            return Self::literal_string(s);
        }
        let mut bytes = vec![0xFE, 0xFF];
        for unit in s.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        PdfObject::HexString(bytes)
    }

    pub fn dict(entries: Vec<(&str, PdfObject)>) -> Self {
        PdfObject::Dictionary(owned_entries(entries))
    }

    pub fn stream(dict_entries: Vec<(&str, PdfObject)>, data: Vec<u8>) -> Self {
        PdfObject::Stream {
            dict: owned_entries(dict_entries),
            data,
        }
    }

    /// Build a stream, Flate-compressing `data` when `compress` is set.
    /// The `/Filter` entry is added automatically.
    pub fn stream_maybe_compressed(
        mut dict_entries: Vec<(&str, PdfObject)>,
        data: Vec<u8>,
        compress: bool,
    ) -> io::Result<Self> {
        if !compress {
            return Ok(Self::stream(dict_entries, data));
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data)?;
        let packed = encoder.finish()?;
        dict_entries.push(("Filter", PdfObject::name("FlateDecode")));
        Ok(Self::stream(dict_entries, packed))
    }
}

fn owned_entries(entries: Vec<(&str, PdfObject)>) -> Vec<(String, PdfObject)> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Low-level PDF serializer. Tracks byte offsets of every indirect
/// object so the xref table can be written at the end.
pub struct PdfWriter<W: Write> {
    writer: W,
    offset: usize,
    xref_entries: Vec<(u32, usize)>,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(writer: W) -> Self {
        PdfWriter {
            writer,
            offset: 0,
            xref_entries: Vec::new(),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.offset += data.len();
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// PDF 1.7 header followed by the binary marker comment.
    pub fn write_header(&mut self) -> io::Result<()> {
        self.write_str("%PDF-1.7\n")?;
        self.write_bytes(b"%\xe2\xe3\xcf\xd3\n")
    }

    /// Write an indirect object and remember where it starts.
    pub fn write_object(&mut self, id: ObjId, obj: &PdfObject) -> io::Result<()> {
        self.xref_entries.push((id.0, self.offset));
        self.write_str(&format!("{} {} obj\n", id.0, id.1))?;
        self.write_value(obj)?;
        self.write_str("\nendobj\n")
    }

    fn write_entries(&mut self, entries: &[(String, PdfObject)]) -> io::Result<()> {
        for (key, val) in entries {
            self.write_str(" /")?;
            self.write_str(key)?;
            self.write_str(" ")?;
            self.write_value(val)?;
        }
        Ok(())
    }

    fn write_value(&mut self, obj: &PdfObject) -> io::Result<()> {
        match obj {
            PdfObject::Integer(n) => self.write_str(&n.to_string()),
            PdfObject::Real(f) => self.write_str(&format_real(*f)),
            PdfObject::Name(name) => {
                self.write_str("/")?;
                self.write_str(name)
            }
            PdfObject::LiteralString(s) => {
                self.write_str("(")?;
                self.write_str(&escape_pdf_string(s))?;
                self.write_str(")")
            }
            PdfObject::HexString(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                self.write_str(&format!("<{}>", hex))
            }
            PdfObject::Array(items) => {
                self.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write_str(" ")?;
                    }
                    self.write_value(item)?;
                }
                self.write_str("]")
            }
            PdfObject::Dictionary(entries) => {
                self.write_str("<<")?;
                self.write_entries(entries)?;
                self.write_str(" >>")
            }
            PdfObject::Stream { dict, data } => {
                self.write_str("<<")?;
                self.write_entries(dict)?;
                self.write_str(&format!(" /Length {} >>\nstream\n", data.len()))?;
                self.write_bytes(data)?;
                self.write_str("\nendstream")
            }
            PdfObject::Reference(id) => self.write_str(&format!("{} {} R", id.0, id.1)),
        }
    }

    /// Write the xref table, trailer, startxref and `%%EOF`.
    pub fn write_xref_and_trailer(&mut self, root_id: ObjId, info_id: Option<ObjId>) -> io::Result<()> {
        let xref_offset = self.offset;
        self.xref_entries.sort_by_key(|&(num, _)| num);
        let size = self.xref_entries.last().map_or(0, |&(num, _)| num) + 1;

        self.write_str(&format!("xref\n0 {}\n", size))?;
        // Every entry is exactly 20 bytes, CRLF terminated.
        self.write_bytes(b"0000000000 65535 f\r\n")?;

        let mut entries = std::mem::take(&mut self.xref_entries).into_iter().peekable();
        for obj_num in 1..size {
            match entries.peek() {
                Some(&(num, off)) if num == obj_num => {
                    entries.next();
                    self.write_str(&format!("{:010} 00000 n\r\n", off))?;
                }
                _ => self.write_bytes(b"0000000000 00000 f\r\n")?,
            }
        }

        self.write_str(&format!("trailer\n<< /Size {} /Root {} {} R", size, root_id.0, root_id.1))?;
        if let Some(info) = info_id {
            self.write_str(&format!(" /Info {} {} R", info.0, info.1))?;
        }
        self.write_str(" >>\n")?;
        self.write_str(&format!("startxref\n{}\n%%EOF\n", xref_offset))?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Escape the delimiters of a PDF literal string.
pub fn escape_pdf_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '(' => result.push_str("\\("),
            ')' => result.push_str("\\)"),
            _ => result.push(c),
        }
    }
    result
}

/// Reals never use scientific notation and keep at least one decimal.
fn format_real(f: f64) -> String {
    if f == f.floor() && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        let s = format!("{:.6}", f);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
