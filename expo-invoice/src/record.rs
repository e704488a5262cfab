//! Ingestion of booking exports into flat records.
//!
//! The input kind is decided once from the file extension; after that
//! the rest of the pipeline only sees [`Record`]s.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{InvoiceError, Result};
use crate::schema::normalize_header;

/// One data row: header name -> cell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    row: usize,
    fields: HashMap<String, String>,
    /// Header columns this row was too short to fill.
    unfilled: Vec<String>,
}

impl Record {
    /// `row` is the 1-based position among data rows.
    pub fn new<K, V>(row: usize, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Record {
            row,
            fields: fields
                .into_iter()
                .map(|(k, v)| (normalize_header(k.as_ref()), v.into()))
                .collect(),
            unfilled: Vec::new(),
        }
    }

    /// Pair `values` with `headers` in order. Headers left over when the
    /// row runs out of values are remembered as present but unfilled.
    pub fn from_row<H, V>(row: usize, headers: &[H], values: impl IntoIterator<Item = V>) -> Self
    where
        H: AsRef<str>,
        V: Into<String>,
    {
        let mut values = values.into_iter();
        let mut fields = HashMap::with_capacity(headers.len());
        let mut unfilled = Vec::new();
        for header in headers {
            let name = normalize_header(header.as_ref());
            match values.next() {
                Some(value) => {
                    fields.insert(name, value.into());
                }
                None => unfilled.push(name),
            }
        }
        Record { row, fields, unfilled }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Whether the source has a column named `field`, even if this row
    /// holds no value for it.
    pub fn has_column(&self, field: &str) -> bool {
        self.fields.contains_key(field) || self.unfilled.iter().any(|name| name == field)
    }

    /// The field's value, or `FieldMissing` when the row has none.
    pub fn require(&self, field: &str) -> Result<&str> {
        self.get(field).ok_or_else(|| InvoiceError::FieldMissing {
            field: field.to_string(),
            row: self.row,
        })
    }
}

/// A tabular source of booking records.
pub trait RecordSource {
    /// Read every data row, in input order.
    fn read_records(&mut self) -> Result<Vec<Record>>;
}

/// Input kinds, selected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    DelimitedText,
    Spreadsheet,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(SourceKind::DelimitedText),
            Some("xlsx") => Ok(SourceKind::Spreadsheet),
            _ => Err(InvoiceError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Open the right source for `path`. Fails with `UnsupportedFormat`
/// before touching the file when the extension is not recognised.
pub fn open_source(path: &Path, delimiter: u8) -> Result<Box<dyn RecordSource>> {
    let kind = SourceKind::from_path(path)?;
    log::debug!("reading {} as {:?}", path.display(), kind);
    Ok(match kind {
        SourceKind::DelimitedText => Box::new(CsvSource::new(File::open(path)?, delimiter)),
        SourceKind::Spreadsheet => Box::new(SpreadsheetSource::new(path)),
    })
}

/// Character-separated text with a header row. A leading byte-order
/// mark is dropped from the first header.
pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CsvSource<R> {
    pub fn new(input: R, delimiter: u8) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(input);
        CsvSource { reader }
    }
}

impl<R: Read> RecordSource for CsvSource<R> {
    fn read_records(&mut self) -> Result<Vec<Record>> {
        let headers: Vec<String> = self.reader.headers()?.iter().map(str::to_string).collect();
        let mut records = Vec::new();
        for (index, row) in self.reader.records().enumerate() {
            let row = row?;
            records.push(Record::from_row(index + 1, headers.as_slice(), row.iter()));
        }
        log::debug!("read {} CSV records", records.len());
        Ok(records)
    }
}

/// First worksheet of a workbook; its first row holds the headers.
pub struct SpreadsheetSource {
    path: PathBuf,
}

impl SpreadsheetSource {
    pub fn new(path: &Path) -> Self {
        SpreadsheetSource {
            path: path.to_path_buf(),
        }
    }
}

impl RecordSource for SpreadsheetSource {
    fn read_records(&mut self) -> Result<Vec<Record>> {
        let mut workbook = open_workbook_auto(&self.path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(calamine::Error::Msg("workbook has no worksheet"))??;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(cells) => cells.iter().map(cell_text).collect(),
            None => return Ok(Vec::new()),
        };
        // Numbered before blank rows are dropped so rows match the sheet.
        let records: Vec<Record> = rows
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(|c| !matches!(c, Data::Empty)))
            .map(|(index, cells)| Record::from_row(index + 1, headers.as_slice(), cells.iter().map(cell_text)))
            .collect();
        log::debug!("read {} spreadsheet records", records.len());
        Ok(records)
    }
}

/// Text of a spreadsheet cell as the CSV export would show it: whole
/// numbers without a fraction, dates as `dd/mm/yyyy HH:MM`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%d/%m/%Y %H:%M").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        other => other.to_string(),
    }
}
