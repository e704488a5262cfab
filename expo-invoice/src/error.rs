use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("unsupported input format: {} (expected .csv or .xlsx)", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("record {row}: missing field {field:?}")]
    FieldMissing { field: String, row: usize },

    #[error("invalid {field}{}: {value:?} ({reason})", record_suffix(.row))]
    Format {
        field: String,
        value: String,
        reason: String,
        row: Option<usize>,
    },

    /// Layout misconfiguration. Indicates a bug, not bad input.
    #[error("layout configuration error: {0}")]
    Configuration(String),

    #[error("invalid configuration file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("font error: {0}")]
    Font(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
}

fn record_suffix(row: &Option<usize>) -> String {
    row.map(|r| format!(" in record {}", r)).unwrap_or_default()
}

impl InvoiceError {
    pub(crate) fn format(field: &str, value: impl Into<String>, reason: &str) -> Self {
        InvoiceError::Format {
            field: field.to_string(),
            value: value.into(),
            reason: reason.to_string(),
            row: None,
        }
    }

    /// Attach a record number to a format error raised without one.
    pub(crate) fn at_row(self, record: usize) -> Self {
        match self {
            InvoiceError::Format { field, value, reason, row: None } => InvoiceError::Format {
                field,
                value,
                reason,
                row: Some(record),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, InvoiceError>;
