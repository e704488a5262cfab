//! Invoice documents from ticketing booking exports.
//!
//! Records are read from a CSV or XLSX export, grouped by billing
//! recipient and rendered into paginated PDF invoices through
//! [`expo_pdf`].

pub mod compose;
pub mod config;
pub mod error;
pub mod format;
pub mod grouping;
pub mod layout;
pub mod model;
pub mod output;
pub mod record;
pub mod schema;

use std::fs;
use std::path::Path;

use chrono::NaiveDate;

pub use compose::{ComposeOptions, CompositionState, FontSource, GroupSummary, InvoiceComposer, InvoiceDecorator};
pub use config::Config;
pub use error::{InvoiceError, Result};
pub use format::{format_booking_number, format_price, BookingFormat, PriceFormat};
pub use grouping::{group_records, BillingRules};
pub use layout::{render_row, render_rows_together, RowLayout, TableRow, TextMeasure};
pub use model::{Address, LineItem, RecipientGroup};
pub use output::{write_documents, OutputMode, WrittenDocument};
pub use record::{open_source, CsvSource, Record, RecordSource, SpreadsheetSource};

/// Read `input`, group it and write the invoices described by `config`.
/// `run_date` names the combined document.
pub fn generate_invoices(input: &Path, config: &Config, run_date: NaiveDate) -> Result<Vec<WrittenDocument>> {
    let mut source = open_source(input, config.delimiter()?)?;
    let records = source.read_records()?;
    let groups = group_records(&records, &config.billing_rules())?;

    fs::create_dir_all(&config.output.directory)?;
    write_documents(
        &groups,
        &config.compose_options(),
        config.output.mode,
        &config.output.directory,
        run_date,
    )
}
