//! Variable-height table rows.
//!
//! Every column of a row is wrapped against its own width first. The
//! tallest column decides the row's line count, and the other columns
//! are padded with blank lines up to it, so all cells of a row share one
//! height and their borders line up.

use std::io::Write;

use expo_pdf::{Advance, Align, Border, FontStyle, RenderContext, WrapMode};

use crate::error::{InvoiceError, Result};

/// One table row before wrapping.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub styles: Vec<FontStyle>,
    pub aligns: Vec<Align>,
    pub border: Border,
    /// Height of one wrapped line, in points.
    pub line_height: f64,
    pub font_size: f64,
    pub wrap: WrapMode,
}

impl TableRow {
    /// Regular, left-aligned, borderless cells that wrap at any character.
    pub fn new<S: Into<String>>(cells: impl IntoIterator<Item = S>, line_height: f64, font_size: f64) -> Self {
        let cells: Vec<String> = cells.into_iter().map(Into::into).collect();
        let n = cells.len();
        TableRow {
            cells,
            styles: vec![FontStyle::Regular; n],
            aligns: vec![Align::Left; n],
            border: Border::None,
            line_height,
            font_size,
            wrap: WrapMode::Char,
        }
    }

    pub fn styles(mut self, styles: impl Into<Vec<FontStyle>>) -> Self {
        self.styles = styles.into();
        self
    }

    pub fn aligns(mut self, aligns: impl Into<Vec<Align>>) -> Self {
        self.aligns = aligns.into();
        self
    }

    pub fn border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    pub fn wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }
}

/// Dry-run line breaking, with the same metrics used for drawing.
pub trait TextMeasure {
    /// Lines `text` occupies in a cell `width` points wide.
    fn wrap_cell(&self, width: f64, text: &str, style: FontStyle, font_size: f64, mode: WrapMode) -> Vec<String>;
}

impl<W: Write> TextMeasure for RenderContext<W> {
    fn wrap_cell(&self, width: f64, text: &str, style: FontStyle, font_size: f64, mode: WrapMode) -> Vec<String> {
        self.wrap_lines(width, text, style, font_size, mode)
    }
}

/// A measured row: every column holds exactly `line_count` lines.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    columns: Vec<Vec<String>>,
    line_count: usize,
    line_height: f64,
}

impl RowLayout {
    pub fn measure<M: TextMeasure + ?Sized>(measurer: &M, widths: &[f64], row: &TableRow) -> Result<Self> {
        validate(widths, row)?;

        let mut columns: Vec<Vec<String>> = widths
            .iter()
            .zip(&row.cells)
            .zip(&row.styles)
            .map(|((&w, text), &style)| measurer.wrap_cell(w, text, style, row.font_size, row.wrap))
            .collect();

        let line_count = columns.iter().map(Vec::len).max().unwrap_or(0).max(1);
        for lines in &mut columns {
            lines.resize(line_count, String::new());
        }
        log::trace!("row measured at {} line(s)", line_count);

        Ok(RowLayout {
            columns,
            line_count,
            line_height: row.line_height,
        })
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn height(&self) -> f64 {
        self.line_count as f64 * self.line_height
    }

    pub fn columns(&self) -> &[Vec<String>] {
        &self.columns
    }
}

fn validate(widths: &[f64], row: &TableRow) -> Result<()> {
    let n = row.cells.len();
    if widths.len() != n {
        return Err(InvoiceError::Configuration(format!(
            "{} column widths for {} cells",
            widths.len(),
            n
        )));
    }
    if row.styles.len() != n || row.aligns.len() != n {
        return Err(InvoiceError::Configuration(format!(
            "{} cells with {} font styles and {} alignments",
            n,
            row.styles.len(),
            row.aligns.len()
        )));
    }
    if let Some(w) = widths.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
        return Err(InvoiceError::Configuration(format!("column width must be positive, got {}", w)));
    }
    if !(row.line_height.is_finite() && row.line_height > 0.0) {
        return Err(InvoiceError::Configuration(format!(
            "line height must be positive, got {}",
            row.line_height
        )));
    }
    Ok(())
}

/// Measure `row`, move to a new page first if it does not fit, then
/// draw each column as a block of the common height. The cursor ends at
/// the left margin below the row.
pub fn render_row<W: Write>(ctx: &mut RenderContext<W>, widths: &[f64], row: &TableRow) -> Result<RowLayout> {
    let layout = RowLayout::measure(&*ctx, widths, row)?;
    ctx.ensure_space(layout.height())?;
    draw(ctx, widths, row, &layout)?;
    Ok(layout)
}

/// Like [`render_row`] for consecutive rows that must share a page: the
/// page break, if any, happens before the first of them.
pub fn render_rows_together<W: Write>(
    ctx: &mut RenderContext<W>,
    widths: &[f64],
    rows: &[TableRow],
) -> Result<Vec<RowLayout>> {
    let layouts = rows
        .iter()
        .map(|row| RowLayout::measure(&*ctx, widths, row))
        .collect::<Result<Vec<_>>>()?;
    ctx.ensure_space(layouts.iter().map(RowLayout::height).sum())?;
    for (row, layout) in rows.iter().zip(&layouts) {
        draw(ctx, widths, row, layout)?;
    }
    Ok(layouts)
}

fn draw<W: Write>(ctx: &mut RenderContext<W>, widths: &[f64], row: &TableRow, layout: &RowLayout) -> Result<()> {
    let last = widths.len().saturating_sub(1);
    for (i, lines) in layout.columns.iter().enumerate() {
        let advance = if i == last { Advance::NextLine } else { Advance::Right };
        ctx.set_font(row.styles[i], row.font_size);
        ctx.multi_cell_lines(widths[i], row.line_height, lines, row.border, row.aligns[i], advance)?;
    }
    Ok(())
}
