//! Cursor-based page composition on top of [`PdfDocument`].
//!
//! Coordinates here run from the top-left corner of the page, y
//! growing downwards, in points. Content is laid out as cells: a cell
//! is a box of a given width and line height at the cursor, optionally
//! bordered, with one or more lines of text inside. Drawing a cell
//! moves the cursor to the right of it or to the start of the next
//! line.

use std::io::{self, Write};
use std::rc::Rc;

use crate::document::PdfDocument;
use crate::fonts::{FontFamily, FontStyle, TextStyle};
use crate::wrap::{wrap_text, WrapMode};

/// Points per millimetre.
pub const MM: f64 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    /// Distance from the bottom edge at which content breaks to a new page.
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
}

impl PageSetup {
    /// A4 portrait.
    pub fn a4(margins: Margins) -> Self {
        PageSetup {
            width: 210.0 * MM,
            height: 297.0 * MM,
            margins,
        }
    }

    /// Width between the left and right margins.
    pub fn content_width(&self) -> f64 {
        self.width - self.margins.left - self.margins.right
    }

    fn break_trigger(&self) -> f64 {
        self.height - self.margins.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Which edges of a cell are stroked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Border {
    #[default]
    None,
    /// Only the bottom edge of the cell block.
    Bottom,
    /// All four edges.
    Full,
}

/// Where the cursor goes after a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Right edge of the cell, same top.
    Right,
    /// Left margin, just below the cell.
    NextLine,
}

/// Hooks the context calls when a page starts and ends.
///
/// The header runs right after a page is created and may move the
/// cursor; the body starts wherever the header leaves it. The footer
/// runs right before a page is closed. The current font is restored
/// after each hook, and automatic page breaks are disabled inside them.
pub trait PageDecorator<W: Write> {
    fn header(&self, ctx: &mut RenderContext<W>) -> io::Result<()> {
        let _ = ctx;
        Ok(())
    }

    fn footer(&self, ctx: &mut RenderContext<W>) -> io::Result<()> {
        let _ = ctx;
        Ok(())
    }
}

/// All mutable page state for one output document: current page,
/// cursor, font and page numbering.
///
/// The context owns its [`PdfDocument`]; `finish()` closes the last
/// page and hands the writer back.
pub struct RenderContext<W: Write> {
    doc: PdfDocument<W>,
    setup: PageSetup,
    family: FontFamily,
    font_style: FontStyle,
    font_size: f64,
    x: f64,
    y: f64,
    body_top: f64,
    page_no: usize,
    section_start: usize,
    page_open: bool,
    decorating: bool,
    decorator: Option<Rc<dyn PageDecorator<W>>>,
    cell_margin: f64,
    line_width: f64,
}

impl<W: Write> RenderContext<W> {
    pub fn new(doc: PdfDocument<W>, setup: PageSetup) -> Self {
        RenderContext {
            doc,
            setup,
            family: FontFamily::helvetica(),
            font_style: FontStyle::Regular,
            font_size: 12.0,
            x: setup.margins.left,
            y: setup.margins.top,
            body_top: setup.margins.top,
            page_no: 0,
            section_start: 1,
            page_open: false,
            decorating: false,
            decorator: None,
            cell_margin: MM,
            line_width: 0.2 * MM,
        }
    }

    pub fn set_family(&mut self, family: FontFamily) {
        self.family = family;
    }

    pub fn set_decorator(&mut self, decorator: Rc<dyn PageDecorator<W>>) {
        self.decorator = Some(decorator);
    }

    pub fn document_mut(&mut self) -> &mut PdfDocument<W> {
        &mut self.doc
    }

    pub fn set_font(&mut self, style: FontStyle, size: f64) {
        self.font_style = style;
        self.font_size = size;
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// The concrete font the next text will be drawn with.
    pub fn text_style(&self) -> TextStyle {
        self.style_for(self.font_style, self.font_size)
    }

    fn style_for(&self, style: FontStyle, size: f64) -> TextStyle {
        TextStyle {
            font: self.family.face(style),
            font_size: size,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    /// Move to `y` and back to the left margin. Negative values count
    /// from the bottom edge of the page.
    pub fn set_y(&mut self, y: f64) {
        self.x = self.setup.margins.left;
        self.y = if y >= 0.0 { y } else { self.setup.height + y };
    }

    /// Line break: left margin, `h` further down.
    pub fn ln(&mut self, h: f64) {
        self.x = self.setup.margins.left;
        self.y += h;
    }

    /// Absolute number of the current page, starting at 1.
    pub fn page_no(&self) -> usize {
        self.page_no
    }

    /// Page number relative to the last `begin_section()`.
    pub fn section_page_no(&self) -> usize {
        self.page_no + 1 - self.section_start
    }

    /// Close the open page, if any, and start a new one.
    pub fn add_page(&mut self) -> io::Result<()> {
        if self.page_open {
            self.close_page()?;
        }
        self.doc.begin_page(self.setup.width, self.setup.height)?;
        self.page_open = true;
        self.page_no += 1;
        self.x = self.setup.margins.left;
        self.y = self.setup.margins.top;
        log::debug!("page {} started", self.page_no);
        self.run_decorator(false)?;
        self.body_top = self.y;
        Ok(())
    }

    /// Start a new page that restarts section page numbering at 1.
    pub fn begin_section(&mut self) -> io::Result<()> {
        self.add_page()?;
        self.section_start = self.page_no;
        Ok(())
    }

    fn close_page(&mut self) -> io::Result<()> {
        self.run_decorator(true)?;
        self.doc.end_page()?;
        self.page_open = false;
        Ok(())
    }

    fn run_decorator(&mut self, footer: bool) -> io::Result<()> {
        let Some(decorator) = self.decorator.clone() else {
            return Ok(());
        };
        let saved = (self.font_style, self.font_size);
        self.decorating = true;
        let result = if footer {
            decorator.footer(self)
        } else {
            decorator.header(self)
        };
        self.decorating = false;
        (self.font_style, self.font_size) = saved;
        result
    }

    /// Whether a block of height `h` fits above the page-break line.
    pub fn fits(&self, h: f64) -> bool {
        self.decorating || self.y + h <= self.setup.break_trigger()
    }

    /// Break to a new page when a block of height `h` would cross the
    /// page-break line. The horizontal position is kept. Returns whether
    /// a break happened.
    pub fn ensure_space(&mut self, h: f64) -> io::Result<bool> {
        if self.fits(h) || self.y <= self.body_top {
            return Ok(false);
        }
        let body = self.setup.break_trigger() - self.body_top;
        if h > body {
            log::warn!("block of {:.1}pt is taller than the page body ({:.1}pt)", h, body);
        }
        let x = self.x;
        self.add_page()?;
        self.x = x;
        log::debug!("automatic page break to page {}", self.page_no);
        Ok(true)
    }

    fn resolve_width(&self, w: f64) -> f64 {
        if w > 0.0 {
            w
        } else {
            self.setup.width - self.setup.margins.right - self.x
        }
    }

    /// Wrap `text` for a cell of width `w` without drawing anything.
    /// `w == 0` extends the cell to the right margin.
    pub fn wrap(&self, w: f64, text: &str, mode: WrapMode) -> Vec<String> {
        self.wrap_lines(self.resolve_width(w), text, self.font_style, self.font_size, mode)
    }

    /// Dry-run wrap of `text` for a cell of width `w` in an explicit
    /// face and size, leaving the current font untouched.
    pub fn wrap_lines(&self, w: f64, text: &str, style: FontStyle, size: f64, mode: WrapMode) -> Vec<String> {
        let text_style = self.style_for(style, size);
        let avail = (w - 2.0 * self.cell_margin).max(0.0);
        wrap_text(text, avail, mode, |s| self.doc.measure_text(s, &text_style))
    }

    /// A single-line cell. `w == 0` extends it to the right margin.
    pub fn cell(&mut self, w: f64, h: f64, text: &str, border: Border, align: Align, advance: Advance) -> io::Result<()> {
        let w = self.resolve_width(w);
        self.ensure_space(h)?;
        let (x, y) = (self.x, self.y);
        self.draw_border(x, y, w, h, border)?;
        self.draw_line(x, y, w, h, text, align)?;
        self.advance(w, h, advance);
        Ok(())
    }

    /// Wrap `text` and draw it as a block of `h`-high lines. Returns
    /// the number of lines drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn multi_cell(
        &mut self,
        w: f64,
        h: f64,
        text: &str,
        border: Border,
        align: Align,
        advance: Advance,
        mode: WrapMode,
    ) -> io::Result<usize> {
        let w = self.resolve_width(w);
        let lines = self.wrap(w, text, mode);
        self.multi_cell_lines(w, h, &lines, border, align, advance)?;
        Ok(lines.len())
    }

    /// Draw pre-wrapped lines as one block. The block is kept on one
    /// page; empty lines still take their full height.
    pub fn multi_cell_lines(
        &mut self,
        w: f64,
        h: f64,
        lines: &[String],
        border: Border,
        align: Align,
        advance: Advance,
    ) -> io::Result<()> {
        let w = self.resolve_width(w);
        let total = h * lines.len().max(1) as f64;
        self.ensure_space(total)?;
        let (x, top) = (self.x, self.y);
        for (i, line) in lines.iter().enumerate() {
            self.draw_line(x, top + i as f64 * h, w, h, line, align)?;
        }
        self.draw_border(x, top, w, total, border)?;
        self.advance(w, total, advance);
        Ok(())
    }

    fn advance(&mut self, w: f64, h: f64, advance: Advance) {
        match advance {
            Advance::Right => self.x += w,
            Advance::NextLine => {
                self.x = self.setup.margins.left;
                self.y += h;
            }
        }
    }

    /// Text is vertically centred in its line box.
    fn draw_line(&mut self, x: f64, top: f64, w: f64, h: f64, text: &str, align: Align) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let style = self.text_style();
        let text_w = self.doc.measure_text(text, &style);
        let text_x = match align {
            Align::Left => x + self.cell_margin,
            Align::Center => x + (w - text_w) / 2.0,
            Align::Right => x + w - self.cell_margin - text_w,
        };
        let baseline = top + 0.5 * h + 0.3 * style.font_size;
        self.doc.place_text(text, text_x, self.setup.height - baseline, &style)
    }

    fn draw_border(&mut self, x: f64, top: f64, w: f64, h: f64, border: Border) -> io::Result<()> {
        let bottom = self.setup.height - (top + h);
        match border {
            Border::None => Ok(()),
            Border::Bottom => self.doc.stroke_line(x, bottom, x + w, bottom, self.line_width),
            Border::Full => self.doc.stroke_rect(x, bottom, w, h, self.line_width),
        }
    }

    /// Close the last page (running its footer) and finish the document.
    pub fn finish(mut self) -> io::Result<W> {
        if self.page_open {
            self.close_page()?;
        }
        self.doc.end_document()
    }
}
