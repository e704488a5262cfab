//! Invoice page composition.
//!
//! A [`InvoiceComposer`] owns one output document. Each recipient group
//! is composed as its own section: it starts on a fresh page, prints the
//! billing address, the item table and the total, and its footers count
//! pages from the start of the section.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use expo_pdf::{
    Advance, Align, Border, FontFamily, FontStyle, Margins, PageDecorator, PageSetup, PdfDocument, RenderContext,
    WrapMode, MM,
};

use crate::error::{InvoiceError, Result};
use crate::format::{BookingFormat, PriceFormat};
use crate::grouping::BillingRules;
use crate::layout::{render_row, render_rows_together, RowLayout, TableRow};
use crate::model::{LineItem, RecipientGroup};

/// Table column widths: reference and date, responsible party, activity
/// and customer, price.
pub const COLUMN_WIDTHS_MM: [f64; 4] = [30.0, 68.0, 60.0, 25.0];

const HEADER_ROW_HEIGHT: f64 = 8.0 * MM;
const ITEM_ROW_HEIGHT: f64 = 6.0 * MM;
const BODY_LINE_HEIGHT: f64 = 5.0 * MM;

const FONT_SIZE_BANNER: f64 = 14.0;
const FONT_SIZE_FOOTER: f64 = 7.0;
const FONT_SIZE_TABLE_HEADER: f64 = 10.0;
const FONT_SIZE_TABLE_ROW: f64 = 8.0;
const FONT_SIZE_BODY: f64 = 10.0;

const CAPTIONS: [&str; 4] = ["Date / # Activité", "Responsable", "Nom", "Prix"];
const ALIGNS: [Align; 4] = [Align::Left, Align::Left, Align::Left, Align::Right];

pub const DEFAULT_TITLE: &str = "Relevé des visites organisées par le MNHN";

/// A4 portrait with the invoice margins. Content breaks to a new page
/// 20 mm above the bottom edge.
pub fn page_setup() -> PageSetup {
    PageSetup::a4(Margins {
        left: 16.0 * MM,
        top: 20.0 * MM,
        right: 16.0 * MM,
        bottom: 20.0 * MM,
    })
}

/// Banner on top of every page, section-relative page number at the
/// bottom.
pub struct InvoiceDecorator {
    title: String,
}

impl InvoiceDecorator {
    pub fn new(title: impl Into<String>) -> Self {
        InvoiceDecorator { title: title.into() }
    }
}

impl<W: Write> PageDecorator<W> for InvoiceDecorator {
    fn header(&self, ctx: &mut RenderContext<W>) -> std::io::Result<()> {
        ctx.set_font(FontStyle::Bold, FONT_SIZE_BANNER);
        ctx.cell(0.0, 10.0 * MM, &self.title, Border::Full, Align::Center, Advance::NextLine)?;
        ctx.ln(8.0 * MM);
        Ok(())
    }

    fn footer(&self, ctx: &mut RenderContext<W>) -> std::io::Result<()> {
        ctx.set_y(-15.0 * MM);
        ctx.set_font(FontStyle::Regular, FONT_SIZE_FOOTER);
        let label = format!("Page {}", ctx.section_page_no());
        ctx.cell(0.0, 10.0 * MM, &label, Border::None, Align::Right, Advance::Right)
    }
}

/// Where a document stands. Moves strictly forward; a composer that has
/// finished its total row may start another group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionState {
    Empty,
    PageStarted,
    AddressRendered,
    HeaderRowRendered,
    ItemRowPair,
    TotalRowRendered,
    DocumentFinalized,
}

impl CompositionState {
    fn can_move_to(self, next: CompositionState) -> bool {
        use CompositionState::*;
        matches!(
            (self, next),
            (Empty, PageStarted)
                | (PageStarted, AddressRendered)
                | (AddressRendered, HeaderRowRendered)
                | (HeaderRowRendered | ItemRowPair, ItemRowPair)
                | (HeaderRowRendered | ItemRowPair, TotalRowRendered)
                | (TotalRowRendered, PageStarted)
                | (Empty | TotalRowRendered, DocumentFinalized)
        )
    }
}

impl fmt::Display for CompositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Typeface source for a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FontSource {
    /// Helvetica from the standard 14 fonts. Nothing is embedded.
    #[default]
    Builtin,
    /// DejaVu Sans regular, bold and oblique from a directory, embedded
    /// in every document.
    TrueType { dir: PathBuf },
}

impl FontSource {
    const DEJAVU_FILES: [&'static str; 3] = ["DejaVuSans.ttf", "DejaVuSans-Bold.ttf", "DejaVuSans-Oblique.ttf"];

    pub fn install<W: Write>(&self, ctx: &mut RenderContext<W>) -> Result<()> {
        let FontSource::TrueType { dir } = self else {
            return Ok(());
        };
        let mut faces = Vec::with_capacity(3);
        for file in Self::DEJAVU_FILES {
            let face = ctx
                .document_mut()
                .load_font_file(dir.join(file))
                .map_err(InvoiceError::Font)?;
            faces.push(face);
        }
        ctx.set_family(FontFamily {
            regular: faces[0],
            bold: faces[1],
            italic: faces[2],
        });
        log::debug!("embedded fonts loaded from {}", dir.display());
        Ok(())
    }
}

/// Everything that shapes a document besides the data.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub title: String,
    pub fonts: FontSource,
    pub rules: BillingRules,
    pub price: PriceFormat,
    pub booking: BookingFormat,
    pub compress: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        ComposeOptions {
            title: DEFAULT_TITLE.to_string(),
            fonts: FontSource::default(),
            rules: BillingRules::default(),
            price: PriceFormat::default(),
            booking: BookingFormat::default(),
            compress: true,
        }
    }
}

/// What was drawn for one group.
#[derive(Debug, Clone)]
pub struct GroupSummary {
    pub recipient: String,
    pub items: usize,
    /// Pages the group spans.
    pub pages: usize,
    /// Layout of each item's first sub-row.
    pub item_rows: Vec<RowLayout>,
}

pub struct InvoiceComposer<'a, W: Write> {
    ctx: RenderContext<W>,
    options: &'a ComposeOptions,
    widths: [f64; 4],
    state: CompositionState,
}

impl<'a, W: Write> InvoiceComposer<'a, W> {
    pub fn new(writer: W, options: &'a ComposeOptions) -> Result<Self> {
        let mut doc = PdfDocument::new(writer)?;
        doc.set_compression(options.compress)
            .set_info("Creator", "expo-invoice")
            .set_info("Title", &options.title);

        let mut ctx = RenderContext::new(doc, page_setup());
        options.fonts.install(&mut ctx)?;
        ctx.set_decorator(Rc::new(InvoiceDecorator::new(options.title.clone())));

        Ok(InvoiceComposer {
            ctx,
            options,
            widths: COLUMN_WIDTHS_MM.map(|w| w * MM),
            state: CompositionState::Empty,
        })
    }

    pub fn state(&self) -> CompositionState {
        self.state
    }

    fn transition(&mut self, next: CompositionState) -> Result<()> {
        if !self.state.can_move_to(next) {
            return Err(InvoiceError::Configuration(format!(
                "cannot go from {} to {}",
                self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }

    /// Compose one recipient on new pages of this document.
    pub fn compose_group(&mut self, group: &RecipientGroup) -> Result<GroupSummary> {
        self.transition(CompositionState::PageStarted)?;
        self.ctx.begin_section()?;

        self.address_block(group)?;
        self.transition(CompositionState::AddressRendered)?;

        self.header_row()?;
        self.transition(CompositionState::HeaderRowRendered)?;

        let mut item_rows = Vec::new();
        for item in group.billable_items(&self.options.rules) {
            item_rows.push(self.item_rows(item)?);
            self.transition(CompositionState::ItemRowPair)?;
        }

        self.total_row(group)?;
        self.transition(CompositionState::TotalRowRendered)?;

        let pages = self.ctx.section_page_no();
        log::debug!(
            "{:?}: {} item(s) on {} page(s)",
            group.recipient,
            item_rows.len(),
            pages
        );
        Ok(GroupSummary {
            recipient: group.recipient.clone(),
            items: item_rows.len(),
            pages,
            item_rows,
        })
    }

    fn address_block(&mut self, group: &RecipientGroup) -> Result<()> {
        let ctx = &mut self.ctx;
        ctx.set_font(FontStyle::Bold, FONT_SIZE_BODY);
        let intro = format!(
            "Adresse de facturation pour la commune {} et les visites ci-dessous:",
            group.recipient
        );
        ctx.multi_cell(0.0, BODY_LINE_HEIGHT, &intro, Border::None, Align::Left, Advance::NextLine, WrapMode::Word)?;
        ctx.ln(2.0 * MM);

        ctx.set_font(FontStyle::Regular, FONT_SIZE_BODY);
        let indent = ctx.x() + 10.0 * MM;
        ctx.set_x(indent);
        let address = group.address.lines().join("\n");
        ctx.multi_cell(0.0, BODY_LINE_HEIGHT, &address, Border::None, Align::Left, Advance::NextLine, WrapMode::Word)?;
        ctx.ln(10.0 * MM);
        Ok(())
    }

    fn header_row(&mut self) -> Result<()> {
        let row = TableRow::new(CAPTIONS, HEADER_ROW_HEIGHT, FONT_SIZE_TABLE_HEADER)
            .styles([FontStyle::Bold; 4])
            .aligns(ALIGNS)
            .border(Border::Bottom);
        render_row(&mut self.ctx, &self.widths, &row)?;
        Ok(())
    }

    /// Two sub-rows per item, kept on one page; the second one closes the
    /// item with a rule.
    fn item_rows(&mut self, item: &LineItem) -> Result<RowLayout> {
        let booking = self
            .options
            .booking
            .format(item.booking_number)
            .map_err(|e| e.at_row(item.row))?;
        let activity = match &item.title_holder {
            Some(holder) => format!("{}\n{}", item.activity, holder),
            None => item.activity.clone(),
        };
        let first = TableRow::new(
            [
                booking,
                item.responsible.clone(),
                activity,
                self.options.price.format(item.price),
            ],
            ITEM_ROW_HEIGHT,
            FONT_SIZE_TABLE_ROW,
        )
        .styles([FontStyle::Regular, FontStyle::Bold, FontStyle::Bold, FontStyle::Regular])
        .aligns(ALIGNS);

        let second = TableRow::new(
            [
                item.datetime.clone(),
                item.customer_name.clone(),
                item.purchase_order.clone().unwrap_or_default(),
                String::new(),
            ],
            ITEM_ROW_HEIGHT,
            FONT_SIZE_TABLE_ROW,
        )
        .styles([FontStyle::Regular, FontStyle::Italic, FontStyle::Regular, FontStyle::Regular])
        .border(Border::Bottom);

        let mut layouts = render_rows_together(&mut self.ctx, &self.widths, &[first, second])?;
        Ok(layouts.swap_remove(0))
    }

    fn total_row(&mut self, group: &RecipientGroup) -> Result<()> {
        let row = TableRow::new(
            [String::new(), String::new(), "Total".to_string(), self.options.price.format(group.total)],
            ITEM_ROW_HEIGHT,
            FONT_SIZE_TABLE_ROW,
        )
        .styles([FontStyle::Regular, FontStyle::Regular, FontStyle::Bold, FontStyle::Bold])
        .aligns(ALIGNS)
        .border(Border::Bottom);
        render_row(&mut self.ctx, &self.widths, &row)?;
        Ok(())
    }

    /// Close the last page and hand back the writer.
    pub fn finish(mut self) -> Result<W> {
        self.transition(CompositionState::DocumentFinalized)?;
        Ok(self.ctx.finish()?)
    }
}
