use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::dates::{add_months, format_display_date};
use crate::error::AppError;
use crate::metrics::Weight;
use crate::model::InvoiceInput;
use crate::money::format_inr;
use crate::plan::Plan;

// ============================================================================
// Constants
// ============================================================================

/// A4 dimensions in mm
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

/// Left margin; rules run from here to RULE_END_MM
const MARGIN_MM: f32 = 15.0;
const RULE_END_MM: f32 = 195.0;
const PAGE_CENTER_MM: f32 = 105.0;

/// Vertical rhythm
const START_Y_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 7.0;
const SECTION_GAP_MM: f32 = 10.0;

/// Font sizes in points
const BUSINESS_FONT_SIZE: f32 = 18.0;
const CONTACT_FONT_SIZE: f32 = 12.0;
const BODY_FONT_SIZE: f32 = 14.0;

/// Invoice date block sits to the right of "Billed To"
const INVOICE_DATE_X_MM: f32 = 130.0;

/// Plan table columns
const COL_PLAN_X: f32 = 20.0;
const COL_START_X: f32 = 70.0;
const COL_END_X: f32 = 120.0;
const COL_AMOUNT_RIGHT_X: f32 = 170.0;
const TABLE_WIDTH_MM: f32 = 180.0;
const HEADER_BAND_COLOR: Rgb8 = Rgb8(240, 240, 240);

/// Logo box (top-left corner and size). The image is stretched to fit.
pub const LOGO_X_MM: f32 = 150.0;
pub const LOGO_Y_MM: f32 = 10.0;
pub const LOGO_WIDTH_MM: f32 = 40.0;
pub const LOGO_HEIGHT_MM: f32 = 20.0;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

// ============================================================================
// Document Description
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb8(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    /// Left edge of a run `width` mm wide placed against `anchor`.
    pub fn left_edge(self, anchor: f32, width: f32) -> f32 {
        match self {
            Align::Left => anchor,
            Align::Center => anchor - width / 2.0,
            Align::Right => anchor - width,
        }
    }
}

/// One drawing instruction. Coordinates are mm from the top-left corner.
/// Text `x` is the alignment anchor (left edge, centre or right edge) and
/// `y` is the baseline; the renderer measures the run it actually draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        weight: Weight,
        align: Align,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb8,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        source: String,
        #[serde(skip)]
        bytes: Vec<u8>,
    },
}

/// A composed one-page invoice, ready for the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDocument {
    pub title: String,
    pub page_width: f32,
    pub page_height: f32,
    pub ops: Vec<DrawOp>,
    pub plan: Plan,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub file_stem: String,
}

impl InvoiceDocument {
    /// All text runs in drawing order.
    #[cfg(test)]
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn has_logo(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Image { .. }))
    }
}

// ============================================================================
// Composer
// ============================================================================

/// Tracks the vertical cursor and the current font while emitting ops.
struct PageBuilder {
    ops: Vec<DrawOp>,
    y: f32,
    size: f32,
    weight: Weight,
}

impl PageBuilder {
    fn new() -> Self {
        Self {
            ops: Vec::new(),
            y: START_Y_MM,
            size: BODY_FONT_SIZE,
            weight: Weight::Normal,
        }
    }

    fn font(&mut self, size: f32, weight: Weight) {
        self.size = size;
        self.weight = weight;
    }

    fn weight(&mut self, weight: Weight) {
        self.weight = weight;
    }

    fn text_at(&mut self, text: &str, x: f32, y: f32, align: Align) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            size: self.size,
            weight: self.weight,
            align,
        });
    }

    fn text(&mut self, text: &str, x: f32, align: Align) {
        let y = self.y;
        self.text_at(text, x, y, align);
    }

    fn advance(&mut self, mm: f32) {
        self.y += mm;
    }

    fn rule(&mut self) {
        self.ops.push(DrawOp::Rule { x1: MARGIN_MM, x2: RULE_END_MM, y: self.y });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb8) {
        self.ops.push(DrawOp::FillRect { x, y, width, height, color });
    }
}

/// Lay out the invoice page. `render_date` is the day the document is
/// produced; the plan period starts on it rather than on the issue date.
pub fn compose(input: &InvoiceInput, render_date: NaiveDate) -> Result<InvoiceDocument, AppError> {
    let plan = *input.plan.plan();
    let start_date = render_date;
    let end_date = add_months(start_date, plan.months).ok_or_else(|| {
        AppError::DateError(format!("{} + {} months is out of range", start_date, plan.months))
    })?;

    let mut page = PageBuilder::new();

    // Header
    page.font(BUSINESS_FONT_SIZE, Weight::Bold);
    page.text(&input.business_name.to_uppercase(), MARGIN_MM, Align::Left);
    page.advance(LINE_HEIGHT_MM);

    page.font(CONTACT_FONT_SIZE, Weight::Normal);
    page.text(&input.contact_person, MARGIN_MM, Align::Left);
    page.advance(LINE_HEIGHT_MM);
    page.text(&format!("Contact: {}", input.phone_number), MARGIN_MM, Align::Left);
    page.advance(LINE_HEIGHT_MM * 2.0);

    // Title; 14pt carries through the rest of the page
    page.font(BODY_FONT_SIZE, Weight::Bold);
    page.text("INVOICE", PAGE_CENTER_MM, Align::Center);
    page.advance(LINE_HEIGHT_MM);
    page.weight(Weight::Normal);
    page.text(&input.invoice_number, PAGE_CENTER_MM, Align::Center);
    page.advance(SECTION_GAP_MM);

    page.rule();
    page.advance(SECTION_GAP_MM);

    // Billed to, with the invoice date alongside
    let billed_to_top = page.y;
    page.weight(Weight::Bold);
    page.text("Billed To", MARGIN_MM, Align::Left);
    page.advance(LINE_HEIGHT_MM);
    page.weight(Weight::Normal);
    page.text(&input.customer_name, MARGIN_MM, Align::Left);
    page.advance(LINE_HEIGHT_MM);
    page.text(&input.customer_phone, MARGIN_MM, Align::Left);
    page.advance(LINE_HEIGHT_MM * 1.5);

    page.weight(Weight::Bold);
    page.text_at("Invoice Date", INVOICE_DATE_X_MM, billed_to_top + LINE_HEIGHT_MM * 2.0, Align::Left);
    page.weight(Weight::Normal);
    page.text_at(
        &format_display_date(&input.issue_date),
        INVOICE_DATE_X_MM,
        billed_to_top + LINE_HEIGHT_MM * 3.0,
        Align::Left,
    );

    page.rule();
    page.advance(SECTION_GAP_MM);

    // Plan table
    page.weight(Weight::Bold);
    page.text("PLAN DETAILS", MARGIN_MM, Align::Left);
    page.advance(LINE_HEIGHT_MM * 1.5);

    let band_top = page.y - 3.0;
    page.fill_rect(MARGIN_MM, band_top, TABLE_WIDTH_MM, LINE_HEIGHT_MM + 3.0, HEADER_BAND_COLOR);
    page.text("Plan", COL_PLAN_X, Align::Left);
    page.text("Start Date", COL_START_X, Align::Left);
    page.text("End Date", COL_END_X, Align::Left);
    page.text("Amount", COL_AMOUNT_RIGHT_X, Align::Right);
    page.advance(LINE_HEIGHT_MM);

    page.weight(Weight::Normal);
    page.text(plan.label, COL_PLAN_X, Align::Left);
    page.text(&format_display_date(&start_date), COL_START_X, Align::Left);
    page.text(&format_display_date(&end_date), COL_END_X, Align::Left);
    page.text(&format_inr(plan.price), COL_AMOUNT_RIGHT_X, Align::Right);
    page.advance(LINE_HEIGHT_MM);

    page.rule();

    if let Some(logo) = &input.logo {
        page.ops.push(DrawOp::Image {
            x: LOGO_X_MM,
            y: LOGO_Y_MM,
            width: LOGO_WIDTH_MM,
            height: LOGO_HEIGHT_MM,
            source: logo.source.clone(),
            bytes: logo.bytes.clone(),
        });
    }

    let file_stem = file_stem(&input.business_name, &input.invoice_number);
    debug!(ops = page.ops.len(), %file_stem, %start_date, %end_date, "composed invoice");

    Ok(InvoiceDocument {
        title: format!("Invoice {}", input.invoice_number),
        page_width: PAGE_WIDTH_MM,
        page_height: PAGE_HEIGHT_MM,
        ops: page.ops,
        plan,
        start_date,
        end_date,
        file_stem,
    })
}

/// `{business}_Invoice_{number}`: whitespace runs become `_`, the first `#`
/// is dropped. No extension.
pub fn file_stem(business_name: &str, invoice_number: &str) -> String {
    format!(
        "{}_Invoice_{}",
        WHITESPACE_RUN.replace_all(business_name, "_"),
        invoice_number.replacen('#', "", 1)
    )
}
