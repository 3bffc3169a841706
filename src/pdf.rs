//! PDF rendering for receipts and bill reports.
//!
//! Three surfaces, all using printpdf's builtin fonts so no font assets
//! ship with the binary:
//! - single narrow receipt (80mm-style page, Courier, mirrors the thermal
//!   print layout line for line)
//! - combined ledger: every bill's lines sequentially with per-bill
//!   subtotal rows, a running grand total, and a generation footer, with
//!   page-break-and-reheader pagination on A4
//! - grid: bordered receipt-style blocks, two per row, advancing to a new
//!   page when vertical space runs out.

use chrono::Utc;
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};
use std::io::BufWriter;

use crate::error::{PosError, Result};
use crate::history::BillFilter;
use crate::receipt::{self, money, ReceiptLayout};
use crate::types::Bill;

// A4 geometry (mm)
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 15.0;
const BOTTOM_LIMIT: f32 = 25.0;

fn render_err<E: std::fmt::Display>(e: E) -> PosError {
    PosError::Render(e.to_string())
}

fn save_bytes(doc: PdfDocumentReference) -> Result<Vec<u8>> {
    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer).map_err(render_err)?;
    writer.into_inner().map_err(render_err)
}

fn hline(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y)), false),
            (Point::new(Mm(x2), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x), Mm(y)), false),
            (Point::new(Mm(x + w), Mm(y)), false),
            (Point::new(Mm(x + w), Mm(y - h)), false),
            (Point::new(Mm(x), Mm(y - h)), false),
        ],
        is_closed: true,
    });
}

fn clip(text: &str, max: usize) -> String {
    receipt::truncate_name(text, max)
}

// ---------------------------------------------------------------------------
// Single receipt
// ---------------------------------------------------------------------------

/// Render one bill as a narrow receipt-style PDF. The page height grows
/// with the line count so the receipt never paginates.
pub fn receipt_pdf(bill: &Bill, layout: &ReceiptLayout) -> Result<Vec<u8>> {
    let lines = receipt::receipt_lines(bill, layout);

    const LINE_H: f32 = 3.6;
    let page_w = 80.0;
    let page_h = (lines.len() as f32) * LINE_H + 16.0;

    let (doc, page, layer) = PdfDocument::new(
        format!("Receipt {}", bill.bill_number),
        Mm(page_w),
        Mm(page_h),
        "Layer 1",
    );
    let layer = doc.get_page(page).get_layer(layer);
    let font = doc.add_builtin_font(BuiltinFont::Courier).map_err(render_err)?;

    let mut y = page_h - 8.0;
    for line in &lines {
        layer.use_text(line.clone(), 7.0, Mm(4.0), Mm(y), &font);
        y -= LINE_H;
    }

    save_bytes(doc)
}

// ---------------------------------------------------------------------------
// Combined ledger
// ---------------------------------------------------------------------------

struct LedgerPage {
    layer: PdfLayerReference,
    y: f32,
}

// Ledger column x positions (mm)
const COL_BILL: f32 = MARGIN;
const COL_DATE: f32 = 45.0;
const COL_ITEM: f32 = 85.0;
const COL_QTY: f32 = 155.0;
const COL_AMT: f32 = 175.0;

fn ledger_header_row(layer: &PdfLayerReference, bold: &IndirectFontRef, y: f32) {
    layer.use_text("Bill No.", 9.0, Mm(COL_BILL), Mm(y), bold);
    layer.use_text("Date", 9.0, Mm(COL_DATE), Mm(y), bold);
    layer.use_text("Item", 9.0, Mm(COL_ITEM), Mm(y), bold);
    layer.use_text("Qty", 9.0, Mm(COL_QTY), Mm(y), bold);
    layer.use_text("Amount", 9.0, Mm(COL_AMT), Mm(y), bold);
    hline(layer, MARGIN, PAGE_W - MARGIN, y - 1.5);
}

fn ledger_new_page(doc: &PdfDocumentReference, bold: &IndirectFontRef) -> LedgerPage {
    let (page, layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);
    let y = PAGE_H - MARGIN;
    ledger_header_row(&layer, bold, y);
    LedgerPage { layer, y: y - 7.0 }
}

/// Render a filtered bill set as a single-column ledger PDF: each bill's
/// lines in sequence, a subtotal row per bill, a grand total at the end,
/// and a generation summary footer on the last page.
pub fn ledger_pdf(bills: &[&Bill], filter: &BillFilter) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new("Bill Report", Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;

    let layer = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_H - MARGIN;

    layer.use_text("Bill Report", 16.0, Mm(MARGIN), Mm(y), &bold);
    y -= 8.0;
    layer.use_text(
        format!("Filter: {}  |  {} bills", filter.label(), bills.len()),
        9.0,
        Mm(MARGIN),
        Mm(y),
        &font,
    );
    y -= 8.0;
    ledger_header_row(&layer, &bold, y);
    y -= 7.0;

    let mut page = LedgerPage { layer, y };
    let mut grand_total = 0.0;

    for bill in bills {
        // Keep at least the bill header and one item together.
        if page.y < BOTTOM_LIMIT + 10.0 {
            page = ledger_new_page(&doc, &bold);
        }

        page.layer
            .use_text(bill.bill_number.clone(), 9.0, Mm(COL_BILL), Mm(page.y), &font);
        page.layer.use_text(
            bill.date.format("%d %b %Y, %H:%M").to_string(),
            9.0,
            Mm(COL_DATE),
            Mm(page.y),
            &font,
        );

        for item in &bill.items {
            if page.y < BOTTOM_LIMIT {
                page = ledger_new_page(&doc, &bold);
            }
            page.layer
                .use_text(clip(&item.name, 36), 9.0, Mm(COL_ITEM), Mm(page.y), &font);
            page.layer
                .use_text(item.quantity.to_string(), 9.0, Mm(COL_QTY), Mm(page.y), &font);
            page.layer
                .use_text(money(item.amount()), 9.0, Mm(COL_AMT), Mm(page.y), &font);
            page.y -= 5.0;
        }

        if page.y < BOTTOM_LIMIT {
            page = ledger_new_page(&doc, &bold);
        }
        page.layer
            .use_text("Bill total", 9.0, Mm(COL_ITEM), Mm(page.y), &bold);
        page.layer
            .use_text(money(bill.total), 9.0, Mm(COL_AMT), Mm(page.y), &bold);
        grand_total += bill.total;
        page.y -= 8.0;
    }

    if page.y < BOTTOM_LIMIT {
        page = ledger_new_page(&doc, &bold);
    }
    hline(&page.layer, MARGIN, PAGE_W - MARGIN, page.y + 3.0);
    page.layer
        .use_text("GRAND TOTAL", 11.0, Mm(COL_ITEM), Mm(page.y - 2.0), &bold);
    page.layer
        .use_text(money(grand_total), 11.0, Mm(COL_AMT), Mm(page.y - 2.0), &bold);

    page.layer.use_text(
        format!(
            "Generated {}  |  {} bills  |  filter: {}",
            Utc::now().format("%d %b %Y, %H:%M"),
            bills.len(),
            filter.label()
        ),
        8.0,
        Mm(MARGIN),
        Mm(12.0),
        &font,
    );

    save_bytes(doc)
}

// ---------------------------------------------------------------------------
// Receipt grid
// ---------------------------------------------------------------------------

const BLOCK_W: f32 = 90.0;
const GRID_X: [f32; 2] = [12.5, 107.5];

fn block_height(bill: &Bill) -> f32 {
    20.0 + bill.items.len() as f32 * 4.5 + 8.0
}

/// Draw one bordered receipt-style block with its top-left corner at
/// (x, y).
fn grid_block(
    layer: &PdfLayerReference,
    bill: &Bill,
    x: f32,
    y: f32,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    rect(layer, x, y, BLOCK_W, block_height(bill));

    let left = x + 4.0;
    let amount_x = x + BLOCK_W - 22.0;
    let mut cy = y - 7.0;

    layer.use_text(bill.bill_number.clone(), 10.0, Mm(left), Mm(cy), bold);
    cy -= 5.0;
    layer.use_text(
        bill.date.format("%d %b %Y, %H:%M").to_string(),
        8.0,
        Mm(left),
        Mm(cy),
        font,
    );
    cy -= 6.0;

    for item in &bill.items {
        layer.use_text(
            format!("{} x{}", clip(&item.name, 22), item.quantity),
            8.0,
            Mm(left),
            Mm(cy),
            font,
        );
        layer.use_text(money(item.amount()), 8.0, Mm(amount_x), Mm(cy), font);
        cy -= 4.5;
    }

    cy -= 1.5;
    layer.use_text("TOTAL", 9.0, Mm(left), Mm(cy), bold);
    layer.use_text(money(bill.total), 9.0, Mm(amount_x), Mm(cy), bold);
}

/// Render a filtered bill set as a multi-up grid PDF: bordered receipt
/// blocks, two per row, each independently laid out.
pub fn grid_pdf(bills: &[&Bill]) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new("Bill Receipts", Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;

    let mut layer = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_H - 12.0;

    for pair in bills.chunks(2) {
        let row_h = pair.iter().map(|b| block_height(b)).fold(0.0, f32::max);
        if y - row_h < 12.0 {
            let (p, l) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            layer = doc.get_page(p).get_layer(l);
            y = PAGE_H - 12.0;
        }
        for (i, bill) in pair.iter().enumerate() {
            grid_block(&layer, bill, GRID_X[i], y, &font, &bold);
        }
        y -= row_h + 6.0;
    }

    save_bytes(doc)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
