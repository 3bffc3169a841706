//! Fixed-width receipt layout.
//!
//! Turns a finalized bill into the narrow monospace document printed on
//! 72–80mm thermal stock: a centered merchant header, one row per line item
//! (name truncated past a configurable threshold, quantity, amount), and a
//! totals/footer block. The same line model feeds the plain-text print
//! surface and the receipt PDF.

use crate::types::Bill;

/// Ellipsis marker appended to truncated item names.
const ELLIPSIS: char = '…';

/// Column width used for the quantity field.
const QTY_COL: usize = 4;

/// Column width used for the amount field.
const AMOUNT_COL: usize = 10;

/// Receipt layout configuration.
#[derive(Debug, Clone)]
pub struct ReceiptLayout {
    /// Total receipt width in characters (42 ≈ 72mm at standard pitch).
    pub width: usize,
    /// Item names longer than this are truncated with an ellipsis.
    pub max_item_name: usize,
    /// Centered merchant identity block at the top.
    pub merchant_lines: Vec<String>,
    /// Centered thank-you block at the bottom.
    pub footer_lines: Vec<String>,
}

impl Default for ReceiptLayout {
    fn default() -> Self {
        ReceiptLayout {
            width: 42,
            max_item_name: 20,
            merchant_lines: vec![
                "HOTEL SRI SENTHOOR".to_string(),
                "& Cafe 77".to_string(),
                "--- Pure Vegetarian ---".to_string(),
                "Near Nagampatti Toll Plaza,".to_string(),
                "Krishnagiri District,".to_string(),
                "Tamil Nadu - 635203".to_string(),
                "Phone: +91 70106 95808".to_string(),
            ],
            footer_lines: vec![
                "Thank you for dining with us!".to_string(),
                "Visit Again".to_string(),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Fixed two-decimal currency format.
pub fn money(value: f64) -> String {
    format!("{value:.2}")
}

/// Truncate to `max` characters, marking the cut with an ellipsis.
pub fn truncate_name(name: &str, max: usize) -> String {
    let count = name.chars().count();
    if count <= max {
        return name.to_string();
    }
    let keep = max.saturating_sub(1);
    let mut out: String = name.chars().take(keep).collect();
    out.push(ELLIPSIS);
    out
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let pad = (width - len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn separator(width: usize) -> String {
    "-".repeat(width)
}

/// Left-aligned label, right-aligned value, padded to `width`.
fn line_pair(label: &str, value: &str, width: usize) -> String {
    let used = label.chars().count() + value.chars().count();
    let gap = width.saturating_sub(used).max(1);
    format!("{label}{}{value}", " ".repeat(gap))
}

/// One body row: name left, quantity and amount right-aligned columns.
fn item_row(name: &str, quantity: i64, amount: f64, layout: &ReceiptLayout) -> String {
    let name_col = layout.width.saturating_sub(QTY_COL + AMOUNT_COL);
    let name = truncate_name(name, layout.max_item_name.min(name_col));
    let pad = name_col.saturating_sub(name.chars().count());
    format!(
        "{name}{}{:>qty$}{:>amt$}",
        " ".repeat(pad),
        quantity,
        money(amount),
        qty = QTY_COL,
        amt = AMOUNT_COL,
    )
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the receipt as individual lines. Shared by the text print surface
/// and the PDF renderer, which places each line on its own baseline.
pub fn receipt_lines(bill: &Bill, layout: &ReceiptLayout) -> Vec<String> {
    let w = layout.width;
    let mut out = Vec::new();

    for line in &layout.merchant_lines {
        out.push(center(line, w));
    }
    out.push(separator(w));

    out.push(format!("Bill No: {}", bill.bill_number));
    out.push(bill.date.format("%d %b %Y, %H:%M").to_string());
    if let Some(by) = bill.billed_by.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push(format!("Billed by: {by}"));
    }
    out.push(separator(w));

    // Column header row
    let name_col = w.saturating_sub(QTY_COL + AMOUNT_COL);
    out.push(format!(
        "{:<name$}{:>qty$}{:>amt$}",
        "Item",
        "Qty",
        "Amt",
        name = name_col,
        qty = QTY_COL,
        amt = AMOUNT_COL,
    ));
    for item in &bill.items {
        out.push(item_row(&item.name, item.quantity, item.amount(), layout));
    }
    out.push(separator(w));

    if bill.gst != 0.0 {
        out.push(line_pair("Subtotal", &money(bill.subtotal), w));
        out.push(line_pair("GST", &money(bill.gst), w));
    }
    out.push(line_pair("TOTAL", &money(bill.total), w));
    out.push(separator(w));

    for line in &layout.footer_lines {
        out.push(center(line, w));
    }

    out
}

/// Render the receipt as a single newline-joined string for the print
/// surface.
pub fn render_text(bill: &Bill, layout: &ReceiptLayout) -> String {
    receipt_lines(bill, layout).join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BillLine;
    use chrono::{TimeZone, Utc};

    fn bill() -> Bill {
        Bill {
            bill_number: "BL123456".into(),
            items: vec![
                BillLine {
                    id: "1".into(),
                    name: "Paneer Butter Masala Special Extra".into(),
                    price: 220.0,
                    category: "main-course".into(),
                    quantity: 2,
                },
                BillLine {
                    id: "2".into(),
                    name: "Roti".into(),
                    price: 25.0,
                    category: "breads".into(),
                    quantity: 4,
                },
            ],
            subtotal: 540.0,
            gst: 0.0,
            total: 540.0,
            date: Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap(),
            billed_by: Some("Kumar".into()),
        }
    }

    #[test]
    fn truncates_with_ellipsis() {
        assert_eq!(truncate_name("Masala Chai", 20), "Masala Chai");
        let cut = truncate_name("Paneer Butter Masala Special", 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with(ELLIPSIS));
    }

    #[test]
    fn rows_fit_the_configured_width() {
        let layout = ReceiptLayout::default();
        for line in receipt_lines(&bill(), &layout) {
            assert!(
                line.chars().count() <= layout.width,
                "line wider than {}: {line:?}",
                layout.width
            );
        }
    }

    #[test]
    fn amounts_use_two_decimals() {
        let text = render_text(&bill(), &ReceiptLayout::default());
        assert!(text.contains("440.00"), "line amount 220×2: {text}");
        assert!(text.contains("540.00"), "total: {text}");
    }

    #[test]
    fn gst_rows_appear_only_when_nonzero() {
        let layout = ReceiptLayout::default();
        let mut b = bill();
        assert!(!render_text(&b, &layout).contains("GST"));

        b.gst = 27.0;
        b.total = 567.0;
        let text = render_text(&b, &layout);
        assert!(text.contains("Subtotal"));
        assert!(text.contains("GST"));
        assert!(text.contains("567.00"));
    }

    #[test]
    fn header_and_footer_present() {
        let text = render_text(&bill(), &ReceiptLayout::default());
        assert!(text.contains("HOTEL SRI SENTHOOR"));
        assert!(text.contains("Bill No: BL123456"));
        assert!(text.contains("Billed by: Kumar"));
        assert!(text.contains("Thank you for dining with us!"));
    }
}
