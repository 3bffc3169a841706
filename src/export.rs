//! Bulk export engine: CSV, combined/grid PDFs, and a ZIP of per-bill
//! receipt PDFs, all computed in memory.
//!
//! Every exporter takes an already-filtered bill set and returns
//! `Ok(None)` when that set is empty, so callers never write zero-row
//! files. Filenames embed the active filter label (omitted for the
//! unfiltered view) so exports from different views don't clobber each
//! other.

use std::io::{Cursor, Write};

use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PosError, Result};
use crate::history::BillFilter;
use crate::pdf;
use crate::receipt::ReceiptLayout;
use crate::types::Bill;

/// A finished export: a suggested filename plus the file bytes. The
/// caller decides where they go (disk, download, share sheet).
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Replace filesystem-hostile characters so a filter label or bill
/// number is always safe inside a filename.
pub fn sanitize_filename(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_whitespace() => '-',
            c => c,
        })
        .collect()
}

fn stamped(prefix: &str, filter: &BillFilter, ext: &str) -> String {
    match filter {
        BillFilter::All => format!("{prefix}.{ext}"),
        _ => format!("{prefix}-{}.{ext}", sanitize_filename(&filter.label())),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Quote a CSV field when it contains a comma, quote, or newline;
/// embedded quotes are doubled.
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn items_summary(bill: &Bill) -> String {
    bill.items
        .iter()
        .map(|i| format!("{} x{}", i.name, i.quantity))
        .collect::<Vec<_>>()
        .join("; ")
}

/// One row per bill: number, date, a compact item summary, and the
/// stored total.
pub fn bills_csv(bills: &[&Bill], filter: &BillFilter) -> Result<Option<ExportFile>> {
    if bills.is_empty() {
        return Ok(None);
    }

    let mut out = String::from("Bill Number,Date,Items,Total\n");
    for bill in bills {
        out.push_str(&csv_field(&bill.bill_number));
        out.push(',');
        out.push_str(&csv_field(&bill.date.format("%d %b %Y, %H:%M").to_string()));
        out.push(',');
        out.push_str(&csv_field(&items_summary(bill)));
        out.push(',');
        out.push_str(&format!("{:.2}\n", bill.total));
    }

    info!(bills = bills.len(), filter = %filter.label(), "exported CSV");
    Ok(Some(ExportFile {
        filename: stamped("bills", filter, "csv"),
        bytes: out.into_bytes(),
    }))
}

// ---------------------------------------------------------------------------
// PDF wrappers
// ---------------------------------------------------------------------------

/// One bill as a downloadable narrow receipt PDF.
pub fn single_receipt_pdf(bill: &Bill, layout: &ReceiptLayout) -> Result<ExportFile> {
    let bytes = pdf::receipt_pdf(bill, layout)?;
    Ok(ExportFile {
        filename: format!("receipt-{}.pdf", sanitize_filename(&bill.bill_number)),
        bytes,
    })
}

/// Single-column ledger report of the filtered set.
pub fn bills_report_pdf(bills: &[&Bill], filter: &BillFilter) -> Result<Option<ExportFile>> {
    if bills.is_empty() {
        return Ok(None);
    }
    let bytes = pdf::ledger_pdf(bills, filter)?;
    info!(bills = bills.len(), filter = %filter.label(), "exported ledger PDF");
    Ok(Some(ExportFile {
        filename: stamped("bill-report", filter, "pdf"),
        bytes,
    }))
}

/// Multi-up grid of receipt blocks for the filtered set.
pub fn bills_grid_pdf(bills: &[&Bill], filter: &BillFilter) -> Result<Option<ExportFile>> {
    if bills.is_empty() {
        return Ok(None);
    }
    let bytes = pdf::grid_pdf(bills)?;
    info!(bills = bills.len(), filter = %filter.label(), "exported grid PDF");
    Ok(Some(ExportFile {
        filename: stamped("bill-receipts", filter, "pdf"),
        bytes,
    }))
}

// ---------------------------------------------------------------------------
// ZIP of per-bill receipts
// ---------------------------------------------------------------------------

/// One receipt PDF per bill, deflated into a single archive. Entry names
/// come from the bill number; duplicates (timestamp-derived numbers can
/// collide) get a numeric suffix so no entry silently overwrites another.
pub fn receipts_zip(
    bills: &[&Bill],
    filter: &BillFilter,
    layout: &ReceiptLayout,
) -> Result<Option<ExportFile>> {
    if bills.is_empty() {
        return Ok(None);
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut seen: Vec<String> = Vec::new();
    for bill in bills {
        let base = sanitize_filename(&bill.bill_number);
        let mut name = format!("receipt-{base}.pdf");
        let mut n = 1;
        while seen.contains(&name) {
            n += 1;
            name = format!("receipt-{base}-{n}.pdf");
        }
        seen.push(name.clone());

        let pdf_bytes = pdf::receipt_pdf(bill, layout)?;
        zip.start_file(name, options)
            .map_err(|e| PosError::Render(e.to_string()))?;
        zip.write_all(&pdf_bytes)
            .map_err(|e| PosError::Render(e.to_string()))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| PosError::Render(e.to_string()))?;

    info!(bills = bills.len(), filter = %filter.label(), "exported receipts ZIP");
    Ok(Some(ExportFile {
        filename: stamped("receipts", filter, "zip"),
        bytes: cursor.into_inner(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BillLine;
    use chrono::{TimeZone, Utc};

    fn bill(number: &str, name: &str, price: f64, qty: i64) -> Bill {
        let items = vec![BillLine {
            id: name.to_lowercase(),
            name: name.into(),
            price,
            category: "c".into(),
            quantity: qty,
        }];
        let subtotal = price * qty as f64;
        Bill {
            bill_number: number.into(),
            items,
            subtotal,
            gst: 0.0,
            total: subtotal,
            date: Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap(),
            billed_by: None,
        }
    }

    #[test]
    fn empty_set_exports_nothing() {
        assert!(bills_csv(&[], &BillFilter::All).unwrap().is_none());
        assert!(bills_report_pdf(&[], &BillFilter::All).unwrap().is_none());
        assert!(bills_grid_pdf(&[], &BillFilter::All).unwrap().is_none());
        assert!(receipts_zip(&[], &BillFilter::All, &ReceiptLayout::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn csv_has_header_and_one_row_per_bill() {
        let a = bill("BL000001", "Tea", 30.0, 2);
        let b = bill("BL000002", "Coffee", 50.0, 1);
        let file = bills_csv(&[&a, &b], &BillFilter::All).unwrap().unwrap();
        let text = String::from_utf8(file.bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Bill Number,Date,Items,Total");
        assert!(lines[1].starts_with("BL000001,"));
        assert!(lines[1].ends_with(",60.00"));
        assert_eq!(file.filename, "bills.csv");
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        let b = bill("BL000003", "Idly, plate", 25.0, 1);
        let file = bills_csv(&[&b], &BillFilter::All).unwrap().unwrap();
        let text = String::from_utf8(file.bytes).unwrap();
        assert!(text.contains("\"Idly, plate x1\""));
    }

    #[test]
    fn zip_contains_one_entry_per_bill_with_unique_names() {
        let a = bill("BL000001", "Tea", 30.0, 1);
        let b = bill("BL000001", "Coffee", 50.0, 1); // colliding number
        let file = receipts_zip(&[&a, &b], &BillFilter::All, &ReceiptLayout::default())
            .unwrap()
            .unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(file.bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"receipt-BL000001.pdf".to_string()));
        assert!(names.contains(&"receipt-BL000001-2.pdf".to_string()));
    }

    #[test]
    fn single_receipt_is_named_from_the_bill_number() {
        let b = bill("BL000007", "Tea", 30.0, 1);
        let file = single_receipt_pdf(&b, &ReceiptLayout::default()).unwrap();
        assert_eq!(file.filename, "receipt-BL000007.pdf");
        assert_eq!(&file.bytes[..5], b"%PDF-");
    }

    #[test]
    fn filenames_embed_the_filter_label() {
        let b = bill("BL000009", "Tea", 30.0, 1);
        let filter = BillFilter::Day {
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        };
        let file = bills_report_pdf(&[&b], &filter).unwrap().unwrap();
        assert_eq!(file.filename, "bill-report-2024-03-05.pdf");
    }

    #[test]
    fn sanitize_strips_path_separators() {
        assert_eq!(sanitize_filename("a/b\\c:d"), "a-b-c-d");
        assert_eq!(sanitize_filename("march 2024"), "march-2024");
    }
}
