//! Derived bill totals.
//!
//! Pure and deterministic: `subtotal = Σ(price × quantity)`, `gst = subtotal
//! × rate`, `total = subtotal + gst`. Recomputed on demand; carts are tens
//! of lines at most, so there is nothing to cache.

use serde::{Deserialize, Serialize};

use crate::types::BillLine;

/// Tax configuration. A rate of 0 disables the GST line, which is how some
/// deployments run (the persisted history then carries `gst: 0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Fractional GST rate over subtotal, e.g. 0.05 for 5%.
    pub gst_rate: f64,
}

impl TaxConfig {
    pub const DISABLED: TaxConfig = TaxConfig { gst_rate: 0.0 };

    pub fn new(gst_rate: f64) -> Self {
        TaxConfig { gst_rate }
    }

    pub fn is_enabled(&self) -> bool {
        self.gst_rate != 0.0
    }
}

impl Default for TaxConfig {
    fn default() -> Self {
        TaxConfig::DISABLED
    }
}

/// Computed totals for a set of bill lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillTotals {
    pub subtotal: f64,
    pub gst: f64,
    pub total: f64,
}

/// Compute totals for the given lines under the given tax configuration.
pub fn compute(lines: &[BillLine], tax: TaxConfig) -> BillTotals {
    let subtotal: f64 = lines.iter().map(BillLine::amount).sum();
    let gst = subtotal * tax.gst_rate;
    BillTotals {
        subtotal,
        gst,
        total: subtotal + gst,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: f64, quantity: i64) -> BillLine {
        BillLine {
            id: format!("{price}-{quantity}"),
            name: "x".into(),
            price,
            category: "c".into(),
            quantity,
        }
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let t = compute(&[], TaxConfig::new(0.05));
        assert_eq!(t.subtotal, 0.0);
        assert_eq!(t.gst, 0.0);
        assert_eq!(t.total, 0.0);
    }

    #[test]
    fn subtotal_sums_price_times_quantity() {
        let t = compute(&[line(30.0, 2), line(45.0, 1), line(100.0, 3)], TaxConfig::DISABLED);
        assert_eq!(t.subtotal, 405.0);
        assert_eq!(t.gst, 0.0);
        assert_eq!(t.total, 405.0);
    }

    #[test]
    fn gst_applies_configured_rate() {
        let t = compute(&[line(200.0, 1)], TaxConfig::new(0.05));
        assert_eq!(t.subtotal, 200.0);
        assert!((t.gst - 10.0).abs() < 1e-9);
        assert!((t.total - 210.0).abs() < 1e-9);
    }

    #[test]
    fn tea_twice_is_sixty() {
        let t = compute(&[line(30.0, 2)], TaxConfig::DISABLED);
        assert_eq!(t.subtotal, 60.0);
    }
}
