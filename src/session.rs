//! The billing session: one live cart, finalized into the bill history.
//!
//! Finalize ordering matters: the bill is persisted first and the cart is
//! only cleared (and a fresh bill number issued) after the save succeeds.
//! A failed save leaves the cart exactly as it was so the operator can
//! retry the print.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::cart::Cart;
use crate::error::{PosError, Result};
use crate::receipt::{self, ReceiptLayout};
use crate::repo::BillRepository;
use crate::totals::{self, TaxConfig};
use crate::types::Bill;

pub struct BillingSession {
    cart: Cart,
    bills: Arc<dyn BillRepository>,
    tax: TaxConfig,
    layout: ReceiptLayout,
    /// Operator name stamped onto finalized bills.
    pub operator: Option<String>,
}

impl BillingSession {
    pub fn new(bills: Arc<dyn BillRepository>, tax: TaxConfig) -> Self {
        BillingSession {
            cart: Cart::new(),
            bills,
            tax,
            layout: ReceiptLayout::default(),
            operator: None,
        }
    }

    pub fn with_layout(mut self, layout: ReceiptLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Bill-shaped snapshot of the current cart with live totals. Does
    /// not touch the history.
    fn draft(&self) -> Bill {
        let items = self.cart.snapshot();
        let totals = totals::compute(&items, self.tax);
        Bill {
            bill_number: self.cart.bill_number().to_string(),
            items,
            subtotal: totals.subtotal,
            gst: totals.gst,
            total: totals.total,
            date: Utc::now(),
            billed_by: self.operator.clone(),
        }
    }

    /// Receipt text for the current cart, for the print preview pane.
    pub fn print_preview(&self) -> Result<String> {
        if self.cart.is_empty() {
            return Err(PosError::Validation("cannot preview an empty bill".into()));
        }
        Ok(receipt::render_text(&self.draft(), &self.layout))
    }

    /// Persist the current cart as a bill, then reset the cart for the
    /// next customer. Returns the saved bill. On save failure the cart
    /// is left untouched and the same bill number stays active.
    pub fn finalize(&mut self) -> Result<Bill> {
        if self.cart.is_empty() {
            return Err(PosError::Validation("cannot finalize an empty bill".into()));
        }

        let bill = self.draft();
        self.bills.save_bill(&bill)?;
        self.cart.clear();

        info!(bill = %bill.bill_number, total = bill.total, "Finalized bill");
        Ok(bill)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
