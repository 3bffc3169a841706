//! The live cart for the current billing session.
//!
//! The cart exclusively owns the mutable line collection; a finalized `Bill`
//! is a one-way snapshot taken by the session at print time. Lines keep
//! their first-add insertion order, and re-adding an item merges into the
//! existing line instead of duplicating it.

use chrono::Utc;
use uuid::Uuid;

use crate::error::{PosError, Result};
use crate::types::{BillLine, MenuItem};

/// Name used when a manual line is added with a blank name.
const MANUAL_LINE_PLACEHOLDER: &str = "Custom Item";

/// What prices a manually keyed-in line may carry.
///
/// The legacy app accepted any numeric input here; some operators rely on
/// negative lines as ad-hoc discounts, so that stays the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManualPricePolicy {
    /// Accept any price, including zero and negative (discount lines).
    #[default]
    AllowAny,
    /// Reject prices below zero.
    NonNegative,
}

/// Generate a bill-number token: `BL` plus the last six digits of the
/// current epoch-millisecond timestamp.
pub fn generate_bill_number() -> String {
    let ms = Utc::now().timestamp_millis();
    format!("BL{:06}", ms.rem_euclid(1_000_000))
}

/// The in-progress order.
#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<BillLine>,
    bill_number: String,
    price_policy: ManualPricePolicy,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            bill_number: generate_bill_number(),
            price_policy: ManualPricePolicy::default(),
        }
    }

    pub fn with_price_policy(mut self, policy: ManualPricePolicy) -> Self {
        self.price_policy = policy;
        self
    }

    /// Lines in first-add insertion order.
    pub fn lines(&self) -> &[BillLine] {
        &self.lines
    }

    /// Bill-number token reserved for the next finalized bill.
    pub fn bill_number(&self) -> &str {
        &self.bill_number
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Add a menu item. If a line with the same id exists its quantity is
    /// incremented by 1 and the line keeps its position; otherwise a new
    /// line with quantity 1 is appended. Never fails.
    pub fn add_item(&mut self, item: &MenuItem) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.id == item.id) {
            line.quantity += 1;
            return;
        }
        self.lines.push(BillLine::from_menu_item(item));
    }

    /// Set a line's quantity exactly (not a delta). A quantity of 0 or
    /// below removes the line. No-op if the id is not in the cart.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.id == id) {
            line.quantity = quantity;
        }
    }

    /// Remove the line with the given id, if present.
    pub fn remove_item(&mut self, id: &str) {
        self.lines.retain(|l| l.id != id);
    }

    /// Append a manually keyed-in line (off-menu item) with a fresh id and
    /// quantity 1. A blank name falls back to a placeholder; the price is
    /// checked against the cart's `ManualPricePolicy`.
    pub fn add_manual_line(&mut self, name: &str, price: f64) -> Result<&BillLine> {
        if self.price_policy == ManualPricePolicy::NonNegative && price < 0.0 {
            return Err(PosError::Validation(format!(
                "manual line price must not be negative (got {price})"
            )));
        }
        let name = name.trim();
        let name = if name.is_empty() {
            MANUAL_LINE_PLACEHOLDER.to_string()
        } else {
            name.to_string()
        };
        self.lines.push(BillLine {
            id: format!("manual-{}", Uuid::new_v4()),
            name,
            price,
            category: "manual".to_string(),
            quantity: 1,
        });
        Ok(self.lines.last().expect("line just pushed"))
    }

    /// Empty the cart and reserve a new bill-number token for the next bill.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.bill_number = generate_bill_number();
    }

    /// Snapshot the lines for a finalized bill.
    pub fn snapshot(&self) -> Vec<BillLine> {
        self.lines.clone()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, name: &str, price: f64) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: name.to_string(),
            price,
            category: "starters".to_string(),
        }
    }

    #[test]
    fn add_merges_by_id() {
        let mut cart = Cart::new();
        let tea = item("1", "Tea", 30.0);
        cart.add_item(&tea);
        cart.add_item(&tea);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.lines()[0].amount(), 60.0);
    }

    #[test]
    fn repeated_adds_count_per_distinct_id() {
        let mut cart = Cart::new();
        let a = item("a", "Roti", 25.0);
        let b = item("b", "Naan", 45.0);
        for _ in 0..3 {
            cart.add_item(&a);
        }
        cart.add_item(&b);
        cart.add_item(&a);
        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.lines()[0].quantity, 4);
        assert_eq!(cart.lines()[1].quantity, 1);
    }

    #[test]
    fn readding_does_not_move_line() {
        let mut cart = Cart::new();
        cart.add_item(&item("a", "A", 1.0));
        cart.add_item(&item("b", "B", 2.0));
        cart.add_item(&item("a", "A", 1.0));
        let order: Vec<&str> = cart.lines().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn update_quantity_sets_exactly() {
        let mut cart = Cart::new();
        cart.add_item(&item("a", "A", 10.0));
        cart.update_quantity("a", 7);
        assert_eq!(cart.lines()[0].quantity, 7);
        // unknown id is a no-op
        cart.update_quantity("zzz", 5);
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn update_to_zero_equals_remove() {
        let mut cart_a = Cart::new();
        let mut cart_b = Cart::new();
        for c in [&mut cart_a, &mut cart_b] {
            c.add_item(&item("a", "A", 10.0));
            c.add_item(&item("b", "B", 20.0));
        }
        cart_a.update_quantity("a", 0);
        cart_b.remove_item("a");
        assert_eq!(cart_a.lines(), cart_b.lines());

        cart_a.update_quantity("b", -3);
        cart_b.remove_item("b");
        assert_eq!(cart_a.lines(), cart_b.lines());
        assert!(cart_a.is_empty());
    }

    #[test]
    fn manual_line_gets_fresh_id_and_placeholder_name() {
        let mut cart = Cart::new();
        cart.add_manual_line("  ", 50.0).unwrap();
        cart.add_manual_line("Ginger Tea", 35.0).unwrap();
        assert_eq!(cart.lines()[0].name, "Custom Item");
        assert_eq!(cart.lines()[1].name, "Ginger Tea");
        assert_ne!(cart.lines()[0].id, cart.lines()[1].id);
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn manual_price_policy() {
        let mut open = Cart::new();
        assert!(open.add_manual_line("Discount", -20.0).is_ok());

        let mut strict = Cart::new().with_price_policy(ManualPricePolicy::NonNegative);
        let err = strict.add_manual_line("Discount", -20.0).unwrap_err();
        assert!(matches!(err, PosError::Validation(_)));
        assert!(strict.is_empty(), "rejected add must not mutate the cart");
        assert!(strict.add_manual_line("Water", 0.0).is_ok());
    }

    #[test]
    fn clear_empties_and_rotates_bill_number() {
        let mut cart = Cart::new();
        cart.add_item(&item("a", "A", 10.0));
        let first = cart.bill_number().to_string();
        assert!(first.starts_with("BL"));
        assert_eq!(first.len(), 8);
        cart.clear();
        assert!(cart.is_empty());
        // Extremely unlikely to collide: tokens derive from epoch millis.
        assert!(cart.bill_number().starts_with("BL"));
    }
}
