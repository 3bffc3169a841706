//! Core billing data model.
//!
//! Field names serialize as camelCase to stay wire-compatible with the
//! admin dashboard's bill payloads (`billNumber`, `billedBy`, ...), which is
//! also the shape stored in the `bills.items` JSON column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An item on the menu. Immutable once created except through an explicit
/// update via the menu repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    /// Unit price in currency units. Non-negative.
    pub price: f64,
    /// Grouping key for the menu grid (e.g. "starters", "beverages").
    pub category: String,
}

/// Input for creating a menu item. The repository assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    pub name: String,
    pub price: f64,
    pub category: String,
}

/// Partial update for a menu item. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

/// One line of the in-progress bill: a menu item plus a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillLine {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    /// Always >= 1 while the line exists; an update to 0 removes the line.
    pub quantity: i64,
}

impl BillLine {
    /// New line for a menu item with quantity 1.
    pub fn from_menu_item(item: &MenuItem) -> Self {
        BillLine {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            category: item.category.clone(),
            quantity: 1,
        }
    }

    /// Line amount: unit price times quantity.
    pub fn amount(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// A finalized, immutable bill. Created at print time as a snapshot of the
/// cart; from then on only deleted whole or bulk-cleared, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    /// Unique per print event, e.g. `BL483920`.
    pub bill_number: String,
    /// Cart snapshot in insertion order.
    pub items: Vec<BillLine>,
    pub subtotal: f64,
    /// Tax component. 0 when GST is disabled.
    pub gst: f64,
    /// Always `subtotal + gst`.
    pub total: f64,
    pub date: DateTime<Utc>,
    /// Operator name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billed_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bill_line_amount() {
        let line = BillLine {
            id: "1".into(),
            name: "Masala Chai".into(),
            price: 30.0,
            category: "beverages".into(),
            quantity: 3,
        };
        assert_eq!(line.amount(), 90.0);
    }

    #[test]
    fn bill_serializes_camel_case() {
        let bill = Bill {
            bill_number: "BL000001".into(),
            items: vec![],
            subtotal: 0.0,
            gst: 0.0,
            total: 0.0,
            date: Utc::now(),
            billed_by: None,
        };
        let json = serde_json::to_value(&bill).unwrap();
        assert!(json.get("billNumber").is_some());
        // billedBy is omitted entirely when unset
        assert!(json.get("billedBy").is_none());
    }
}
