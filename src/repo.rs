//! Persistence seams for menu items and bills.
//!
//! The cart, totals, and export layers never talk to SQLite directly;
//! they go through these traits so tests (and the offline fallback path)
//! can run against the in-memory store.

use std::sync::Mutex;

use crate::error::{PosError, Result};
use crate::types::{Bill, MenuItem, MenuItemPatch, NewMenuItem};

/// Read/write access to the menu catalogue.
pub trait MenuRepository: Send + Sync {
    /// Full catalogue, insertion-ordered.
    fn list_items(&self) -> Result<Vec<MenuItem>>;
    fn add_item(&self, item: NewMenuItem) -> Result<MenuItem>;
    fn update_item(&self, id: &str, patch: MenuItemPatch) -> Result<MenuItem>;
    fn delete_item(&self, id: &str) -> Result<()>;
}

/// Bill history. Bills are immutable once saved; they can only be
/// deleted whole or cleared in bulk.
pub trait BillRepository: Send + Sync {
    fn save_bill(&self, bill: &Bill) -> Result<()>;
    /// All bills, most recent first.
    fn list_bills(&self) -> Result<Vec<Bill>>;
    fn delete_bill(&self, bill_number: &str) -> Result<()>;
    fn clear_bills(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Shared checks applied before a menu item reaches any store: non-blank
/// name and category, finite non-negative price.
pub fn validate_new_menu_item(item: &NewMenuItem) -> Result<()> {
    if item.name.trim().is_empty() {
        return Err(PosError::Validation("menu item name cannot be blank".into()));
    }
    if item.category.trim().is_empty() {
        return Err(PosError::Validation(
            "menu item category cannot be blank".into(),
        ));
    }
    if !item.price.is_finite() || item.price < 0.0 {
        return Err(PosError::Validation(format!(
            "menu item price must be a non-negative number, got {}",
            item.price
        )));
    }
    Ok(())
}

fn apply_patch(item: &mut MenuItem, patch: MenuItemPatch) -> Result<()> {
    if let Some(name) = patch.name {
        if name.trim().is_empty() {
            return Err(PosError::Validation("menu item name cannot be blank".into()));
        }
        item.name = name;
    }
    if let Some(price) = patch.price {
        if !price.is_finite() || price < 0.0 {
            return Err(PosError::Validation(format!(
                "menu item price must be a non-negative number, got {price}"
            )));
        }
        item.price = price;
    }
    if let Some(category) = patch.category {
        if category.trim().is_empty() {
            return Err(PosError::Validation(
                "menu item category cannot be blank".into(),
            ));
        }
        item.category = category;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Menu + bill store backed by plain vectors. Used by tests and as the
/// session-local fallback when the database is unavailable.
#[derive(Default)]
pub struct MemoryStore {
    menu: Mutex<Vec<MenuItem>>,
    bills: Mutex<Vec<Bill>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated with the given catalogue.
    pub fn with_menu(items: Vec<MenuItem>) -> Self {
        Self {
            menu: Mutex::new(items),
            bills: Mutex::new(Vec::new()),
        }
    }
}

impl MenuRepository for MemoryStore {
    fn list_items(&self) -> Result<Vec<MenuItem>> {
        Ok(self.menu.lock().unwrap().clone())
    }

    fn add_item(&self, item: NewMenuItem) -> Result<MenuItem> {
        validate_new_menu_item(&item)?;
        let item = MenuItem {
            id: format!("item-{}", uuid::Uuid::new_v4()),
            name: item.name,
            price: item.price,
            category: item.category,
        };
        self.menu.lock().unwrap().push(item.clone());
        Ok(item)
    }

    fn update_item(&self, id: &str, patch: MenuItemPatch) -> Result<MenuItem> {
        let mut menu = self.menu.lock().unwrap();
        let item = menu
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| PosError::Validation(format!("no menu item with id {id}")))?;
        apply_patch(item, patch)?;
        Ok(item.clone())
    }

    fn delete_item(&self, id: &str) -> Result<()> {
        let mut menu = self.menu.lock().unwrap();
        let before = menu.len();
        menu.retain(|i| i.id != id);
        if menu.len() == before {
            return Err(PosError::Validation(format!("no menu item with id {id}")));
        }
        Ok(())
    }
}

impl BillRepository for MemoryStore {
    fn save_bill(&self, bill: &Bill) -> Result<()> {
        self.bills.lock().unwrap().push(bill.clone());
        Ok(())
    }

    fn list_bills(&self) -> Result<Vec<Bill>> {
        let mut bills = self.bills.lock().unwrap().clone();
        bills.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(bills)
    }

    fn delete_bill(&self, bill_number: &str) -> Result<()> {
        let mut bills = self.bills.lock().unwrap();
        let before = bills.len();
        bills.retain(|b| b.bill_number != bill_number);
        if bills.len() == before {
            return Err(PosError::Validation(format!("no bill {bill_number}")));
        }
        Ok(())
    }

    fn clear_bills(&self) -> Result<()> {
        self.bills.lock().unwrap().clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn new_item(name: &str, price: f64) -> NewMenuItem {
        NewMenuItem {
            name: name.into(),
            price,
            category: "beverages".into(),
        }
    }

    #[test]
    fn add_assigns_a_unique_id() {
        let store = MemoryStore::new();
        let a = store.add_item(new_item("Tea", 30.0)).unwrap();
        let b = store.add_item(new_item("Coffee", 50.0)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.list_items().unwrap().len(), 2);
    }

    #[test]
    fn validation_rejects_blank_and_negative() {
        assert!(validate_new_menu_item(&new_item("  ", 10.0)).is_err());
        assert!(validate_new_menu_item(&new_item("Tea", -1.0)).is_err());
        assert!(validate_new_menu_item(&new_item("Tea", f64::NAN)).is_err());
        assert!(validate_new_menu_item(&new_item("Tea", 0.0)).is_ok());
    }

    #[test]
    fn patch_updates_only_supplied_fields() {
        let store = MemoryStore::new();
        let item = store.add_item(new_item("Tea", 30.0)).unwrap();
        let updated = store
            .update_item(
                &item.id,
                MenuItemPatch {
                    price: Some(35.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Tea");
        assert_eq!(updated.price, 35.0);
        assert_eq!(updated.category, "beverages");
    }

    #[test]
    fn delete_of_unknown_id_is_an_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.delete_item("missing"),
            Err(PosError::Validation(_))
        ));
    }

    #[test]
    fn bills_list_most_recent_first() {
        let store = MemoryStore::new();
        for (n, day) in [("BL000001", 3), ("BL000002", 7), ("BL000003", 5)] {
            store
                .save_bill(&Bill {
                    bill_number: n.into(),
                    items: vec![],
                    subtotal: 0.0,
                    gst: 0.0,
                    total: 0.0,
                    date: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
                    billed_by: None,
                })
                .unwrap();
        }
        let bills = store.list_bills().unwrap();
        let numbers: Vec<&str> = bills.iter().map(|b| b.bill_number.as_str()).collect();
        assert_eq!(numbers, ["BL000002", "BL000003", "BL000001"]);

        store.delete_bill("BL000003").unwrap();
        assert_eq!(store.list_bills().unwrap().len(), 2);
        store.clear_bills().unwrap();
        assert!(store.list_bills().unwrap().is_empty());
    }
}
