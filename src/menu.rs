//! Menu catalogue: the starter menu seeded on first run, and a snapshot
//! service that keeps billing usable when the backing store drops out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::error::Result;
use crate::repo::MenuRepository;
use crate::retry::RetryPolicy;
use crate::types::{MenuItem, MenuItemPatch, NewMenuItem};

fn item(id: &str, name: &str, price: f64, category: &str) -> MenuItem {
    MenuItem {
        id: id.into(),
        name: name.into(),
        price,
        category: category.into(),
    }
}

/// The catalogue a fresh terminal starts with.
pub fn starter_menu() -> Vec<MenuItem> {
    vec![
        // Starters
        item("1", "Paneer Tikka", 180.0, "starters"),
        item("2", "Gobi Manchurian", 140.0, "starters"),
        item("3", "Veg Spring Roll", 120.0, "starters"),
        item("4", "Mushroom 65", 160.0, "starters"),
        item("5", "Crispy Corn", 130.0, "starters"),
        item("6", "Aloo Tikki", 80.0, "starters"),
        // Main course
        item("7", "Paneer Butter Masala", 220.0, "main-course"),
        item("8", "Dal Makhani", 180.0, "main-course"),
        item("9", "Chana Masala", 150.0, "main-course"),
        item("10", "Kadai Paneer", 200.0, "main-course"),
        item("11", "Veg Kolhapuri", 170.0, "main-course"),
        item("12", "Malai Kofta", 210.0, "main-course"),
        // Rice
        item("13", "Jeera Rice", 100.0, "rice"),
        item("14", "Veg Biryani", 180.0, "rice"),
        item("15", "Pulao", 120.0, "rice"),
        item("16", "Fried Rice", 140.0, "rice"),
        // Breads
        item("17", "Butter Naan", 45.0, "breads"),
        item("18", "Garlic Naan", 55.0, "breads"),
        item("19", "Roti", 25.0, "breads"),
        item("20", "Paratha", 40.0, "breads"),
        item("21", "Kulcha", 50.0, "breads"),
        // Beverages
        item("22", "Masala Chai", 30.0, "beverages"),
        item("23", "Filter Coffee", 40.0, "beverages"),
        item("24", "Lassi", 60.0, "beverages"),
        item("25", "Fresh Lime Soda", 50.0, "beverages"),
        item("26", "Buttermilk", 35.0, "beverages"),
        // Desserts
        item("27", "Gulab Jamun", 60.0, "desserts"),
        item("28", "Rasmalai", 80.0, "desserts"),
        item("29", "Ice Cream", 70.0, "desserts"),
        item("30", "Kheer", 65.0, "desserts"),
    ]
}

// ---------------------------------------------------------------------------
// Snapshot service
// ---------------------------------------------------------------------------

/// Menu access with a last-known-good cache.
///
/// Loads go through the repository with bounded retries; when the store
/// stays unreachable the service serves the cached snapshot and flags
/// itself offline, so billing keeps working against stale prices rather
/// than stopping. The next successful load clears the flag.
pub struct MenuService {
    repo: Arc<dyn MenuRepository>,
    retry: RetryPolicy,
    cache: Mutex<Vec<MenuItem>>,
    offline: AtomicBool,
}

impl MenuService {
    pub fn new(repo: Arc<dyn MenuRepository>, retry: RetryPolicy) -> Self {
        MenuService {
            repo,
            retry,
            cache: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// True when the last load fell back to the cached snapshot.
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    /// Current catalogue. Transient store failures are retried, then
    /// fall back to the last-known-good snapshot; validation and
    /// persistence errors propagate unchanged.
    pub fn load(&self) -> Result<Vec<MenuItem>> {
        match self.retry.run(|| self.repo.list_items()) {
            Ok(items) => {
                *self.cache.lock().unwrap() = items.clone();
                self.offline.store(false, Ordering::Relaxed);
                Ok(items)
            }
            Err(e) if e.is_transient() => {
                warn!(error = %e, "menu load failed, serving cached snapshot");
                self.offline.store(true, Ordering::Relaxed);
                Ok(self.cache.lock().unwrap().clone())
            }
            Err(e) => Err(e),
        }
    }

    pub fn add_item(&self, item: NewMenuItem) -> Result<MenuItem> {
        let added = self.repo.add_item(item)?;
        self.cache.lock().unwrap().push(added.clone());
        Ok(added)
    }

    pub fn update_item(&self, id: &str, patch: MenuItemPatch) -> Result<MenuItem> {
        let updated = self.repo.update_item(id, patch)?;
        let mut cache = self.cache.lock().unwrap();
        if let Some(slot) = cache.iter_mut().find(|i| i.id == id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    pub fn delete_item(&self, id: &str) -> Result<()> {
        self.repo.delete_item(id)?;
        self.cache.lock().unwrap().retain(|i| i.id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
