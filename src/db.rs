//! Local SQLite persistence for the menu catalogue and bill history.
//!
//! Uses rusqlite with WAL mode. Bill line items are stored as a JSON
//! column in the camelCase wire shape, so a row round-trips to the same
//! payload the dashboard export produces. Schema changes go through
//! numbered migrations tracked in `schema_version`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use crate::error::{PosError, Result};
use crate::menu::starter_menu;
use crate::repo::{validate_new_menu_item, BillRepository, MenuRepository};
use crate::types::{Bill, BillLine, MenuItem, MenuItemPatch, NewMenuItem};

/// Current schema version. Bump when adding new migrations.
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Database handle shared across the app. rusqlite connections are not
/// Sync, hence the mutex.
pub struct Db {
    conn: Mutex<Connection>,
    pub db_path: PathBuf,
}

impl Db {
    /// Open (or create) the database at `{data_dir}/pos.db`.
    ///
    /// Creates the directory if needed, applies pragmas, runs pending
    /// migrations, and seeds the starter menu when the catalogue is
    /// empty. On open failure the file is deleted and the open retried
    /// once, matching how the terminal recovers from a corrupt store.
    pub fn init(data_dir: &Path) -> Result<Db> {
        fs::create_dir_all(data_dir)
            .map_err(|e| PosError::Persistence(format!("create data dir: {e}")))?;

        let db_path = data_dir.join("pos.db");
        info!("Opening database at {}", db_path.display());

        let conn = match open_and_configure(&db_path) {
            Ok(c) => c,
            Err(first_err) => {
                warn!("Database open failed ({first_err}), deleting and retrying once");
                if db_path.exists() {
                    let _ = fs::remove_file(&db_path);
                    let _ = fs::remove_file(db_path.with_extension("db-wal"));
                    let _ = fs::remove_file(db_path.with_extension("db-shm"));
                }
                open_and_configure(&db_path)?
            }
        };

        run_migrations(&conn)?;
        seed_menu_if_empty(&conn)?;

        info!("Database initialized (schema v{CURRENT_SCHEMA_VERSION})");

        Ok(Db {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// In-memory database with the full schema and starter menu. Test
    /// use only from production code's point of view, but also handy for
    /// demo runs.
    pub fn open_in_memory() -> Result<Db> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        seed_menu_if_empty(&conn)?;
        Ok(Db {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }
}

/// Open the database file and apply pragmas.
fn open_and_configure(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(conn)
}

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT (datetime('now'))
        );",
    )?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current >= CURRENT_SCHEMA_VERSION {
        info!("Database schema up to date (v{current})");
        return Ok(());
    }

    info!("Migrating database from v{current} to v{CURRENT_SCHEMA_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }
    if current < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Migration v1: menu catalogue and bill history.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS menu_items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            price REAL NOT NULL,
            category TEXT NOT NULL
        );

        -- items holds the bill's line snapshot as JSON
        CREATE TABLE IF NOT EXISTS bills (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bill_number TEXT NOT NULL,
            items TEXT NOT NULL,
            subtotal REAL NOT NULL,
            gst REAL NOT NULL DEFAULT 0,
            total REAL NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_bills_created_at ON bills (created_at);

        INSERT INTO schema_version (version) VALUES (1);
        ",
    )?;
    Ok(())
}

/// Migration v2: operator attribution on bills.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        ALTER TABLE bills ADD COLUMN billed_by TEXT;
        INSERT INTO schema_version (version) VALUES (2);
        ",
    )?;
    Ok(())
}

/// Seed the starter catalogue the first time the terminal runs.
fn seed_menu_if_empty(conn: &Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM menu_items", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let items = starter_menu();
    for item in &items {
        conn.execute(
            "INSERT INTO menu_items (id, name, price, category) VALUES (?1, ?2, ?3, ?4)",
            params![item.id, item.name, item.price, item.category],
        )?;
    }
    info!(items = items.len(), "Seeded starter menu");
    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| PosError::Persistence(format!("bad bill timestamp {raw:?}: {e}")))
}

/// A bills row before the JSON/timestamp columns are decoded. rusqlite's
/// row closures can only fail with rusqlite errors, so decoding happens
/// in a second step where serde/chrono errors can propagate.
struct RawBill {
    bill_number: String,
    items_json: String,
    subtotal: f64,
    gst: f64,
    total: f64,
    created_at: String,
    billed_by: Option<String>,
}

fn raw_bill(row: &rusqlite::Row<'_>) -> std::result::Result<RawBill, rusqlite::Error> {
    Ok(RawBill {
        bill_number: row.get("bill_number")?,
        items_json: row.get("items")?,
        subtotal: row.get("subtotal")?,
        gst: row.get("gst")?,
        total: row.get("total")?,
        created_at: row.get("created_at")?,
        billed_by: row.get("billed_by")?,
    })
}

fn decode_bill(raw: RawBill) -> Result<Bill> {
    let items: Vec<BillLine> = serde_json::from_str(&raw.items_json)?;
    Ok(Bill {
        bill_number: raw.bill_number,
        items,
        subtotal: raw.subtotal,
        gst: raw.gst,
        total: raw.total,
        date: parse_date(&raw.created_at)?,
        billed_by: raw.billed_by,
    })
}

// ---------------------------------------------------------------------------
// Repository implementations
// ---------------------------------------------------------------------------

impl MenuRepository for Db {
    fn list_items(&self) -> Result<Vec<MenuItem>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, name, price, category FROM menu_items ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(MenuItem {
                id: row.get(0)?,
                name: row.get(1)?,
                price: row.get(2)?,
                category: row.get(3)?,
            })
        })?;
        let mut items = Vec::new();
        for item in rows {
            items.push(item?);
        }
        Ok(items)
    }

    fn add_item(&self, item: NewMenuItem) -> Result<MenuItem> {
        validate_new_menu_item(&item)?;
        let item = MenuItem {
            id: format!("item-{}", uuid::Uuid::new_v4()),
            name: item.name,
            price: item.price,
            category: item.category,
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO menu_items (id, name, price, category) VALUES (?1, ?2, ?3, ?4)",
            params![item.id, item.name, item.price, item.category],
        )?;
        info!(id = %item.id, name = %item.name, "Added menu item");
        Ok(item)
    }

    fn update_item(&self, id: &str, patch: MenuItemPatch) -> Result<MenuItem> {
        let conn = self.conn.lock().unwrap();
        let existing: Option<MenuItem> = conn
            .query_row(
                "SELECT id, name, price, category FROM menu_items WHERE id = ?1",
                params![id],
                |row| {
                    Ok(MenuItem {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        price: row.get(2)?,
                        category: row.get(3)?,
                    })
                },
            )
            .optional()?;

        let mut item =
            existing.ok_or_else(|| PosError::Validation(format!("no menu item with id {id}")))?;

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

        conn.execute(
            "UPDATE menu_items SET name = ?2, price = ?3, category = ?4 WHERE id = ?1",
            params![item.id, item.name, item.price, item.category],
        )?;
        Ok(item)
    }

    fn delete_item(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM menu_items WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(PosError::Validation(format!("no menu item with id {id}")));
        }
        Ok(())
    }
}

impl BillRepository for Db {
    fn save_bill(&self, bill: &Bill) -> Result<()> {
        let items_json = serde_json::to_string(&bill.items)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO bills (bill_number, items, subtotal, gst, total, created_at, billed_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                bill.bill_number,
                items_json,
                bill.subtotal,
                bill.gst,
                bill.total,
                bill.date.to_rfc3339(),
                bill.billed_by,
            ],
        )?;
        info!(bill = %bill.bill_number, total = bill.total, "Saved bill");
        Ok(())
    }

    fn list_bills(&self) -> Result<Vec<Bill>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT bill_number, items, subtotal, gst, total, created_at, billed_by
             FROM bills ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], raw_bill)?;
        let mut bills = Vec::new();
        for row in rows {
            bills.push(decode_bill(row?)?);
        }
        Ok(bills)
    }

    fn delete_bill(&self, bill_number: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "DELETE FROM bills WHERE bill_number = ?1",
            params![bill_number],
        )?;
        if changed == 0 {
            return Err(PosError::Validation(format!("no bill {bill_number}")));
        }
        info!(bill = %bill_number, "Deleted bill");
        Ok(())
    }

    fn clear_bills(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute("DELETE FROM bills", [])?;
        info!(removed, "Cleared bill history");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
