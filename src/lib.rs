//! Senthoor POS - billing core
//!
//! The headless billing engine behind the counter terminal: cart state,
//! GST totals, fixed-width receipt rendering, PDF/CSV/ZIP exports, bill
//! history filtering, and SQLite persistence for the menu catalogue and
//! bill ledger. The UI layer drives these APIs; nothing here touches a
//! window or a printer directly.

pub mod cart;
pub mod db;
pub mod error;
pub mod export;
pub mod history;
pub mod logging;
pub mod menu;
pub mod pdf;
pub mod receipt;
pub mod repo;
pub mod retry;
pub mod session;
pub mod totals;
pub mod types;

pub use cart::{Cart, ManualPricePolicy};
pub use error::{PosError, Result};
pub use export::ExportFile;
pub use history::{BillFilter, MonthKey};
pub use receipt::ReceiptLayout;
pub use repo::{BillRepository, MemoryStore, MenuRepository};
pub use retry::RetryPolicy;
pub use session::BillingSession;
pub use totals::{BillTotals, TaxConfig};
pub use types::{Bill, BillLine, MenuItem, MenuItemPatch, NewMenuItem};
