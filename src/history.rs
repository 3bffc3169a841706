//! Bill-history filtering and aggregation.
//!
//! Stateless pure functions over a slice of persisted bills: narrow by day,
//! month, or date range (all bounds inclusive), sum the filtered totals, and
//! enumerate the distinct year-months present for the month picker.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Bill;

/// A year-month bucket, e.g. `2024-03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        MonthKey { year, month }
    }

    pub fn of(date: DateTime<Utc>) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The user-selected criterion for narrowing bill history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BillFilter {
    All,
    Day { date: NaiveDate },
    Month { month: MonthKey },
    Range { start: NaiveDate, end: NaiveDate },
}

impl BillFilter {
    /// Whether a bill timestamp falls inside the filter's interval. Day,
    /// month, and range bounds are inclusive; a range with start > end
    /// matches nothing rather than silently swapping the endpoints.
    pub fn matches(&self, date: DateTime<Utc>) -> bool {
        let day = date.date_naive();
        match *self {
            BillFilter::All => true,
            BillFilter::Day { date } => day == date,
            BillFilter::Month { month } => MonthKey::of(date) == month,
            BillFilter::Range { start, end } => start <= day && day <= end,
        }
    }

    /// Short label used in export filenames: `all`, `2024-03-05`,
    /// `2024-03`, or `2024-03-01_2024-03-31`.
    pub fn label(&self) -> String {
        match *self {
            BillFilter::All => "all".to_string(),
            BillFilter::Day { date } => date.format("%Y-%m-%d").to_string(),
            BillFilter::Month { month } => month.to_string(),
            BillFilter::Range { start, end } => format!(
                "{}_{}",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ),
        }
    }
}

/// Narrow a bill collection to the filter's interval, preserving the input
/// order (newest-first as delivered by the repository).
pub fn filter_bills<'a>(bills: &'a [Bill], filter: &BillFilter) -> Vec<&'a Bill> {
    bills.iter().filter(|b| filter.matches(b.date)).collect()
}

/// Sum of `total` over a filtered subset.
pub fn aggregate_total(bills: &[&Bill]) -> f64 {
    bills.iter().map(|b| b.total).sum()
}

/// Distinct year-month buckets present in the collection, most recent
/// first. Drives the month-selection control.
pub fn month_buckets(bills: &[Bill]) -> Vec<MonthKey> {
    let mut keys: Vec<MonthKey> = bills.iter().map(|b| MonthKey::of(b.date)).collect();
    keys.sort_unstable();
    keys.dedup();
    keys.reverse();
    keys
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
