//! Warranty status and expiry alerts.

use chrono::NaiveDate;
use homevault_types::InventoryItem;
use serde::{Deserialize, Serialize};

/// Items whose warranty ends within this many days are flagged as expiring.
pub const EXPIRY_WINDOW_DAYS: i64 = 30;

/// Warranty state of an item on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarrantyStatus {
    /// The warranty covers `today` (the end date is inclusive).
    Active,
    /// The warranty ended before `today`.
    Expired,
    /// No end date recorded.
    NotSet,
}

impl WarrantyStatus {
    /// Classify an optional warranty end date against `today`.
    pub fn of(end_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        match end_date {
            None => Self::NotSet,
            Some(end) if end >= today => Self::Active,
            Some(_) => Self::Expired,
        }
    }

    /// Classify an item's warranty against `today`.
    pub fn for_item(item: &InventoryItem, today: NaiveDate) -> Self {
        Self::of(item.warranty_end_date, today)
    }
}

/// An item whose warranty is about to run out.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiringItem<'a> {
    pub item: &'a InventoryItem,
    /// Whole days until the warranty end date; `0` means it ends today.
    pub days_left: i64,
}

/// Items whose warranty ends within [`EXPIRY_WINDOW_DAYS`] of `today`,
/// soonest first.
pub fn expiring_soon(items: &[InventoryItem], today: NaiveDate) -> Vec<ExpiringItem<'_>> {
    let mut expiring: Vec<ExpiringItem<'_>> = items
        .iter()
        .filter_map(|item| {
            let end = item.warranty_end_date?;
            let days_left = (end - today).num_days();
            (0..=EXPIRY_WINDOW_DAYS)
                .contains(&days_left)
                .then_some(ExpiringItem { item, days_left })
        })
        .collect();
    expiring.sort_by_key(|e| e.days_left);
    expiring
}
