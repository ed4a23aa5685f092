//! Client-side inventory logic for homevault.
//!
//! Everything here is a pure transformation over item slices: the hosted
//! backend owns storage, these functions own what the dashboard, the item
//! view and the statistics page compute from what it returns.
//!
//! # Usage
//!
//! ```no_run
//! use chrono::Utc;
//! use homevault_inventory::{InventoryStats, ItemQuery};
//! # let items: Vec<homevault_types::InventoryItem> = Vec::new();
//!
//! let visible = ItemQuery::new().search("מקרר").apply(&items);
//! let stats = InventoryStats::compute(&items, Utc::now().date_naive());
//! ```

pub mod export;
pub mod query;
pub mod stats;
pub mod warranty;

pub use export::{ExportDocument, ExportError};
pub use query::ItemQuery;
pub use stats::{CategoryCount, CategoryExpense, InventoryStats, MonthCount, WarrantyBucket};
pub use warranty::{EXPIRY_WINDOW_DAYS, ExpiringItem, WarrantyStatus, expiring_soon};
