//! Full-account JSON export.

use chrono::{DateTime, Utc};
use homevault_types::{Category, InventoryItem, ItemFile, Room};
use serde::{Deserialize, Serialize};

/// Errors from building an export file.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Snapshot of every table the user owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub categories: Vec<Category>,
    pub rooms: Vec<Room>,
    pub items: Vec<InventoryItem>,
    pub item_files: Vec<ItemFile>,
}

impl ExportDocument {
    pub fn new(
        exported_at: DateTime<Utc>,
        categories: Vec<Category>,
        rooms: Vec<Room>,
        items: Vec<InventoryItem>,
        item_files: Vec<ItemFile>,
    ) -> Self {
        Self {
            exported_at,
            categories,
            rooms,
            items,
            item_files,
        }
    }

    /// Download name, e.g. `homevault-export-2025-06-01.json`.
    pub fn file_name(&self) -> String {
        format!("homevault-export-{}.json", self.exported_at.format("%Y-%m-%d"))
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
