//! Inventory records as stored by the hosted backend.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An embedded `{ id, name }` join, as returned for `rooms(id, name)` and
/// `categories(id, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    /// Row identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl NamedRef {
    /// Build a reference from an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A single belonging registered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Unique item identifier.
    pub id: String,
    /// Owner of the item.
    #[serde(default)]
    pub user_id: String,
    /// Display name, e.g. "מקרר סמסונג".
    pub name: String,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Foreign key into `categories`.
    #[serde(default)]
    pub category_id: Option<String>,
    /// Foreign key into `rooms`.
    #[serde(default)]
    pub room_id: Option<String>,
    /// Joined category row.
    #[serde(default, rename = "categories")]
    pub category: Option<NamedRef>,
    /// Joined room row.
    #[serde(default, rename = "rooms")]
    pub room: Option<NamedRef>,
    /// Date of purchase.
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    /// Price paid. Serialized as a plain JSON number.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub purchase_price: Option<Decimal>,
    /// Last day covered by the warranty.
    #[serde(default)]
    pub warranty_end_date: Option<NaiveDate>,
    /// Object-store path or URL of the scanned warranty document.
    #[serde(default)]
    pub warranty_file_url: Option<String>,
    /// Service phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Link to the product manual.
    #[serde(default)]
    pub manual_url: Option<String>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Create an item with only the required fields set.
    ///
    /// Both timestamps are set to `created_at`.
    pub fn new(id: impl Into<String>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: String::new(),
            name: name.into(),
            notes: None,
            category_id: None,
            room_id: None,
            category: None,
            room: None,
            purchase_date: None,
            purchase_price: None,
            warranty_end_date: None,
            warranty_file_url: None,
            phone: None,
            manual_url: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Name of the joined category, if any.
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }

    /// Name of the joined room, if any.
    pub fn room_name(&self) -> Option<&str> {
        self.room.as_ref().map(|r| r.name.as_str())
    }
}

/// A user-defined category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A user-defined room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A file attached to an item (receipt, photo, manual scan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFile {
    pub id: String,
    pub item_id: String,
    /// Original file name as uploaded.
    pub file_name: String,
    /// Path inside the object store bucket.
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

impl ItemFile {
    /// Object-store path for a new upload: `{user}/{item}/{millis}_{file_name}`.
    pub fn storage_path(
        user_id: &str,
        item_id: &str,
        uploaded_at: DateTime<Utc>,
        file_name: &str,
    ) -> String {
        format!(
            "{user_id}/{item_id}/{}_{file_name}",
            uploaded_at.timestamp_millis()
        )
    }
}
