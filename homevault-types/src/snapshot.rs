//! Compact item projection sent to the assistant proxy.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable projection of an [`InventoryItem`](crate::InventoryItem) for prompting.
///
/// Created fresh for each question and never persisted. Fields that are not
/// set on the item serialize as JSON `null`; the proxy substitutes its
/// "not set" sentinel when it renders the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub purchase_price: Option<Decimal>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub warranty_end_date: Option<NaiveDate>,
    /// Service phone number. Keeps the backend column name on the wire.
    #[serde(default, rename = "phone")]
    pub service_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub manual_url: Option<String>,
}

/// Body of a `POST /ask-assistant` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    /// The trimmed user question.
    pub question: String,
    /// Snapshot of the user's items, newest first.
    #[serde(default)]
    pub items: Vec<ItemSnapshot>,
}

/// Error body returned by the proxy on non-success responses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }
}
