//! Projection of inventory records into prompt snapshots.

use homevault_types::{InventoryItem, ItemSnapshot};

/// Empty strings count as unset, the way the backend forms leave them.
fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Project one item.
pub fn project_item(item: &InventoryItem) -> ItemSnapshot {
    ItemSnapshot {
        id: item.id.clone(),
        name: item.name.clone(),
        room: non_empty(item.room_name()),
        category: non_empty(item.category_name()),
        purchase_price: item.purchase_price,
        purchase_date: item.purchase_date,
        warranty_end_date: item.warranty_end_date,
        service_phone: item.phone.clone(),
        notes: item.notes.clone(),
        manual_url: non_empty(item.manual_url.as_deref()),
    }
}

/// Project every item, preserving input order.
pub fn project_items(items: &[InventoryItem]) -> Vec<ItemSnapshot> {
    items.iter().map(project_item).collect()
}
