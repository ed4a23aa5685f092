//! Dashboard filtering and search.

use homevault_types::InventoryItem;

/// Filter applied to the item list on the dashboard.
///
/// Mirrors the backend query: exact match on category and room ids, a
/// case-insensitive substring match on the name, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    category_id: Option<String>,
    room_id: Option<String>,
    search: Option<String>,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keep items in this category.
    #[must_use]
    pub fn category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Only keep items in this room.
    #[must_use]
    pub fn room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    /// Only keep items whose name contains `term`, ignoring case.
    ///
    /// An empty term clears the search.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.is_empty() { None } else { Some(term) };
        self
    }

    /// Whether a single item passes every filter.
    pub fn matches(&self, item: &InventoryItem) -> bool {
        if let Some(category_id) = &self.category_id
            && item.category_id.as_deref() != Some(category_id.as_str())
        {
            return false;
        }
        if let Some(room_id) = &self.room_id
            && item.room_id.as_deref() != Some(room_id.as_str())
        {
            return false;
        }
        match &self.search {
            Some(term) => item.name.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        }
    }

    /// Filter `items` and order the result newest first by creation time.
    ///
    /// Items created at the same instant keep their input order.
    pub fn apply<'a>(&self, items: &'a [InventoryItem]) -> Vec<&'a InventoryItem> {
        let mut matched: Vec<&InventoryItem> = items.iter().filter(|i| self.matches(i)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }
}
