//! Aggregate statistics over the item list.

use chrono::{Datelike, NaiveDate};
use homevault_types::InventoryItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::warranty::WarrantyStatus;

/// Number of items in one category. `category` is `None` for uncategorized items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Option<String>,
    pub count: usize,
}

/// Money spent in one category. `category` is `None` for uncategorized items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryExpense {
    pub category: Option<String>,
    pub total: Decimal,
}

/// Purchases in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
    /// `YYYY-MM`.
    pub month: String,
    pub count: usize,
}

/// Items sharing one warranty status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantyBucket {
    pub status: WarrantyStatus,
    pub count: usize,
}

/// Everything the statistics page shows, computed in one pass per section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStats {
    pub total_items: usize,
    /// Sum of all recorded purchase prices.
    pub total_spent: Decimal,
    pub active_warranty: usize,
    pub expired_warranty: usize,
    pub no_warranty: usize,
    /// Item count per category, in first-seen order.
    pub by_category: Vec<CategoryCount>,
    /// Purchase count per month, oldest month first.
    pub purchases_by_month: Vec<MonthCount>,
    /// Warranty status breakdown with empty buckets dropped.
    pub warranty_breakdown: Vec<WarrantyBucket>,
    /// Spending per category for priced items, in first-seen order.
    pub expenses_by_category: Vec<CategoryExpense>,
}

impl InventoryStats {
    /// Compute statistics for `items` as of `today`.
    pub fn compute(items: &[InventoryItem], today: NaiveDate) -> Self {
        let mut total_spent = Decimal::ZERO;
        let mut active_warranty = 0;
        let mut expired_warranty = 0;
        let mut no_warranty = 0;
        let mut by_category: Vec<CategoryCount> = Vec::new();
        let mut months: Vec<MonthCount> = Vec::new();
        let mut expenses_by_category: Vec<CategoryExpense> = Vec::new();

        for item in items {
            let category = item.category_name().map(str::to_owned);

            match WarrantyStatus::for_item(item, today) {
                WarrantyStatus::Active => active_warranty += 1,
                WarrantyStatus::Expired => expired_warranty += 1,
                WarrantyStatus::NotSet => no_warranty += 1,
            }

            match by_category.iter_mut().find(|c| c.category == category) {
                Some(entry) => entry.count += 1,
                None => by_category.push(CategoryCount {
                    category: category.clone(),
                    count: 1,
                }),
            }

            if let Some(date) = item.purchase_date {
                let month = format!("{:04}-{:02}", date.year(), date.month());
                match months.iter_mut().find(|m| m.month == month) {
                    Some(entry) => entry.count += 1,
                    None => months.push(MonthCount { month, count: 1 }),
                }
            }

            if let Some(price) = item.purchase_price {
                total_spent += price;
                if !price.is_zero() {
                    match expenses_by_category.iter_mut().find(|c| c.category == category) {
                        Some(entry) => entry.total += price,
                        None => expenses_by_category.push(CategoryExpense {
                            category,
                            total: price,
                        }),
                    }
                }
            }
        }

        months.sort_by(|a, b| a.month.cmp(&b.month));

        let warranty_breakdown = [
            (WarrantyStatus::Active, active_warranty),
            (WarrantyStatus::Expired, expired_warranty),
            (WarrantyStatus::NotSet, no_warranty),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(status, count)| WarrantyBucket { status, count })
        .collect();

        Self {
            total_items: items.len(),
            total_spent,
            active_warranty,
            expired_warranty,
            no_warranty,
            by_category,
            purchases_by_month: months,
            warranty_breakdown,
            expenses_by_category,
        }
    }
}
