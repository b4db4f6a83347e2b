use serde::{Deserialize, Serialize};

use super::aggregate::OrderAggregate;

// ============================================================================
// Order Listing
// ============================================================================
//
// Search, status filter, newest-first ordering and pagination over a set of
// loaded orders. Kept free of storage concerns so every store shares it.
//
// ============================================================================

pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    /// At least one confirmation recorded
    Confirmed,
    /// Empty ledger
    Unconfirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderQuery {
    /// 1-based
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive substring over client name, technology and client id
    pub search: Option<String>,
    pub status: Option<StatusFilter>,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<OrderAggregate>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

/// Listing order shared by the order list and the dashboard: newest
/// creation date first, then the newest id. Order ids are UUIDv7, so within
/// one day the id follows creation time.
pub fn sort_newest_first(orders: &mut [OrderAggregate]) {
    orders.sort_by(|a, b| {
        b.creation_date
            .cmp(&a.creation_date)
            .then_with(|| b.id.cmp(&a.id))
    });
}

impl OrderQuery {
    fn matches(&self, order: &OrderAggregate) -> bool {
        if let Some(status) = self.status {
            let confirmed = order.has_confirmations();
            match status {
                StatusFilter::Confirmed if !confirmed => return false,
                StatusFilter::Unconfirmed if confirmed => return false,
                _ => {}
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                [
                    &order.details.client_name,
                    &order.details.technology,
                    &order.details.client_id,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }

    /// Filter, sort by creation date (newest first) and cut out one page.
    pub fn apply(&self, orders: Vec<OrderAggregate>) -> OrderPage {
        let page = self.page.max(1);
        let limit = self.limit.max(1);

        let mut selected: Vec<OrderAggregate> =
            orders.into_iter().filter(|o| self.matches(o)).collect();
        sort_newest_first(&mut selected);

        let total = selected.len() as u64;
        let pages = total.div_ceil(limit as u64);
        let skip = (page as usize - 1).saturating_mul(limit as usize);

        OrderPage {
            orders: selected.into_iter().skip(skip).take(limit as usize).collect(),
            page,
            limit,
            total,
            pages,
        }
    }
}
