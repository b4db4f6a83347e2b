use std::collections::HashMap;

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::OrderAggregate;

// ============================================================================
// Reporting - Dashboard KPIs
// ============================================================================
//
// Pure functions over a snapshot of orders. Orders are selected by creation
// date; "confirmed" here means at least one confirmation on the ledger, which
// is looser than the scanner's fully-confirmed rule.
//
// Rankings sort descending with a stable sort, so equal totals keep the
// order in which their key was first met.
//
// ============================================================================

/// Flat estimate used in place of real pricing.
pub const UNIT_PRICE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

pub const DEFAULT_TOP_N: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportingPeriod {
    #[default]
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1A")]
    OneYear,
}

impl ReportingPeriod {
    fn months(&self) -> u32 {
        match self {
            ReportingPeriod::OneMonth => 1,
            ReportingPeriod::ThreeMonths => 3,
            ReportingPeriod::OneYear => 12,
        }
    }

    /// `[today - period, today]`. Month arithmetic clamps to the last day of
    /// a shorter month.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleTotal {
    pub technology: String,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTotal {
    pub client_name: String,
    pub orders: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiReport {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub confirmed_count: u64,
    pub unconfirmed_count: u64,
    pub estimated_revenue: Decimal,
    pub top_articles: Vec<ArticleTotal>,
    pub top_clients: Vec<ClientTotal>,
}

pub fn compute_kpis(
    orders: &[OrderAggregate],
    window_start: NaiveDate,
    window_end: NaiveDate,
    top_n: usize,
) -> KpiReport {
    let in_window: Vec<&OrderAggregate> = orders
        .iter()
        .filter(|o| o.creation_date >= window_start && o.creation_date <= window_end)
        .collect();

    let confirmed_count = in_window.iter().filter(|o| o.has_confirmations()).count() as u64;
    let unconfirmed_count = in_window.len() as u64 - confirmed_count;

    let estimated_revenue = in_window
        .iter()
        .map(|o| o.ordered_quantity() * UNIT_PRICE)
        .sum();

    KpiReport {
        window_start,
        window_end,
        confirmed_count,
        unconfirmed_count,
        estimated_revenue,
        top_articles: top_articles(in_window.iter().copied(), top_n),
        top_clients: top_clients(in_window.iter().copied(), top_n),
    }
}

/// Ordered quantity summed per technology, largest first.
pub fn top_articles<'a>(
    orders: impl IntoIterator<Item = &'a OrderAggregate>,
    n: usize,
) -> Vec<ArticleTotal> {
    ranked(orders, |o| (o.details.technology.as_str(), o.ordered_quantity()), Decimal::ZERO)
        .into_iter()
        .take(n)
        .map(|(technology, quantity)| ArticleTotal { technology, quantity })
        .collect()
}

/// Number of orders per client, most orders first.
pub fn top_clients<'a>(
    orders: impl IntoIterator<Item = &'a OrderAggregate>,
    n: usize,
) -> Vec<ClientTotal> {
    ranked(orders, |o| (o.details.client_name.as_str(), 1u64), 0u64)
        .into_iter()
        .take(n)
        .map(|(client_name, orders)| ClientTotal { client_name, orders })
        .collect()
}

/// Group by key in first-encounter order, then stable-sort by total.
fn ranked<'a, T, F>(
    orders: impl IntoIterator<Item = &'a OrderAggregate>,
    key_and_amount: F,
    zero: T,
) -> Vec<(String, T)>
where
    T: Copy + Ord + std::ops::Add<Output = T>,
    F: Fn(&'a OrderAggregate) -> (&'a str, T),
{
    let mut totals: Vec<(String, T)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for order in orders {
        let (key, amount) = key_and_amount(order);
        let slot = *index.entry(key).or_insert_with(|| {
            totals.push((key.to_string(), zero));
            totals.len() - 1
        });
        totals[slot].1 = totals[slot].1 + amount;
    }

    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals
}
