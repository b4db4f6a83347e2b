use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::order::OrderAggregate;
use crate::messaging::ReminderDispatcher;
use crate::metrics::Metrics;
use crate::store::{OrderStore, StoreError};

// ============================================================================
// Delivery-Risk Scanner
// ============================================================================
//
// One tick:
// 1. window = [today, today + lookahead], both ends inclusive
// 2. load orders delivering inside the window
// 3. keep the ones that are not fully confirmed
// 4. hand each to the dispatcher on its own task (fire-and-forget)
//
// Nothing survives between ticks. A store failure ends the tick; a failed
// dispatch is logged and counted, never retried within the tick.
//
// The actor driving the interval lives in actors::infrastructure::scanner.
//
// ============================================================================

pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 3;

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Orders delivering inside the window
    pub scanned: usize,
    /// Orders a reminder was dispatched for
    pub at_risk: Vec<Uuid>,
}

/// Orders inside `[start, end]` that are still short on confirmations.
///
/// The window is checked again here so a store returning a wider range
/// cannot widen the selection.
pub fn select_at_risk(
    orders: Vec<OrderAggregate>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<OrderAggregate> {
    orders
        .into_iter()
        .filter(|o| o.delivery_date >= start && o.delivery_date <= end)
        .filter(|o| !o.is_fully_confirmed())
        .collect()
}

pub struct DeliveryRiskScanner {
    store: Arc<dyn OrderStore>,
    dispatcher: Arc<dyn ReminderDispatcher>,
    metrics: Arc<Metrics>,
    lookahead: Duration,
}

impl DeliveryRiskScanner {
    pub fn new(
        store: Arc<dyn OrderStore>,
        dispatcher: Arc<dyn ReminderDispatcher>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            metrics,
            lookahead: Duration::days(DEFAULT_LOOKAHEAD_DAYS),
        }
    }

    pub fn with_lookahead(mut self, lookahead: Duration) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Past the end of the calendar the window is open-ended.
    pub fn window(&self, now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
        let end = now
            .checked_add_signed(self.lookahead)
            .map(|horizon| horizon.date_naive())
            .unwrap_or(NaiveDate::MAX);
        (now.date_naive(), end)
    }

    /// Run one tick at `now`.
    ///
    /// Returns once every reminder has been handed off, not once they are
    /// delivered.
    pub async fn scan(&self, now: DateTime<Utc>) -> Result<ScanReport, StoreError> {
        let started = Instant::now();
        let (start, end) = self.window(now);

        let orders = match self.store.find_by_delivery_window(start, end).await {
            Ok(orders) => orders,
            Err(e) => {
                self.metrics.record_scan_failure();
                tracing::error!(
                    error = %e,
                    window_start = %start,
                    window_end = %end,
                    "Delivery scan aborted: order store unavailable"
                );
                return Err(e);
            }
        };

        let scanned = orders.len();
        let at_risk = select_at_risk(orders, start, end);
        let ids: Vec<Uuid> = at_risk.iter().map(|o| o.id).collect();

        for order in at_risk {
            let dispatcher = self.dispatcher.clone();
            let metrics = self.metrics.clone();

            tokio::spawn(async move {
                match dispatcher.send_reminder(&order).await {
                    Ok(()) => metrics.record_reminder(true, ""),
                    Err(e) => {
                        metrics.record_reminder(false, e.reason());
                        tracing::warn!(
                            order_id = %order.id,
                            error = %e,
                            "Reminder dispatch failed"
                        );
                    }
                }
            });
        }

        self.metrics
            .record_scan(started.elapsed().as_secs_f64(), ids.len());

        tracing::info!(
            window_start = %start,
            window_end = %end,
            scanned = scanned,
            at_risk = ids.len(),
            "🔎 Delivery scan complete"
        );

        Ok(ScanReport {
            window_start: start,
            window_end: end,
            scanned,
            at_risk: ids,
        })
    }

    /// Scheduled entry point: failures are already logged and counted by
    /// `scan`, the next tick starts from scratch.
    pub async fn tick(&self) -> Option<ScanReport> {
        self.scan(Utc::now()).await.ok()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use tokio::sync::mpsc;

    use crate::domain::order::fixtures::{day, stored_order};
    use crate::store::InMemoryOrderStore;

    /// 2024-06-10 08:30 UTC, so the window is [06-10, 06-13]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 8, 30, 0).unwrap()
    }

    async fn seeded(orders: &[OrderAggregate]) -> Arc<InMemoryOrderStore> {
        let store = Arc::new(InMemoryOrderStore::new());
        for order in orders {
            store.save(order, 0).await.unwrap();
        }
        store
    }

    async fn drain(rx: &mut mpsc::UnboundedReceiver<Uuid>, expected: usize) -> HashSet<Uuid> {
        let mut ids = HashSet::new();
        for _ in 0..expected {
            let id = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            ids.insert(id);
        }
        ids
    }

    #[test]
    fn test_select_at_risk_set_difference() {
        let a = stored_order(10, day(11), 10);
        let b = stored_order(10, day(12), 4);
        let c = stored_order(10, day(20), 0);

        let selected = select_at_risk(vec![a, b.clone(), c], day(10), day(13));

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, b.id);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let first = stored_order(5, day(10), 0);
        let last = stored_order(5, day(13), 0);
        let after = stored_order(5, day(14), 0);
        let before = stored_order(5, day(9), 0);

        let selected = select_at_risk(vec![first, last, after, before], day(10), day(13));

        assert_eq!(selected.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_dispatches_only_at_risk_orders() {
        let a = stored_order(10, day(11), 10);
        let b = stored_order(10, day(12), 4);
        let c = stored_order(10, day(20), 0);
        let store = seeded(&[a, b.clone(), c]).await;

        let (dispatcher, mut rx) = RecordingDispatcher::new();
        let scanner = DeliveryRiskScanner::new(
            store,
            Arc::new(dispatcher),
            Arc::new(Metrics::new().unwrap()),
        );

        let report = scanner.scan(now()).await.unwrap();

        assert_eq!(report.window_start, day(10));
        assert_eq!(report.window_end, day(13));
        assert_eq!(report.scanned, 2);
        assert_eq!(report.at_risk, vec![b.id]);
        assert_eq!(drain(&mut rx, 1).await, HashSet::from([b.id]));
    }

    #[tokio::test]
    async fn test_dispatch_failure_does_not_abort_tick() {
        let first = stored_order(10, day(11), 0);
        let second = stored_order(10, day(12), 0);
        let third = stored_order(10, day(13), 9);
        let store = seeded(&[first.clone(), second.clone(), third.clone()]).await;

        let (inner, mut rx) = RecordingDispatcher::new();
        let metrics = Arc::new(Metrics::new().unwrap());
        let scanner = DeliveryRiskScanner::new(
            store,
            Arc::new(FlakyDispatcher {
                failing: first.id,
                inner,
            }),
            metrics.clone(),
        );

        let report = scanner.scan(now()).await.unwrap();

        assert_eq!(report.at_risk.len(), 3);
        assert_eq!(drain(&mut rx, 2).await, HashSet::from([second.id, third.id]));

        // The failing task may still be finishing
        for _ in 0..50 {
            if metrics.reminders_failed.with_label_values(&["publish_failed"]).get() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(metrics.reminders_failed.with_label_values(&["publish_failed"]).get(), 1);
    }

    struct UnavailableStore;

    #[async_trait]
    impl OrderStore for UnavailableStore {
        async fn find_by_delivery_window(
            &self,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<OrderAggregate>, StoreError> {
            Err(StoreError::backend("connection refused"))
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<OrderAggregate>, StoreError> {
            Err(StoreError::backend("connection refused"))
        }
        async fn find_all(&self) -> Result<Vec<OrderAggregate>, StoreError> {
            Err(StoreError::backend("connection refused"))
        }
        async fn save(&self, _order: &OrderAggregate, _expected: i64) -> Result<(), StoreError> {
            Err(StoreError::backend("connection refused"))
        }
        async fn delete(&self, _id: Uuid) -> Result<bool, StoreError> {
            Err(StoreError::backend("connection refused"))
        }
        async fn delete_all(&self) -> Result<u64, StoreError> {
            Err(StoreError::backend("connection refused"))
        }
        async fn count_all(&self) -> Result<u64, StoreError> {
            Err(StoreError::backend("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_store_failure_aborts_tick_without_dispatch() {
        let (dispatcher, mut rx) = RecordingDispatcher::new();
        let metrics = Arc::new(Metrics::new().unwrap());
        let scanner = DeliveryRiskScanner::new(
            Arc::new(UnavailableStore),
            Arc::new(dispatcher),
            metrics.clone(),
        );

        assert!(scanner.scan(now()).await.is_err());
        assert!(scanner.tick().await.is_none());

        assert_eq!(metrics.scan_failures.get(), 2);
        assert_eq!(metrics.scan_ticks.get(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_custom_lookahead() {
        let near = stored_order(10, day(11), 0);
        let far = stored_order(10, day(16), 0);
        let store = seeded(&[near, far]).await;

        let (dispatcher, _rx) = RecordingDispatcher::new();
        let scanner = DeliveryRiskScanner::new(
            store,
            Arc::new(dispatcher),
            Arc::new(Metrics::new().unwrap()),
        )
        .with_lookahead(Duration::days(7));

        let report = scanner.scan(now()).await.unwrap();

        assert_eq!(report.window_end, day(17));
        assert_eq!(report.at_risk.len(), 2);
    }

    #[test]
    fn test_window_saturates_instead_of_overflowing() {
        let (dispatcher, _rx) = RecordingDispatcher::new();
        let scanner = DeliveryRiskScanner::new(
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(dispatcher),
            Arc::new(Metrics::new().unwrap()),
        )
        .with_lookahead(Duration::days(1_000_000_000));

        assert_eq!(scanner.window(now()), (day(10), NaiveDate::MAX));
    }
}
