// Private module declaration
mod server;

use prometheus::{
    HistogramOpts, Histogram, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry,
};

pub use server::start_metrics_server;

use crate::utils::CircuitState;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers:
// - Delivery-risk scans (ticks, failures, duration, candidates)
// - Reminder dispatch outcomes
// - Confirmation outcomes and optimistic-concurrency conflicts
// - Circuit breaker state transitions
// - Actor health status
//
// Everything is registered on one registry, scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Scanner
    pub scan_ticks: IntCounter,
    pub scan_failures: IntCounter,
    pub scan_duration: Histogram,
    pub at_risk_orders: IntGauge,

    // Reminders
    pub reminders_dispatched: IntCounter,
    pub reminders_failed: IntCounterVec,

    // Ledger
    pub confirmations_recorded: IntCounter,
    pub confirmations_rejected: IntCounterVec,
    pub version_conflicts: IntCounter,

    // Circuit Breaker
    pub circuit_breaker_state: IntGauge,
    pub circuit_breaker_transitions: IntCounterVec,

    // Actors
    pub actor_health_status: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Scanner
        let scan_ticks = IntCounter::new(
            "delivery_scan_ticks_total",
            "Delivery-risk scan ticks that completed",
        )?;
        registry.register(Box::new(scan_ticks.clone()))?;

        let scan_failures = IntCounter::new(
            "delivery_scan_failures_total",
            "Delivery-risk scan ticks aborted by a store failure",
        )?;
        registry.register(Box::new(scan_failures.clone()))?;

        let scan_duration = Histogram::with_opts(
            HistogramOpts::new("delivery_scan_duration_seconds", "Delivery-risk scan duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(scan_duration.clone()))?;

        let at_risk_orders = IntGauge::new(
            "delivery_at_risk_orders",
            "Orders found at risk by the last completed scan",
        )?;
        registry.register(Box::new(at_risk_orders.clone()))?;

        // Reminders
        let reminders_dispatched = IntCounter::new(
            "reminders_dispatched_total",
            "Reminders handed to the sink successfully",
        )?;
        registry.register(Box::new(reminders_dispatched.clone()))?;

        let reminders_failed = IntCounterVec::new(
            Opts::new("reminders_failed_total", "Reminders the sink did not accept"),
            &["reason"],
        )?;
        registry.register(Box::new(reminders_failed.clone()))?;

        // Ledger
        let confirmations_recorded = IntCounter::new(
            "confirmations_recorded_total",
            "Confirmations appended to an order ledger",
        )?;
        registry.register(Box::new(confirmations_recorded.clone()))?;

        let confirmations_rejected = IntCounterVec::new(
            Opts::new("confirmations_rejected_total", "Confirmations refused by the ledger"),
            &["reason"],
        )?;
        registry.register(Box::new(confirmations_rejected.clone()))?;

        let version_conflicts = IntCounter::new(
            "order_version_conflicts_total",
            "Order writes that lost an optimistic-concurrency race",
        )?;
        registry.register(Box::new(version_conflicts.clone()))?;

        // Circuit Breaker
        let circuit_breaker_state = IntGauge::new(
            "circuit_breaker_state",
            "Circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        let circuit_breaker_transitions = IntCounterVec::new(
            Opts::new("circuit_breaker_transitions_total", "Circuit breaker state transitions"),
            &["from_state", "to_state"],
        )?;
        registry.register(Box::new(circuit_breaker_transitions.clone()))?;

        // Actors
        let actor_health_status = IntGauge::new(
            "actor_health_status",
            "Actor health status (0=Unhealthy, 1=Degraded, 2=Healthy)",
        )?;
        registry.register(Box::new(actor_health_status.clone()))?;

        Ok(Self {
            registry,
            scan_ticks,
            scan_failures,
            scan_duration,
            at_risk_orders,
            reminders_dispatched,
            reminders_failed,
            confirmations_recorded,
            confirmations_rejected,
            version_conflicts,
            circuit_breaker_state,
            circuit_breaker_transitions,
            actor_health_status,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_scan(&self, duration_secs: f64, at_risk: usize) {
        self.scan_ticks.inc();
        self.scan_duration.observe(duration_secs);
        self.at_risk_orders.set(at_risk as i64);
    }

    pub fn record_scan_failure(&self) {
        self.scan_failures.inc();
    }

    pub fn record_reminder(&self, success: bool, reason: &str) {
        if success {
            self.reminders_dispatched.inc();
        } else {
            self.reminders_failed.with_label_values(&[reason]).inc();
        }
    }

    pub fn record_confirmation(&self) {
        self.confirmations_recorded.inc();
    }

    pub fn record_confirmation_rejected(&self, reason: &str) {
        self.confirmations_rejected.with_label_values(&[reason]).inc();
    }

    pub fn record_version_conflict(&self) {
        self.version_conflicts.inc();
    }

    pub fn record_circuit_breaker_transition(&self, from: CircuitState, to: CircuitState) {
        self.circuit_breaker_state.set(to.as_gauge());
        self.circuit_breaker_transitions
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
    }

    /// 0 = unhealthy, 1 = degraded, 2 = healthy
    pub fn set_health_status(&self, status: i64) {
        self.actor_health_status.set(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_value(metrics: &Metrics, name: &str) -> Option<f64> {
        let gathered = metrics.registry().gather();
        let family = gathered.iter().find(|m| m.name() == name)?;
        family.metric[0].counter.value
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(metrics.registry.gather().len() > 0);
    }

    #[test]
    fn test_record_scan() {
        let metrics = Metrics::new().unwrap();
        metrics.record_scan(0.02, 4);
        metrics.record_scan(0.01, 1);

        assert_eq!(counter_value(&metrics, "delivery_scan_ticks_total"), Some(2.0));
        assert_eq!(metrics.at_risk_orders.get(), 1);
    }

    #[test]
    fn test_record_reminders() {
        let metrics = Metrics::new().unwrap();
        metrics.record_reminder(true, "");
        metrics.record_reminder(false, "circuit_open");
        metrics.record_reminder(false, "publish_failed");

        assert_eq!(counter_value(&metrics, "reminders_dispatched_total"), Some(1.0));

        let gathered = metrics.registry.gather();
        let failed = gathered.iter().find(|m| m.name() == "reminders_failed_total").unwrap();
        assert_eq!(failed.metric.len(), 2);
    }

    #[test]
    fn test_circuit_breaker_metrics() {
        let metrics = Metrics::new().unwrap();
        metrics.record_circuit_breaker_transition(CircuitState::Closed, CircuitState::Open);

        assert_eq!(metrics.circuit_breaker_state.get(), 1);
        assert_eq!(
            metrics
                .circuit_breaker_transitions
                .with_label_values(&["closed", "open"])
                .get(),
            1
        );
    }
}
