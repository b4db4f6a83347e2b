use actix::prelude::*;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use crate::actors::core::{ComponentHealth, HealthCheckable, HealthStatus};
use crate::scheduler::{DeliveryRiskScanner, ScanReport};
use crate::store::StoreError;
use super::HealthMonitorActor;

// ============================================================================
// Scanner Actor - Drives the delivery-risk scan
// ============================================================================
//
// Owns the interval. Every tick runs as a future spawned on the actor's own
// context; while one is in flight further ticks are skipped, so scans never
// overlap. Outcomes are pushed to the health monitor.
//
// Consecutive store failures:
//   0 → Healthy, 1..3 → Degraded, 3+ → Unhealthy
//
// ============================================================================

const UNHEALTHY_AFTER: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("A scan is already running")]
    Busy,

    #[error("Scanner is not running")]
    Unavailable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run one scan now, outside the interval.
#[derive(Message)]
#[rtype(result = "Result<ScanReport, ScanError>")]
pub struct TriggerScan;

pub struct ScannerActor {
    scanner: Arc<DeliveryRiskScanner>,
    interval: Duration,
    health_monitor: Option<Addr<HealthMonitorActor>>,
    scanning: bool,
    consecutive_failures: u32,
    skipped_ticks: u64,
}

impl ScannerActor {
    pub fn new(
        scanner: Arc<DeliveryRiskScanner>,
        interval: Duration,
        health_monitor: Option<Addr<HealthMonitorActor>>,
    ) -> Self {
        Self {
            scanner,
            interval,
            health_monitor,
            scanning: false,
            consecutive_failures: 0,
            skipped_ticks: 0,
        }
    }

    fn scheduled_tick(&mut self, ctx: &mut Context<Self>) {
        if self.scanning {
            self.skipped_ticks += 1;
            tracing::warn!(
                skipped_ticks = self.skipped_ticks,
                "Previous delivery scan still running, skipping tick"
            );
            return;
        }

        self.scanning = true;
        let scanner = self.scanner.clone();

        ctx.spawn(
            async move { scanner.tick().await }
                .into_actor(self)
                .map(|report, act, _ctx| act.finish_scan(report.is_some())),
        );
    }

    fn finish_scan(&mut self, succeeded: bool) {
        self.scanning = false;

        if succeeded {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
        }

        if let Some(ref monitor) = self.health_monitor {
            monitor.do_send(super::UpdateHealth::from(self.check_health()));
        }
    }
}

impl HealthCheckable for ScannerActor {
    fn check_health(&self) -> ComponentHealth {
        let status = match self.consecutive_failures {
            0 => HealthStatus::Healthy,
            n if n < UNHEALTHY_AFTER => {
                HealthStatus::Degraded(format!("{} consecutive failed scans", n))
            }
            n => HealthStatus::Unhealthy(format!("{} consecutive failed scans", n)),
        };

        ComponentHealth::new(self.component_name(), status)
            .with_details(format!("every {}s", self.interval.as_secs()))
    }

    fn component_name(&self) -> &str {
        "delivery_scanner"
    }
}

impl Actor for ScannerActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "⏰ ScannerActor started"
        );

        ctx.run_interval(self.interval, |act, ctx| act.scheduled_tick(ctx));
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("ScannerActor stopped");
    }
}

impl Handler<TriggerScan> for ScannerActor {
    type Result = ResponseActFuture<Self, Result<ScanReport, ScanError>>;

    fn handle(&mut self, _msg: TriggerScan, _ctx: &mut Self::Context) -> Self::Result {
        if self.scanning {
            return Box::pin(actix::fut::ready(Err(ScanError::Busy)));
        }

        self.scanning = true;
        let scanner = self.scanner.clone();

        Box::pin(
            async move { scanner.scan(Utc::now()).await }
                .into_actor(self)
                .map(|result, act, _ctx| {
                    act.finish_scan(result.is_ok());
                    result.map_err(ScanError::from)
                }),
        )
    }
}
