use actix::prelude::*;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use crate::actors::core::HealthStatus;
use crate::messaging::RedpandaClient;
use crate::metrics::Metrics;
use crate::scheduler::{DeliveryRiskScanner, ScanReport};
use super::{
    GetSystemHealth, HealthMonitorActor, ScanError, ScannerActor, SystemHealth, TriggerScan,
    UpdateHealth,
};

// ============================================================================
// Coordinator Actor - Orchestrates all system actors
// ============================================================================
//
// Responsibilities:
// - Manages lifecycle of child actors (ScannerActor, HealthMonitorActor)
// - Single entry point for the HTTP layer (health, manual scans)
// - Coordinates graceful shutdown
//
// Actor Hierarchy:
//   CoordinatorActor (Supervisor)
//   ├── HealthMonitorActor
//   └── ScannerActor
//
// ============================================================================

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(30);

pub struct CoordinatorActor {
    scanner: Arc<DeliveryRiskScanner>,
    scan_interval: Duration,
    redpanda: Option<Arc<RedpandaClient>>,
    metrics: Arc<Metrics>,
    scanner_actor: Option<Addr<ScannerActor>>,
    health_monitor: Option<Addr<HealthMonitorActor>>,
}

impl CoordinatorActor {
    pub fn new(
        scanner: Arc<DeliveryRiskScanner>,
        scan_interval: Duration,
        redpanda: Option<Arc<RedpandaClient>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            scanner,
            scan_interval,
            redpanda,
            metrics,
            scanner_actor: None,
            health_monitor: None,
        }
    }

    fn start_child_actors(&mut self, _ctx: &mut Context<Self>) {
        tracing::info!("Starting supervised child actors");

        let health_monitor =
            HealthMonitorActor::new(self.redpanda.clone(), self.metrics.clone()).start();
        self.health_monitor = Some(health_monitor.clone());

        let scanner_actor = ScannerActor::new(
            self.scanner.clone(),
            self.scan_interval,
            Some(health_monitor.clone()),
        )
        .start();
        self.scanner_actor = Some(scanner_actor);

        health_monitor.do_send(UpdateHealth {
            component: "delivery_scanner".to_string(),
            status: HealthStatus::Healthy,
            details: Some("Scanner started".to_string()),
        });

        tracing::info!("✅ All supervised actors started successfully");
    }
}

impl Actor for CoordinatorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("🎯 CoordinatorActor started - order tracking");
        self.start_child_actors(ctx);

        ctx.run_interval(HEALTH_LOG_INTERVAL, |act, _ctx| {
            if let Some(ref health_monitor) = act.health_monitor {
                let health_monitor = health_monitor.clone();
                actix::spawn(async move {
                    match health_monitor.send(GetSystemHealth).await {
                        Ok(health) => match health.overall_status {
                            HealthStatus::Healthy => {
                                tracing::debug!("System health check: Healthy");
                            }
                            HealthStatus::Degraded(ref msg) => {
                                tracing::warn!("System health check: Degraded - {}", msg);
                            }
                            HealthStatus::Unhealthy(ref msg) => {
                                tracing::error!("System health check: Unhealthy - {}", msg);
                            }
                        },
                        Err(e) => {
                            tracing::error!("Failed to get system health: {}", e);
                        }
                    }
                });
            }
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        tracing::info!("🛑 CoordinatorActor stopping - initiating graceful shutdown");
        Running::Stop
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("🛑 CoordinatorActor stopped");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "Result<(), String>")]
pub struct Shutdown;

impl Handler<Shutdown> for CoordinatorActor {
    type Result = Result<(), String>;

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) -> Self::Result {
        tracing::info!("Received shutdown signal");

        if let Some(ref scanner_actor) = self.scanner_actor {
            scanner_actor.do_send(StopActor);
        }

        if let Some(ref health_monitor) = self.health_monitor {
            health_monitor.do_send(StopActor);
        }

        ctx.stop();

        Ok(())
    }
}

impl Handler<GetSystemHealth> for CoordinatorActor {
    type Result = ResponseFuture<SystemHealth>;

    fn handle(&mut self, msg: GetSystemHealth, _: &mut Self::Context) -> Self::Result {
        let health_monitor = self.health_monitor.clone();

        Box::pin(async move {
            let unavailable = || SystemHealth {
                overall_status: HealthStatus::Unhealthy("Health monitor unavailable".to_string()),
                components: HashMap::new(),
                check_time: Utc::now(),
            };

            match health_monitor {
                Some(addr) => addr.send(msg).await.unwrap_or_else(|_| unavailable()),
                None => unavailable(),
            }
        })
    }
}

impl Handler<TriggerScan> for CoordinatorActor {
    type Result = ResponseFuture<Result<ScanReport, ScanError>>;

    fn handle(&mut self, msg: TriggerScan, _: &mut Self::Context) -> Self::Result {
        let scanner_actor = self.scanner_actor.clone();

        Box::pin(async move {
            match scanner_actor {
                Some(addr) => addr.send(msg).await.map_err(|_| ScanError::Unavailable)?,
                None => Err(ScanError::Unavailable),
            }
        })
    }
}

/// Message to gracefully stop an actor
#[derive(Message)]
#[rtype(result = "()")]
struct StopActor;

impl Handler<StopActor> for ScannerActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("ScannerActor received stop signal");
        ctx.stop();
    }
}

impl Handler<StopActor> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("HealthMonitorActor received stop signal");
        ctx.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fixtures::stored_order;
    use crate::scheduler::testing::RecordingDispatcher;
    use crate::store::{InMemoryOrderStore, OrderStore};

    async fn coordinator() -> (Addr<CoordinatorActor>, uuid::Uuid) {
        let store = Arc::new(InMemoryOrderStore::new());
        let due = Utc::now().date_naive();
        let order = stored_order(8, due, 0);
        store.save(&order, 0).await.unwrap();

        let (dispatcher, _rx) = RecordingDispatcher::new();
        let metrics = Arc::new(Metrics::new().unwrap());
        let scanner = DeliveryRiskScanner::new(store, Arc::new(dispatcher), metrics.clone());

        let addr = CoordinatorActor::new(
            Arc::new(scanner),
            Duration::from_secs(3600),
            None,
            metrics,
        )
        .start();

        (addr, order.id)
    }

    #[actix::test]
    async fn test_manual_scan_goes_through_coordinator() {
        let (addr, order_id) = coordinator().await;

        let report = addr.send(TriggerScan).await.unwrap().unwrap();
        assert_eq!(report.at_risk, vec![order_id]);

        let health = addr.send(GetSystemHealth).await.unwrap();
        assert!(health.overall_status.is_healthy());
        assert!(health.components.contains_key("delivery_scanner"));
    }

    #[actix::test]
    async fn test_shutdown_stops_coordinator() {
        let (addr, _) = coordinator().await;

        assert!(addr.send(Shutdown).await.unwrap().is_ok());

        // Let the stop propagate
        actix::clock::sleep(Duration::from_millis(20)).await;
        assert!(!addr.connected());
    }
}
