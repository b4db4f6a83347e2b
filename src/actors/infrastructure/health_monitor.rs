use actix::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use crate::actors::core::{ComponentHealth, HealthStatus};
use crate::messaging::RedpandaClient;
use crate::metrics::Metrics;
use crate::utils::CircuitState;

// ============================================================================
// Health Monitor Actor - Aggregates component health
// ============================================================================
//
// Responsibilities:
// - Keep the last reported health of every component
// - Poll the reminder sink's circuit breaker when there is one
// - Derive the overall status and export it as a gauge
//
// ============================================================================

const SINK_POLL_INTERVAL: Duration = Duration::from_secs(10);

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "()")]
pub struct UpdateHealth {
    pub component: String,
    pub status: HealthStatus,
    pub details: Option<String>,
}

impl From<ComponentHealth> for UpdateHealth {
    fn from(health: ComponentHealth) -> Self {
        Self {
            component: health.name,
            status: health.status,
            details: health.details,
        }
    }
}

#[derive(Message)]
#[rtype(result = "SystemHealth")]
pub struct GetSystemHealth;

#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub check_time: DateTime<Utc>,
}

// ============================================================================
// Health Monitor Actor
// ============================================================================

pub struct HealthMonitorActor {
    components: HashMap<String, ComponentHealth>,
    redpanda: Option<Arc<RedpandaClient>>,
    metrics: Arc<Metrics>,
}

impl HealthMonitorActor {
    pub fn new(redpanda: Option<Arc<RedpandaClient>>, metrics: Arc<Metrics>) -> Self {
        Self {
            components: HashMap::new(),
            redpanda,
            metrics,
        }
    }

    fn compute_overall_status(&self) -> HealthStatus {
        let mut has_degraded = false;
        let mut unhealthy_components = Vec::new();

        for (name, health) in &self.components {
            match &health.status {
                HealthStatus::Unhealthy(msg) => {
                    unhealthy_components.push(format!("{}: {}", name, msg));
                }
                HealthStatus::Degraded(_) => {
                    has_degraded = true;
                }
                HealthStatus::Healthy => {}
            }
        }

        if !unhealthy_components.is_empty() {
            unhealthy_components.sort();
            HealthStatus::Unhealthy(unhealthy_components.join(", "))
        } else if has_degraded {
            HealthStatus::Degraded("Some components degraded".to_string())
        } else {
            HealthStatus::Healthy
        }
    }
}

fn sink_status(state: CircuitState) -> HealthStatus {
    match state {
        CircuitState::Closed => HealthStatus::Healthy,
        CircuitState::HalfOpen => HealthStatus::Degraded("Circuit breaker half-open".to_string()),
        CircuitState::Open => HealthStatus::Unhealthy("Circuit breaker open".to_string()),
    }
}

impl Actor for HealthMonitorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("HealthMonitorActor started");

        if self.redpanda.is_none() {
            return;
        }

        let addr = ctx.address();
        ctx.run_interval(SINK_POLL_INTERVAL, move |act, _ctx| {
            let redpanda = act.redpanda.clone();
            let addr = addr.clone();

            actix::spawn(async move {
                if let Some(rp) = redpanda {
                    let status = sink_status(rp.get_circuit_breaker_state().await);
                    addr.do_send(UpdateHealth {
                        component: "reminder_sink".to_string(),
                        status,
                        details: None,
                    });
                }
            });
        });
    }
}

impl Handler<UpdateHealth> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, msg: UpdateHealth, _: &mut Self::Context) {
        let health = ComponentHealth {
            name: msg.component.clone(),
            status: msg.status.clone(),
            last_check: Utc::now(),
            details: msg.details,
        };

        tracing::debug!(
            component = %msg.component,
            status = ?msg.status,
            "Updated component health"
        );

        self.components.insert(msg.component, health);
        self.metrics
            .set_health_status(self.compute_overall_status().as_gauge());
    }
}

impl Handler<GetSystemHealth> for HealthMonitorActor {
    type Result = MessageResult<GetSystemHealth>;

    fn handle(&mut self, _msg: GetSystemHealth, _: &mut Self::Context) -> Self::Result {
        MessageResult(SystemHealth {
            overall_status: self.compute_overall_status(),
            components: self.components.clone(),
            check_time: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> (Addr<HealthMonitorActor>, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new().unwrap());
        (HealthMonitorActor::new(None, metrics.clone()).start(), metrics)
    }

    #[actix::test]
    async fn test_empty_monitor_is_healthy() {
        let (addr, _) = monitor();
        let health = addr.send(GetSystemHealth).await.unwrap();

        assert!(health.overall_status.is_healthy());
        assert!(health.components.is_empty());
    }

    #[actix::test]
    async fn test_worst_component_wins() {
        let (addr, metrics) = monitor();

        addr.do_send(UpdateHealth {
            component: "scanner".to_string(),
            status: HealthStatus::Degraded("1 failed scan".to_string()),
            details: None,
        });
        let health = addr.send(GetSystemHealth).await.unwrap();
        assert_eq!(health.overall_status.label(), "degraded");
        assert_eq!(metrics.actor_health_status.get(), 1);

        addr.do_send(UpdateHealth {
            component: "reminder_sink".to_string(),
            status: HealthStatus::Unhealthy("Circuit breaker open".to_string()),
            details: None,
        });
        let health = addr.send(GetSystemHealth).await.unwrap();
        assert!(health.overall_status.is_unhealthy());
        assert_eq!(
            health.overall_status.reason(),
            Some("reminder_sink: Circuit breaker open")
        );
        assert_eq!(metrics.actor_health_status.get(), 0);
    }

    #[test]
    fn test_sink_status_mapping() {
        assert!(sink_status(CircuitState::Closed).is_healthy());
        assert_eq!(sink_status(CircuitState::HalfOpen).label(), "degraded");
        assert!(sink_status(CircuitState::Open).is_unhealthy());
    }
}
