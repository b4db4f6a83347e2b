use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    producer::{FutureProducer, FutureRecord},
};

use crate::domain::order::OrderAggregate;
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
use super::{DispatchError, ReminderDispatcher, ReminderMessage};

pub struct RedpandaClient {
    producer: FutureProducer,
    circuit_breaker: CircuitBreaker,
}

impl RedpandaClient {
    pub fn new(brokers: &str, metrics: Arc<Metrics>) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .context("Failed to create Redpanda producer")?;

        let cb_config = CircuitBreakerConfig {
            failure_threshold: 5,
            timeout: Duration::from_secs(30),
            success_threshold: 3,
        };

        let circuit_breaker = CircuitBreaker::new("redpanda", cb_config).with_observer(Arc::new(
            move |from: CircuitState, to: CircuitState| metrics.record_circuit_breaker_transition(from, to),
        ));

        Ok(Self {
            producer,
            circuit_breaker,
        })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), DispatchError> {
        let result = self
            .circuit_breaker
            .call(async {
                let record = FutureRecord::to(topic).key(key).payload(payload);

                self.producer
                    .send(record, rdkafka::util::Timeout::After(Duration::from_secs(5)))
                    .await
                    .map_err(|(e, _)| e.to_string())?;

                Ok::<(), String>(())
            })
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(
                    topic = %topic,
                    key = %key,
                    "Published to Redpanda"
                );
                Ok(())
            }
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::error!(
                    topic = %topic,
                    "Circuit breaker open - Redpanda unavailable"
                );
                Err(DispatchError::CircuitOpen)
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                tracing::error!(
                    error = %e,
                    topic = %topic,
                    "Failed to publish to Redpanda"
                );
                Err(DispatchError::Publish(e))
            }
        }
    }

    pub async fn get_circuit_breaker_state(&self) -> CircuitState {
        self.circuit_breaker.get_state().await
    }
}

/// Publishes one JSON `ReminderMessage` per at-risk order, keyed by order id
/// so that reminders for the same order stay on one partition.
pub struct RedpandaReminderDispatcher {
    client: Arc<RedpandaClient>,
    topic: String,
    recipient: Option<String>,
}

impl RedpandaReminderDispatcher {
    pub fn new(client: Arc<RedpandaClient>, topic: impl Into<String>, recipient: Option<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
            recipient,
        }
    }
}

#[async_trait]
impl ReminderDispatcher for RedpandaReminderDispatcher {
    async fn send_reminder(&self, order: &OrderAggregate) -> Result<(), DispatchError> {
        let message = ReminderMessage::for_order(order, self.recipient.clone());
        let payload = serde_json::to_string(&message)?;

        self.client
            .publish(&self.topic, &order.id.to_string(), &payload)
            .await?;

        tracing::info!(
            order_id = %order.id,
            topic = %self.topic,
            "📧 Reminder published"
        );

        Ok(())
    }
}
