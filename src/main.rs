use actix::prelude::*;
use actix_web::web;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod actors;
mod api;
mod config;
mod domain;
mod messaging;
mod metrics;
mod reporting;
mod scheduler;
mod store;
mod utils;

use actors::{CoordinatorActor, Shutdown};
use config::{AppConfig, ReminderSink, StoreBackend};
use domain::order::OrderCommandHandler;
use messaging::{LoggingReminderDispatcher, RedpandaClient, RedpandaReminderDispatcher, ReminderDispatcher};
use scheduler::DeliveryRiskScanner;
use store::{InMemoryOrderStore, OrderStore, ScyllaOrderStore};

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_tracking=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order tracking service");

    let config = AppConfig::from_env()?;
    tracing::info!(
        store = ?config.store,
        reminder_sink = ?config.reminder_sink,
        scan_interval_secs = config.scan_interval.as_secs(),
        lookahead_days = config.scan_lookahead_days,
        "Configuration loaded"
    );

    // === 1. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let system = actix_web::rt::System::new();
        if let Err(e) = system.block_on(metrics::start_metrics_server(metrics_registry, metrics_port)) {
            tracing::error!("Metrics server error: {}", e);
        }
    });

    // === 2. Order store ===
    let store: Arc<dyn OrderStore> = match config.store {
        StoreBackend::Scylla => {
            Arc::new(ScyllaOrderStore::connect(&config.scylla_nodes, &config.scylla_keyspace).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory order store, data is lost on restart");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    // === 3. Reminder sink ===
    let (dispatcher, redpanda): (Arc<dyn ReminderDispatcher>, Option<Arc<RedpandaClient>>) =
        match config.reminder_sink {
            ReminderSink::Redpanda => {
                let client = Arc::new(RedpandaClient::new(&config.redpanda_brokers, metrics.clone())?);
                let dispatcher = RedpandaReminderDispatcher::new(
                    client.clone(),
                    config.reminder_topic.clone(),
                    config.reminder_recipient.clone(),
                );
                (Arc::new(dispatcher), Some(client))
            }
            ReminderSink::Log => (
                Arc::new(LoggingReminderDispatcher::new(config.reminder_recipient.clone())),
                None,
            ),
        };

    // === 4. Scanner and actors ===
    let scanner = Arc::new(
        DeliveryRiskScanner::new(store.clone(), dispatcher, metrics.clone())
            .with_lookahead(chrono::Duration::days(config.scan_lookahead_days)),
    );

    tracing::info!("Starting coordinator actor with supervision");
    let coordinator =
        CoordinatorActor::new(scanner, config.scan_interval, redpanda, metrics.clone()).start();

    // === 5. Admin API ===
    let state = web::Data::new(api::AppState {
        orders: Arc::new(OrderCommandHandler::new(store, metrics)),
        coordinator: Some(coordinator.clone()),
    });

    let served = api::start_api_server(state, config.http_port).await;

    tracing::info!("🛑 API server stopped, shutting down actors");
    if let Err(e) = coordinator.send(Shutdown).await {
        tracing::warn!(error = %e, "Coordinator already gone");
    }

    served?;
    tracing::info!("👋 Shutdown complete");
    Ok(())
}
