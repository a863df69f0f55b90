//! # mowerhubd — mowerhub daemon
//!
//! Composition root that wires all adapters together and runs the controller.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the adapters and inject them into the controller via port traits
//! - Feed `entity_id=state` lines from stdin into the entity bus
//! - Handle graceful shutdown (Ctrl-C)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod feed;

use std::sync::Arc;

use mowerhub_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteNotificationHistory, SqliteParkReasonStore,
};
use mowerhub_adapter_virtual::{LogChannel, StaticOccupancy, VirtualMower};
use mowerhub_app::controller::MowerController;
use mowerhub_app::event_bus::InProcessEventBus;
use mowerhub_app::notifier::{NotificationDispatcher, OccupancyGate};
use mowerhub_app::ports::SystemClock;
use mowerhub_app::runner::ControllerRunner;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Adapters
    let store = SqliteParkReasonStore::new(pool.clone());
    let history = SqliteNotificationHistory::new(pool);
    let channel = OccupancyGate::new(
        LogChannel::default(),
        StaticOccupancy::new(config.notifications.home_occupied),
    );
    let mower = VirtualMower::new(config.mower_latency());

    // Controller
    let notifier = NotificationDispatcher::new(
        channel,
        history,
        config.messages.clone(),
        config.delivery_timeout(),
    );
    let controller = MowerController::restore(
        mower,
        store,
        notifier,
        SystemClock,
        config.controller_config(),
    )
    .await;
    tracing::info!(mode = %controller.mode().await, "mowerhubd started");

    // Entity bus
    let bus = Arc::new(InProcessEventBus::new(256));
    let events = bus.subscribe();
    tokio::spawn(feed::forward(
        tokio::io::BufReader::new(tokio::io::stdin()),
        bus.clone(),
    ));

    let runner = ControllerRunner::new(
        Arc::new(controller),
        config.dispatch_table(),
        config.tick_interval(),
    );
    runner.run(events, shutdown_signal()).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
