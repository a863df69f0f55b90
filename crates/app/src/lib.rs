//! # mowerhub-app
//!
//! Application layer — the mower controller and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Clock` — wall-clock time
//!   - `MowerActuator` — park / resume commands
//!   - `ParkReasonStore` — the persisted park reason
//!   - `NotificationChannel` — message delivery
//!   - `NotificationHistory` — append-only notification log
//!   - `OccupancySource` — whether somebody is home
//!   - `EventPublisher` — publish entity changes on the bus
//! - Provide **in-process infrastructure** (entity bus) that doesn't need IO
//! - Translate bus events into controller inputs through an explicit dispatch table
//! - Run the **mower controller** state machine and its event loop
//! - Dispatch notifications for every transition
//!
//! ## Dependency rule
//! Depends on `mowerhub-domain` only (plus `tokio::sync`/`tokio::time`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod controller;
pub mod dispatch;
pub mod event_bus;
pub mod notifier;
pub mod ports;
pub mod runner;

#[cfg(test)]
mod testing;
