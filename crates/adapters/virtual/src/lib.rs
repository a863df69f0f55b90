//! # mowerhub-adapter-virtual
//!
//! Simulated collaborators for running the controller without hardware.
//!
//! ## Provided adapters
//!
//! | Adapter | Port | Behaviour |
//! |---------|------|-----------|
//! | [`VirtualMower`] | `MowerActuator` | Tracks its activity, can be taken offline to make commands fail |
//! | [`MemoryParkReasonStore`] | `ParkReasonStore` | Keeps the persisted reason text in memory |
//! | [`LogChannel`] | `NotificationChannel` | Writes messages to the log and keeps them for inspection |
//! | [`StaticOccupancy`] | `OccupancySource` | Reports a settable "somebody is home" flag |
//!
//! ## Dependency rule
//!
//! Depends on `mowerhub-app` (port traits) and `mowerhub-domain` only.

mod channel;
mod error;
mod mower;
mod occupancy;
mod store;

pub use channel::LogChannel;
pub use error::VirtualError;
pub use mower::{MowerActivity, VirtualMower};
pub use occupancy::StaticOccupancy;
pub use store::MemoryParkReasonStore;
