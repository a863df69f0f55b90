//! # mowerhub-domain
//!
//! Pure domain model for the mowerhub robotic mower controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **mower mode** and its persisted **park reason**
//! - Define the **rain evaluator** turning rain accumulation readings into a
//!   dryness verdict with hysteresis
//! - Define the **session boundary** rules keeping mowing sessions inside
//!   one wall-clock hour
//! - Define the **sun phase** gating restarts after rain
//! - Define **notifications** (transition records and their message texts)
//! - Define **commands** (manual overrides, park requests)
//! - Define **entity events** (state changes observed on the entity bus)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod event;
pub mod mode;
pub mod notification;
pub mod rain;
pub mod session;
pub mod sun;
