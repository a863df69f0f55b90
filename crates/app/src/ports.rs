//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the controller and the outside world.
//! They are defined here (in `app`) so that both the controller and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod actuator;
pub mod clock;
pub mod event_bus;
pub mod notification;
pub mod occupancy;
pub mod park_reason;

pub use actuator::MowerActuator;
pub use clock::{Clock, SystemClock};
pub use event_bus::EventPublisher;
pub use notification::{NotificationChannel, NotificationHistory, OutgoingMessage};
pub use occupancy::OccupancySource;
pub use park_reason::ParkReasonStore;
