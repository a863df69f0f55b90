//! Actuator port — commands sent to the mower.

use std::future::Future;

use mowerhub_domain::command::ParkCommand;
use mowerhub_domain::error::MowerError;

/// Fire-and-acknowledge commands understood by the mower.
///
/// Implementations return once the mower acknowledged the command, or with
/// [`MowerError::ActuatorCommandFailed`] when it refused. The controller
/// bounds every call with its own timeout.
pub trait MowerActuator: Send + Sync {
    /// Send the mower back to its dock.
    fn request_park(
        &self,
        command: ParkCommand,
    ) -> impl Future<Output = Result<(), MowerError>> + Send;

    /// Hand the mower back to its schedule.
    fn request_resume(&self) -> impl Future<Output = Result<(), MowerError>> + Send;
}

impl<T: MowerActuator> MowerActuator for std::sync::Arc<T> {
    fn request_park(
        &self,
        command: ParkCommand,
    ) -> impl Future<Output = Result<(), MowerError>> + Send {
        (**self).request_park(command)
    }

    fn request_resume(&self) -> impl Future<Output = Result<(), MowerError>> + Send {
        (**self).request_resume()
    }
}
