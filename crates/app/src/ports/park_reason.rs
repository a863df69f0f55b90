//! Park reason port — the external entity remembering why the mower is parked.

use std::future::Future;

use mowerhub_domain::error::MowerError;
use mowerhub_domain::mode::ParkReason;

/// Store for the single persisted park reason.
pub trait ParkReasonStore: Send + Sync {
    /// Read the raw persisted text, `None` when nothing was ever written.
    ///
    /// The text is returned unparsed so that the controller can decide how
    /// to recover from unrecognized values.
    fn read(&self) -> impl Future<Output = Result<Option<String>, MowerError>> + Send;

    /// Write the reason; `None` clears it.
    fn write(
        &self,
        reason: Option<ParkReason>,
    ) -> impl Future<Output = Result<(), MowerError>> + Send;
}

impl<T: ParkReasonStore> ParkReasonStore for std::sync::Arc<T> {
    fn read(&self) -> impl Future<Output = Result<Option<String>, MowerError>> + Send {
        (**self).read()
    }

    fn write(
        &self,
        reason: Option<ParkReason>,
    ) -> impl Future<Output = Result<(), MowerError>> + Send {
        (**self).write(reason)
    }
}
