//! Occupancy port — whether somebody is at home.

use std::future::Future;

/// External presence capability, used to gate how notifications are delivered.
pub trait OccupancySource: Send + Sync {
    fn is_home_occupied(&self) -> impl Future<Output = bool> + Send;
}

impl<T: OccupancySource> OccupancySource for std::sync::Arc<T> {
    fn is_home_occupied(&self) -> impl Future<Output = bool> + Send {
        (**self).is_home_occupied()
    }
}
