use std::sync::atomic::{AtomicBool, Ordering};

use mowerhub_app::ports::OccupancySource;

/// Occupancy source answering a fixed, settable value.
#[derive(Debug, Default)]
pub struct StaticOccupancy {
    occupied: AtomicBool,
}

impl StaticOccupancy {
    #[must_use]
    pub fn new(occupied: bool) -> Self {
        Self {
            occupied: AtomicBool::new(occupied),
        }
    }

    pub fn set(&self, occupied: bool) {
        self.occupied.store(occupied, Ordering::SeqCst);
    }
}

impl OccupancySource for StaticOccupancy {
    async fn is_home_occupied(&self) -> bool {
        self.occupied.load(Ordering::SeqCst)
    }
}
