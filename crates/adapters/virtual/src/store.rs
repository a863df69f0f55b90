use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use mowerhub_app::ports::ParkReasonStore;
use mowerhub_domain::error::MowerError;
use mowerhub_domain::mode::{ParkReason, persisted_text};

use crate::error::VirtualError;

/// Park reason kept in memory, lost on restart.
#[derive(Default)]
pub struct MemoryParkReasonStore {
    raw: Mutex<Option<String>>,
    read_only: AtomicBool,
}

impl MemoryParkReasonStore {
    /// A store already holding `raw`, as if written by a previous run.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
            read_only: AtomicBool::new(false),
        }
    }

    /// Make writes fail.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ParkReasonStore for MemoryParkReasonStore {
    async fn read(&self) -> Result<Option<String>, MowerError> {
        Ok(self.raw())
    }

    async fn write(&self, reason: Option<ParkReason>) -> Result<(), MowerError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(VirtualError::ReadOnly.into());
        }
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(persisted_text(reason).to_string());
        Ok(())
    }
}
