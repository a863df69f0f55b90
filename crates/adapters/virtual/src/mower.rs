//! Virtual mower — obeys park and resume commands after a simulated latency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use mowerhub_app::ports::MowerActuator;
use mowerhub_domain::command::ParkCommand;
use mowerhub_domain::error::MowerError;

use crate::error::VirtualError;

/// What the virtual mower is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MowerActivity {
    Mowing,
    Parked(ParkCommand),
}

/// A simulated robotic mower.
pub struct VirtualMower {
    activity: Mutex<MowerActivity>,
    latency: Duration,
    offline: AtomicBool,
    commands: Mutex<Vec<MowerActivity>>,
}

impl Default for VirtualMower {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl VirtualMower {
    /// A mowing mower answering every command after `latency`.
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self {
            activity: Mutex::new(MowerActivity::Mowing),
            latency,
            offline: AtomicBool::new(false),
            commands: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn activity(&self) -> MowerActivity {
        *self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accepted commands, oldest first.
    #[must_use]
    pub fn commands(&self) -> Vec<MowerActivity> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make every following command fail until brought back online.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    async fn execute(
        &self,
        command: &'static str,
        target: MowerActivity,
    ) -> Result<(), VirtualError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(VirtualError::Offline { command });
        }
        *self.activity.lock().unwrap_or_else(PoisonError::into_inner) = target;
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target);
        tracing::info!(command, activity = ?target, "virtual mower obeyed");
        Ok(())
    }
}

impl MowerActuator for VirtualMower {
    async fn request_park(&self, command: ParkCommand) -> Result<(), MowerError> {
        tracing::debug!(
            reason = ?command.reason,
            park_minutes = ?command.duration_minutes(),
            "park requested"
        );
        self.execute("park", MowerActivity::Parked(command))
            .await
            .map_err(MowerError::from)
    }

    async fn request_resume(&self) -> Result<(), MowerError> {
        self.execute("resume", MowerActivity::Mowing)
            .await
            .map_err(MowerError::from)
    }
}
