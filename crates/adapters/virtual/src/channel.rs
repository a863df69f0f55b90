use std::sync::{Mutex, PoisonError};

use mowerhub_app::ports::{NotificationChannel, OutgoingMessage};
use mowerhub_domain::error::MowerError;

/// Message channel printing every message to the log.
#[derive(Default)]
pub struct LogChannel {
    delivered: Mutex<Vec<OutgoingMessage>>,
}

impl LogChannel {
    /// Messages delivered so far, oldest first.
    #[must_use]
    pub fn delivered(&self) -> Vec<OutgoingMessage> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationChannel for LogChannel {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MowerError> {
        tracing::info!(
            title = %message.title,
            silent = message.silent,
            "{}",
            message.text
        );
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}
