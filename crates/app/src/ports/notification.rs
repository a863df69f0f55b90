//! Notification ports — message delivery and notification history.

use std::future::Future;

use mowerhub_domain::error::MowerError;
use mowerhub_domain::notification::NotificationEvent;

/// A plain-text message handed to the message channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub title: String,
    pub text: String,
    /// Deliver without sound or popup.
    pub silent: bool,
}

/// External message-send capability. Delivery results are advisory only.
pub trait NotificationChannel: Send + Sync {
    fn send(
        &self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<(), MowerError>> + Send;
}

impl<T: NotificationChannel> NotificationChannel for std::sync::Arc<T> {
    fn send(
        &self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<(), MowerError>> + Send {
        (**self).send(message)
    }
}

/// Append-only log of every notification produced.
pub trait NotificationHistory: Send + Sync {
    fn append(
        &self,
        event: NotificationEvent,
    ) -> impl Future<Output = Result<(), MowerError>> + Send;

    /// Most recent notifications, newest first.
    fn recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<NotificationEvent>, MowerError>> + Send;
}

impl<T: NotificationHistory> NotificationHistory for std::sync::Arc<T> {
    fn append(
        &self,
        event: NotificationEvent,
    ) -> impl Future<Output = Result<(), MowerError>> + Send {
        (**self).append(event)
    }

    fn recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<NotificationEvent>, MowerError>> + Send {
        (**self).recent(limit)
    }
}
