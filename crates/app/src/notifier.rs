//! Notification dispatcher — turns transitions into user-facing messages.
//!
//! Every notification is appended to the history *before* delivery is
//! attempted. Delivery is best-effort: failures and timeouts are logged and
//! never reported back to the controller, so they cannot block or reverse
//! the transition that produced the notification.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use mowerhub_domain::error::MowerError;
use mowerhub_domain::id::NotificationId;
use mowerhub_domain::notification::{MessageTemplates, NotificationEvent, NotificationKind};
use mowerhub_domain::session::Session;
use mowerhub_domain::time::Timestamp;

use crate::ports::{NotificationChannel, NotificationHistory, OccupancySource, OutgoingMessage};

/// Result of a dispatch, for callers interested in delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    /// Recorded in history but the channel failed or timed out.
    Undelivered,
    /// Same event already dispatched; nothing done.
    Duplicate,
}

/// Formats, records and delivers notifications.
pub struct NotificationDispatcher<C, H> {
    channel: C,
    history: H,
    templates: MessageTemplates,
    delivery_timeout: Duration,
    last_dispatched: Mutex<Option<NotificationId>>,
}

impl<C, H> NotificationDispatcher<C, H>
where
    C: NotificationChannel,
    H: NotificationHistory,
{
    pub fn new(
        channel: C,
        history: H,
        templates: MessageTemplates,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            channel,
            history,
            templates,
            delivery_timeout,
            last_dispatched: Mutex::new(None),
        }
    }

    /// Build the event for a transition of the given kind.
    #[must_use]
    pub fn compose(
        &self,
        kind: NotificationKind,
        at: Timestamp,
        session: Option<Session>,
    ) -> NotificationEvent {
        let message = self.templates.render(kind, session.as_ref());
        NotificationEvent::new(kind, message, at).with_session(session)
    }

    /// Record and deliver an event.
    pub async fn dispatch(&self, event: NotificationEvent) -> DispatchOutcome {
        {
            let mut last = self
                .last_dispatched
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *last == Some(event.id) {
                tracing::debug!(id = %event.id, kind = %event.kind, "duplicate notification dropped");
                return DispatchOutcome::Duplicate;
            }
            *last = Some(event.id);
        }

        if let Err(err) = self.history.append(event.clone()).await {
            tracing::warn!(kind = %event.kind, error = %err, "failed to record notification");
        }

        let message = OutgoingMessage {
            title: self.templates.title.clone(),
            text: event.message,
            silent: event.silent,
        };
        match tokio::time::timeout(self.delivery_timeout, self.channel.send(&message)).await {
            Ok(Ok(())) => {
                tracing::info!(kind = %event.kind, text = %message.text, "notification sent");
                DispatchOutcome::Delivered
            }
            Ok(Err(err)) => {
                tracing::warn!(kind = %event.kind, error = %err, "notification not delivered");
                DispatchOutcome::Undelivered
            }
            Err(_) => {
                tracing::warn!(
                    kind = %event.kind,
                    timeout_ms = self.delivery_timeout.as_millis(),
                    "notification delivery timed out"
                );
                DispatchOutcome::Undelivered
            }
        }
    }

    /// Compose and dispatch in one go.
    pub async fn notify(
        &self,
        kind: NotificationKind,
        at: Timestamp,
        session: Option<Session>,
    ) -> DispatchOutcome {
        let event = self.compose(kind, at, session);
        self.dispatch(event).await
    }
}

/// Channel decorator delivering every message silently while somebody is home.
pub struct OccupancyGate<C, O> {
    inner: C,
    occupancy: O,
}

impl<C, O> OccupancyGate<C, O> {
    pub fn new(inner: C, occupancy: O) -> Self {
        Self { inner, occupancy }
    }
}

impl<C, O> NotificationChannel for OccupancyGate<C, O>
where
    C: NotificationChannel,
    O: OccupancySource,
{
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MowerError> {
        if message.silent || !self.occupancy.is_home_occupied().await {
            return self.inner.send(message).await;
        }
        let quiet = OutgoingMessage {
            silent: true,
            ..message.clone()
        };
        self.inner.send(&quiet).await
    }
}
