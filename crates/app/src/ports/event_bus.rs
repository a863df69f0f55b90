//! Event bus port — publish entity changes to interested subscribers.

use std::future::Future;

use mowerhub_domain::error::MowerError;
use mowerhub_domain::event::EntityEvent;

/// Publishes entity events to all subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: EntityEvent) -> impl Future<Output = Result<(), MowerError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: EntityEvent) -> impl Future<Output = Result<(), MowerError>> + Send {
        (**self).publish(event)
    }
}
