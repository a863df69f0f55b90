//! Line-based entity feed: every `entity_id=state` line read from the input
//! is published on the entity bus.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use mowerhub_app::ports::EventPublisher;
use mowerhub_domain::event::EntityEvent;
use mowerhub_domain::time::now;

/// Publish every well-formed line until the input ends. Returns the number
/// of published events.
pub async fn forward<R, P>(input: R, publisher: P) -> usize
where
    R: AsyncBufRead + Unpin,
    P: EventPublisher,
{
    let mut lines = input.lines();
    let mut published = 0;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "entity feed read failed");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(event) = EntityEvent::parse_assignment(line, now()) else {
            tracing::warn!(line, "expected entity_id=state");
            continue;
        };
        match publisher.publish(event).await {
            Ok(()) => published += 1,
            Err(err) => tracing::warn!(error = %err, "failed to publish entity event"),
        }
    }
    tracing::info!(published, "entity feed ended");
    published
}
