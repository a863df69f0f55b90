//! Event loop driving the controller from the entity bus and its timers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior, Sleep};

use mowerhub_domain::event::EntityEvent;

use crate::controller::{MowerController, Outcome};
use crate::dispatch::{ControllerInput, DispatchTable};
use crate::ports::{Clock, MowerActuator, NotificationChannel, NotificationHistory, ParkReasonStore};

/// Feeds bus events, periodic ticks and retries into a [`MowerController`].
pub struct ControllerRunner<A, S, C, H, K> {
    controller: Arc<MowerController<A, S, C, H, K>>,
    table: DispatchTable,
    tick_interval: Duration,
}

impl<A, S, C, H, K> ControllerRunner<A, S, C, H, K>
where
    A: MowerActuator,
    S: ParkReasonStore,
    C: NotificationChannel,
    H: NotificationHistory,
    K: Clock,
{
    pub fn new(
        controller: Arc<MowerController<A, S, C, H, K>>,
        table: DispatchTable,
        tick_interval: Duration,
    ) -> Self {
        Self {
            controller,
            table,
            tick_interval,
        }
    }

    /// Run until `shutdown` resolves or the bus closes.
    ///
    /// Inputs are handled one at a time. A pending retry is dropped as soon as
    /// an external input arrives. Besides the periodic tick, an extra tick
    /// fires exactly at the session deadline or the next scheduling window.
    pub async fn run(
        self,
        mut events: broadcast::Receiver<EntityEvent>,
        shutdown: impl Future<Output = ()>,
    ) {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let retry = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(retry);
        let mut retry_armed = false;

        let deadline = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(deadline);
        let mut deadline_armed = self.arm_deadline(deadline.as_mut()).await;

        tracing::info!(
            tick_interval_ms = self.tick_interval.as_millis(),
            "controller runner started"
        );

        loop {
            let input = tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                received = events.recv() => match received {
                    Ok(event) => {
                        let Some(input) = self.table.translate(&event) else {
                            continue;
                        };
                        tracing::debug!(entity_id = %event.entity_id, state = %event.state, "entity event");
                        input
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "controller lagged behind the entity bus");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("entity bus closed");
                        break;
                    }
                },
                () = &mut retry, if retry_armed => {
                    retry_armed = false;
                    ControllerInput::Retry
                }
                () = &mut deadline, if deadline_armed => {
                    deadline_armed = false;
                    ControllerInput::Tick
                }
                _ = ticker.tick() => ControllerInput::Tick,
            };

            if input.is_external() && retry_armed {
                tracing::debug!("pending retry cancelled");
                retry_armed = false;
            }

            let outcome = self.controller.handle(input).await;
            match outcome {
                Outcome::Transitioned { from, to } => {
                    tracing::debug!(?input, from = %from, to = %to, "input handled");
                }
                Outcome::RetryScheduled { after } => {
                    retry.as_mut().reset(Instant::now() + after);
                    retry_armed = true;
                }
                Outcome::Unchanged | Outcome::Suppressed | Outcome::Degraded => {
                    tracing::trace!(?input, ?outcome, "input handled");
                }
            }
            deadline_armed = self.arm_deadline(deadline.as_mut()).await;
        }

        tracing::info!("controller runner stopped");
    }

    async fn arm_deadline(&self, sleep: Pin<&mut Sleep>) -> bool {
        let Some(left) = self.controller.until_deadline().await else {
            return false;
        };
        tracing::debug!(in_ms = left.as_millis(), "deadline armed");
        sleep.reset(Instant::now() + left);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerConfig;
    use crate::dispatch::InputKind;
    use crate::event_bus::InProcessEventBus;
    use crate::notifier::NotificationDispatcher;
    use crate::ports::EventPublisher;
    use crate::testing::{
        ActuatorCall, ManualClock, MemoryHistory, MemoryStore, ScriptedActuator, SpyChannel,
        TokioClock, at,
    };
    use mowerhub_domain::command::ParkCommand;
    use mowerhub_domain::mode::{MowerMode, ParkReason};
    use mowerhub_domain::notification::MessageTemplates;
    use tokio::sync::oneshot;

    type TestController = MowerController<
        Arc<ScriptedActuator>,
        Arc<MemoryStore>,
        Arc<SpyChannel>,
        Arc<MemoryHistory>,
        Arc<ManualClock>,
    >;

    async fn controller(
        persisted: &str,
        actuator: Arc<ScriptedActuator>,
    ) -> Arc<TestController> {
        let notifier = NotificationDispatcher::new(
            SpyChannel::new(),
            MemoryHistory::new(),
            MessageTemplates::default(),
            Duration::from_secs(5),
        );
        let controller = MowerController::restore(
            actuator,
            MemoryStore::with(Some(persisted)),
            notifier,
            ManualClock::starting_at(at(9, 0)),
            ControllerConfig::default(),
        )
        .await;
        Arc::new(controller)
    }

    fn table() -> DispatchTable {
        DispatchTable::new()
            .route("sensor.rain", InputKind::RainAccumulation)
            .route("input_select.mower", InputKind::ManualCommand)
    }

    async fn publish(bus: &InProcessEventBus, entity_id: &str, state: &str) {
        bus.publish(EntityEvent::new(entity_id, state, at(9, 0)))
            .await
            .unwrap();
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn should_park_when_rain_event_arrives_on_bus() {
        let actuator = ScriptedActuator::new();
        let controller = controller("none", actuator.clone()).await;
        let bus = InProcessEventBus::new(16);
        let runner = ControllerRunner::new(controller.clone(), table(), Duration::from_secs(60));
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(runner.run(bus.subscribe(), async move {
            let _ = stopped.await;
        }));

        publish(&bus, "sensor.rain", "0.7").await;
        settle().await;

        assert_eq!(controller.mode().await, MowerMode::ParkedForRain);
        assert_eq!(actuator.calls().len(), 1);

        stop.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_events_of_unrouted_entities() {
        let actuator = ScriptedActuator::new();
        let controller = controller("none", actuator.clone()).await;
        let bus = InProcessEventBus::new(16);
        let runner = ControllerRunner::new(controller.clone(), table(), Duration::from_secs(60));
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(runner.run(bus.subscribe(), async move {
            let _ = stopped.await;
        }));

        publish(&bus, "sensor.garden_rain", "3.2").await;
        settle().await;

        assert_eq!(controller.mode().await, MowerMode::Mowing);
        assert!(actuator.calls().is_empty());

        stop.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn should_retry_failed_command_after_backoff() {
        let actuator = ScriptedActuator::new();
        actuator.fail_next(1);
        let controller = controller("none", actuator.clone()).await;
        let bus = InProcessEventBus::new(16);
        let runner = ControllerRunner::new(controller.clone(), table(), Duration::from_secs(10));
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(runner.run(bus.subscribe(), async move {
            let _ = stopped.await;
        }));

        publish(&bus, "sensor.rain", "0.7").await;
        settle().await;
        assert_eq!(controller.mode().await, MowerMode::Mowing);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(actuator.calls().len(), 1, "ticks must not retry early");

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(controller.mode().await, MowerMode::ParkedForRain);
        assert_eq!(actuator.calls().len(), 2);

        stop.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn should_cancel_pending_retry_on_manual_command() {
        let actuator = ScriptedActuator::new();
        actuator.fail_next(1);
        let controller = controller("none", actuator.clone()).await;
        let bus = InProcessEventBus::new(16);
        let runner = ControllerRunner::new(controller.clone(), table(), Duration::from_secs(10));
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(runner.run(bus.subscribe(), async move {
            let _ = stopped.await;
        }));

        publish(&bus, "sensor.rain", "0.7").await;
        settle().await;
        publish(&bus, "input_select.mower", "park_until_further_notice").await;
        settle().await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(controller.mode().await, MowerMode::ParkedByCommand);
        assert_eq!(actuator.calls().len(), 2);
        assert!(matches!(actuator.calls()[1], ActuatorCall::Park(_)));

        stop.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn should_park_at_session_deadline_between_ticks() {
        let actuator = ScriptedActuator::new();
        let notifier = NotificationDispatcher::new(
            SpyChannel::new(),
            MemoryHistory::new(),
            MessageTemplates::default(),
            Duration::from_secs(5),
        );
        let controller = Arc::new(
            MowerController::restore(
                actuator.clone(),
                MemoryStore::with(Some("none")),
                notifier,
                TokioClock::starting_at(at(10, 30)),
                ControllerConfig::default(),
            )
            .await,
        );
        let bus = InProcessEventBus::new(16);
        let runner = ControllerRunner::new(controller.clone(), table(), Duration::from_secs(3600));
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(runner.run(bus.subscribe(), async move {
            let _ = stopped.await;
        }));

        tokio::time::sleep(Duration::from_secs(25 * 60 - 1)).await;
        assert_eq!(controller.mode().await, MowerMode::Mowing);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(controller.mode().await, MowerMode::ParkedSessionBoundary);
        let calls = actuator.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            calls[0],
            ActuatorCall::Park(ParkCommand {
                reason: ParkReason::SessionBoundary,
                ..
            })
        ));

        stop.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_when_bus_closes() {
        let controller = controller("none", ScriptedActuator::new()).await;
        let bus = InProcessEventBus::new(16);
        let runner = ControllerRunner::new(controller, table(), Duration::from_secs(60));
        let events = bus.subscribe();
        drop(bus);

        runner.run(events, std::future::pending()).await;
    }
}
