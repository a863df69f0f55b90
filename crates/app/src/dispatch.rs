//! Dispatch table — maps entity bus events to controller inputs.
//!
//! The controller knows nothing about entity ids or subscriptions. The table
//! is built once at start-up from configuration and routes every bus event
//! to the kind of input it represents; unknown entities are ignored.

use std::collections::HashMap;

use mowerhub_domain::command::ManualCommand;
use mowerhub_domain::error::MowerError;
use mowerhub_domain::event::EntityEvent;
use mowerhub_domain::rain::RainReading;
use mowerhub_domain::sun::SunPhase;

/// An input processed by the mower controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerInput {
    /// New reading of the rain accumulation sensor.
    Rain(RainReading),
    /// Manual command from the user.
    Command(ManualCommand),
    /// New phase of the sun.
    Sun(SunPhase),
    /// Periodic clock tick.
    Tick,
    /// Scheduled retry of a failed actuator command.
    Retry,
}

impl ControllerInput {
    /// Inputs coming from the outside world (sensor or user), as opposed to
    /// the controller's own timers.
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Self::Rain(_) | Self::Command(_) | Self::Sun(_))
    }
}

/// What an entity feeds into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    RainAccumulation,
    ManualCommand,
    Sun,
}

/// Routing table from entity id to input kind.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    routes: HashMap<String, InputKind>,
}

impl DispatchTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route events of `entity_id` as `kind`.
    #[must_use]
    pub fn route(mut self, entity_id: impl Into<String>, kind: InputKind) -> Self {
        self.routes.insert(entity_id.into(), kind);
        self
    }

    /// Kind registered for an entity, if any.
    #[must_use]
    pub fn kind_of(&self, entity_id: &str) -> Option<InputKind> {
        self.routes.get(entity_id).copied()
    }

    /// Translate a bus event into a controller input.
    ///
    /// Returns `None` for unrouted entities, unknown command or sun states and
    /// unavailable rain readings (the last known rain state is kept).
    #[must_use]
    pub fn translate(&self, event: &EntityEvent) -> Option<ControllerInput> {
        match self.kind_of(&event.entity_id)? {
            InputKind::RainAccumulation => match RainReading::parse(&event.state) {
                RainReading::Unavailable => {
                    let err = MowerError::SensorUnavailable {
                        entity_id: event.entity_id.clone(),
                    };
                    tracing::warn!(state = %event.state, error = %err, "ignoring rain reading");
                    None
                }
                reading => Some(ControllerInput::Rain(reading)),
            },
            InputKind::ManualCommand => {
                let command = ManualCommand::from_state(&event.state);
                if command.is_none() {
                    tracing::debug!(
                        entity_id = %event.entity_id,
                        state = %event.state,
                        "command state has no meaning for the controller"
                    );
                }
                command.map(ControllerInput::Command)
            }
            InputKind::Sun => {
                let phase = SunPhase::from_state(&event.state);
                if phase.is_none() {
                    tracing::debug!(state = %event.state, "unknown sun state");
                }
                phase.map(ControllerInput::Sun)
            }
        }
    }
}
