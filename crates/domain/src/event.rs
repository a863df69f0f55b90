//! Entity event — a state change observed on the entity bus.
//!
//! Sensors and the command input are external entities identified by a
//! string id (e.g. `sensor.rain_last_6h`). Their adapters publish every
//! state change as an [`EntityEvent`].

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// A new state reported for an external entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEvent {
    pub entity_id: String,
    pub state: String,
    pub at: Timestamp,
}

impl EntityEvent {
    #[must_use]
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>, at: Timestamp) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            at,
        }
    }

    /// Parse a `entity_id=state` line, as typed on a console.
    #[must_use]
    pub fn parse_assignment(line: &str, at: Timestamp) -> Option<Self> {
        let (entity_id, state) = line.split_once('=')?;
        let entity_id = entity_id.trim();
        if entity_id.is_empty() {
            return None;
        }
        Some(Self::new(entity_id, state.trim(), at))
    }
}
