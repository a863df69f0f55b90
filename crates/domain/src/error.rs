//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`MowerError`]
//! via `From` when crossing a port boundary.

/// Base error for the mowerhub workspace.
#[derive(Debug, thiserror::Error)]
pub enum MowerError {
    /// The rain sensor reading is stale or missing.
    #[error("sensor {entity_id} unavailable")]
    SensorUnavailable { entity_id: String },

    /// The mower rejected or failed to execute a command.
    #[error("actuator command {command} failed")]
    ActuatorCommandFailed {
        command: &'static str,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The mower did not acknowledge a command in time.
    #[error("actuator command {command} timed out")]
    ActuatorCommandTimeout { command: &'static str },

    /// Writing the park reason to the external store failed.
    #[error("failed to persist park reason")]
    PersistenceWriteFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The persisted park reason could not be interpreted.
    #[error("unrecognized persisted park reason: {0:?}")]
    UnrecognizedPersistedReason(String),

    /// The message channel did not deliver a notification.
    #[error("notification delivery failed")]
    DeliveryFailed(#[source] Option<Box<dyn std::error::Error + Send + Sync>>),

    /// A storage backend failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_command_in_timeout_message() {
        let err = MowerError::ActuatorCommandTimeout { command: "park" };
        assert_eq!(err.to_string(), "actuator command park timed out");
    }

    #[test]
    fn should_display_unrecognized_reason_with_value() {
        let err = MowerError::UnrecognizedPersistedReason("lunch".to_string());
        assert_eq!(err.to_string(), "unrecognized persisted park reason: \"lunch\"");
    }
}
