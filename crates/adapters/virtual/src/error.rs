use mowerhub_domain::error::MowerError;

/// Failures simulated by the virtual adapters.
#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    /// The virtual mower was taken offline.
    #[error("virtual mower is offline")]
    Offline { command: &'static str },

    /// The virtual store refuses writes.
    #[error("virtual store is read-only")]
    ReadOnly,
}

impl From<VirtualError> for MowerError {
    fn from(err: VirtualError) -> Self {
        match err {
            VirtualError::Offline { command } => Self::ActuatorCommandFailed {
                command,
                source: Some(Box::new(err)),
            },
            VirtualError::ReadOnly => Self::Storage(Box::new(err)),
        }
    }
}
