//! Mower mode and its persisted park reason.
//!
//! Exactly one [`MowerMode`] is active at a time. Every parked variant maps to
//! a [`ParkReason`] that is written to the external store so that "why am I
//! parked" survives a restart; `Mowing` maps to a cleared reason.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MowerError;

/// Text persisted when no park reason is active.
pub const CLEARED_REASON: &str = "none";

/// Operating mode of the mower, owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MowerMode {
    Mowing,
    ParkedForRain,
    ParkedByCommand,
    ParkedSessionBoundary,
}

impl MowerMode {
    /// The reason that must be persisted while this mode is active.
    #[must_use]
    pub fn park_reason(self) -> Option<ParkReason> {
        match self {
            Self::Mowing => None,
            Self::ParkedForRain => Some(ParkReason::Rain),
            Self::ParkedByCommand => Some(ParkReason::Command),
            Self::ParkedSessionBoundary => Some(ParkReason::SessionBoundary),
        }
    }

    /// Rebuild a mode from a persisted reason.
    #[must_use]
    pub fn from_park_reason(reason: Option<ParkReason>) -> Self {
        match reason {
            None => Self::Mowing,
            Some(ParkReason::Rain) => Self::ParkedForRain,
            Some(ParkReason::Command) => Self::ParkedByCommand,
            Some(ParkReason::SessionBoundary) => Self::ParkedSessionBoundary,
        }
    }

    #[must_use]
    pub fn is_parked(self) -> bool {
        !matches!(self, Self::Mowing)
    }

    /// Mode used when the persisted reason cannot be trusted.
    ///
    /// Parked by command never actuates on its own.
    #[must_use]
    pub fn fail_safe() -> Self {
        Self::ParkedByCommand
    }
}

impl std::fmt::Display for MowerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mowing => f.write_str("mowing"),
            Self::ParkedForRain => f.write_str("parked_for_rain"),
            Self::ParkedByCommand => f.write_str("parked_by_command"),
            Self::ParkedSessionBoundary => f.write_str("parked_session_boundary"),
        }
    }
}

/// Persisted cause of the current parked state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParkReason {
    Rain,
    Command,
    SessionBoundary,
}

impl ParkReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rain => "rain",
            Self::Command => "command",
            Self::SessionBoundary => "session_boundary",
        }
    }
}

impl std::fmt::Display for ParkReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParkReason {
    type Err = MowerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rain" => Ok(Self::Rain),
            "command" => Ok(Self::Command),
            "session_boundary" => Ok(Self::SessionBoundary),
            other => Err(MowerError::UnrecognizedPersistedReason(other.to_string())),
        }
    }
}

/// Text form of an optional reason, as written to the store.
#[must_use]
pub fn persisted_text(reason: Option<ParkReason>) -> &'static str {
    reason.map_or(CLEARED_REASON, ParkReason::as_str)
}

/// Parse the text read back from the store.
///
/// Besides the canonical forms, the binary-sensor states `on` / `off` of the
/// legacy "parked because of rain" entity are accepted.
///
/// # Errors
///
/// Returns [`MowerError::UnrecognizedPersistedReason`] for any other text.
pub fn parse_persisted(raw: &str) -> Result<Option<ParkReason>, MowerError> {
    match raw.trim() {
        CLEARED_REASON | "off" => Ok(None),
        "on" => Ok(Some(ParkReason::Rain)),
        other => other.parse().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_every_mode_through_its_reason_and_back() {
        for mode in [
            MowerMode::Mowing,
            MowerMode::ParkedForRain,
            MowerMode::ParkedByCommand,
            MowerMode::ParkedSessionBoundary,
        ] {
            assert_eq!(MowerMode::from_park_reason(mode.park_reason()), mode);
        }
    }

    #[test]
    fn should_report_mowing_as_not_parked() {
        assert!(!MowerMode::Mowing.is_parked());
        assert!(MowerMode::ParkedForRain.is_parked());
    }

    #[test]
    fn should_fail_safe_to_parked_by_command() {
        assert_eq!(MowerMode::fail_safe(), MowerMode::ParkedByCommand);
    }

    #[test]
    fn should_parse_cleared_reason() {
        assert_eq!(parse_persisted("none").unwrap(), None);
        assert_eq!(parse_persisted("off").unwrap(), None);
    }

    #[test]
    fn should_parse_legacy_on_as_rain() {
        assert_eq!(parse_persisted("on").unwrap(), Some(ParkReason::Rain));
    }

    #[test]
    fn should_parse_canonical_reasons() {
        assert_eq!(
            parse_persisted("session_boundary").unwrap(),
            Some(ParkReason::SessionBoundary)
        );
        assert_eq!(parse_persisted(" command ").unwrap(), Some(ParkReason::Command));
    }

    #[test]
    fn should_reject_unknown_reason() {
        let err = parse_persisted("unavailable").unwrap_err();
        assert!(matches!(err, MowerError::UnrecognizedPersistedReason(v) if v == "unavailable"));
    }

    #[test]
    fn should_write_none_for_cleared_reason() {
        assert_eq!(persisted_text(None), "none");
        assert_eq!(persisted_text(Some(ParkReason::Rain)), "rain");
    }

    #[test]
    fn should_serialize_mode_in_snake_case() {
        let json = serde_json::to_string(&MowerMode::ParkedForRain).unwrap();
        assert_eq!(json, "\"parked_for_rain\"");
    }
}
