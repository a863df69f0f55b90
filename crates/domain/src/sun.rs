//! Sun position, gating the restart of a mower parked for rain.
//!
//! A dry lawn only restarts the mower once the sun is past its top. While the
//! sun is still rising, or below the horizon, the mower stays parked.

use serde::{Deserialize, Serialize};

/// Phase of the sun as reported by the sun entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SunPhase {
    /// Above the horizon, before solar noon.
    Rising,
    /// Above the horizon, past solar noon.
    Setting,
    BelowHorizon,
}

impl SunPhase {
    /// Parse an entity state; unknown states yield `None`.
    #[must_use]
    pub fn from_state(state: &str) -> Option<Self> {
        match state.trim() {
            "rising" => Some(Self::Rising),
            "setting" => Some(Self::Setting),
            "below_horizon" => Some(Self::BelowHorizon),
            _ => None,
        }
    }

    /// Whether a mower parked for rain may restart once the lawn is dry.
    #[must_use]
    pub fn allows_restart(self) -> bool {
        self == Self::Setting
    }
}
