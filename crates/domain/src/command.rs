//! Commands — manual overrides received from the user and park requests sent
//! to the mower.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::mode::ParkReason;

/// Manual command read from the command input entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualCommand {
    Park,
    Resume,
    ParkUntilFurtherNotice,
}

impl ManualCommand {
    /// Parse the state of the command entity.
    ///
    /// `week_schedule` and `charging` are the mower's own states once it is
    /// handed back to its schedule, so they count as a resume.
    #[must_use]
    pub fn from_state(state: &str) -> Option<Self> {
        match state.trim() {
            "park" => Some(Self::Park),
            "resume" | "week_schedule" | "charging" => Some(Self::Resume),
            "park_until_further_notice" | "parked_until_further_notice" => {
                Some(Self::ParkUntilFurtherNotice)
            }
            _ => None,
        }
    }

    /// Whether the command engages the manual override.
    #[must_use]
    pub fn is_park(self) -> bool {
        matches!(self, Self::Park | Self::ParkUntilFurtherNotice)
    }
}

/// A park request sent to the mower actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParkCommand {
    pub reason: ParkReason,
    /// How long the mower should stay docked; `None` parks until further notice.
    pub duration: Option<TimeDelta>,
}

impl ParkCommand {
    #[must_use]
    pub fn new(reason: ParkReason, duration: Option<TimeDelta>) -> Self {
        Self { reason, duration }
    }

    /// Duration in whole minutes, rounded up, as mower APIs expect.
    #[must_use]
    pub fn duration_minutes(&self) -> Option<i64> {
        self.duration.map(|d| {
            let secs = d.num_seconds().max(0);
            (secs + 59) / 60
        })
    }
}
