//! Mowing sessions and the hour-boundary rule.
//!
//! No session may run into the next wall-clock hour. When a session that is
//! about to start would cross the next hour mark, its end is clamped to that
//! mark minus a safety margin; when even the clamped end is not in the future
//! the start is deferred to the next scheduling window.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::id::SessionId;
use crate::time::{Timestamp, next_hour, top_of_hour};

/// One continuous interval during which the mower is actively mowing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub started_at: Timestamp,
    pub planned_end_at: Option<Timestamp>,
}

impl Session {
    #[must_use]
    pub fn open(started_at: Timestamp, planned_end_at: Option<Timestamp>) -> Self {
        Self {
            id: SessionId::new(),
            started_at,
            planned_end_at,
        }
    }
}

/// Boundary settings, supplied by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryConfig {
    /// How long a session is expected to last.
    pub estimated_session: TimeDelta,
    /// How long before the hour mark a session must be over.
    pub safety_margin: TimeDelta,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            estimated_session: TimeDelta::minutes(45),
            safety_margin: TimeDelta::minutes(5),
        }
    }
}

/// Outcome of planning a session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPlan {
    /// Start now; the end is forced only when the session would cross.
    Start { planned_end_at: Option<Timestamp> },
    /// Too close to the hour mark; wait for the next window.
    Defer { until: Timestamp },
}

/// Stateless hour-boundary manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionBoundary {
    config: BoundaryConfig,
}

impl SessionBoundary {
    #[must_use]
    pub fn new(config: BoundaryConfig) -> Self {
        Self { config }
    }

    /// Whether the wall-clock hour of `start_at + estimated_duration` differs from `start_at`'s.
    #[must_use]
    pub fn would_cross_hour_boundary(
        &self,
        start_at: Timestamp,
        estimated_duration: TimeDelta,
    ) -> bool {
        top_of_hour(start_at + estimated_duration) != top_of_hour(start_at)
    }

    /// Top of the next hour minus the safety margin.
    #[must_use]
    pub fn clamp_session_end(&self, start_at: Timestamp) -> Timestamp {
        next_hour(start_at) - self.config.safety_margin
    }

    /// Start of the next scheduling window.
    #[must_use]
    pub fn next_window(&self, at: Timestamp) -> Timestamp {
        next_hour(at)
    }

    /// Decide whether a session may start at `start_at`.
    #[must_use]
    pub fn plan_session(&self, start_at: Timestamp) -> SessionPlan {
        let end = self.clamp_session_end(start_at);
        if end <= start_at {
            return SessionPlan::Defer {
                until: self.next_window(start_at),
            };
        }
        let crosses = self.would_cross_hour_boundary(start_at, self.config.estimated_session);
        SessionPlan::Start {
            planned_end_at: crosses.then_some(end),
        }
    }

    /// Whether a running session has reached the latest moment it may run.
    #[must_use]
    pub fn deadline_reached(&self, session: &Session, now: Timestamp) -> bool {
        now >= self.clamp_session_end(session.started_at)
    }
}
