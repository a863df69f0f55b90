//! Time and timestamp helpers.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// UTC timestamp used for readings, sessions, notification times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Truncate a timestamp to the top of its wall-clock hour.
#[must_use]
pub fn top_of_hour(ts: Timestamp) -> Timestamp {
    ts.duration_trunc(TimeDelta::hours(1)).unwrap_or(ts)
}

/// The first hour mark strictly after `ts`.
#[must_use]
pub fn next_hour(ts: Timestamp) -> Timestamp {
    top_of_hour(ts) + TimeDelta::hours(1)
}
