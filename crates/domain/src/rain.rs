//! Rain evaluator — turns rain accumulation readings into a "lawn is dry"
//! verdict with hysteresis.
//!
//! A non-zero reading is a rain event when the lawn is dry or when it rises
//! above the previous one: the lawn is wet immediately. The lawn only becomes dry again once the dry-debounce
//! interval has passed since the last rain event *and* the accumulation has
//! stayed below the rain threshold for that whole interval.
//!
//! Without any rain history the verdict stays [`Dryness::Indeterminate`]
//! until a valid reading has been seen and the observation window since
//! start-up has elapsed.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Tuning of the evaluator, supplied by configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrynessConfig {
    /// Minimum time without a rain event before the lawn may dry.
    pub dry_debounce: TimeDelta,
    /// Accumulation (mm) at or above which the lawn cannot be dry.
    pub rain_threshold: f64,
    /// Time to observe the sensor after start-up before trusting "no rain".
    pub observation_window: TimeDelta,
}

impl Default for DrynessConfig {
    fn default() -> Self {
        Self {
            dry_debounce: TimeDelta::hours(6),
            rain_threshold: 0.1,
            observation_window: TimeDelta::minutes(30),
        }
    }
}

/// A single reading of the rain accumulation sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RainReading {
    Millimeters(f64),
    /// Stale, missing or unparsable reading.
    Unavailable,
}

impl RainReading {
    /// Parse an entity state string.
    #[must_use]
    pub fn parse(state: &str) -> Self {
        match state.trim().parse::<f64>() {
            Ok(mm) if mm.is_finite() && mm >= 0.0 => Self::Millimeters(mm),
            _ => Self::Unavailable,
        }
    }
}

/// Result of feeding a reading to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainUpdate {
    /// New rain was observed; the lawn is now wet.
    RainEvent,
    /// Accumulation updated without new rain.
    Accumulation,
    /// The reading was unusable; the last known state is kept.
    Unavailable,
}

/// Tri-state dryness verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dryness {
    Dry,
    Wet,
    Indeterminate,
}

/// Observable state of the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainState {
    pub accumulated_since: Timestamp,
    pub last_rain_event_at: Option<Timestamp>,
    pub is_dry: bool,
}

/// Rain/dryness evaluator. Only this type mutates [`RainState`].
#[derive(Debug, Clone)]
pub struct RainEvaluator {
    config: DrynessConfig,
    state: RainState,
    started_at: Timestamp,
    accumulated_mm: Option<f64>,
    below_threshold_since: Option<Timestamp>,
}

impl RainEvaluator {
    #[must_use]
    pub fn new(config: DrynessConfig, now: Timestamp) -> Self {
        Self {
            config,
            state: RainState {
                accumulated_since: now,
                last_rain_event_at: None,
                is_dry: false,
            },
            started_at: now,
            accumulated_mm: None,
            below_threshold_since: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &RainState {
        &self.state
    }

    /// Last valid accumulation reading.
    #[must_use]
    pub fn accumulated_mm(&self) -> Option<f64> {
        self.accumulated_mm
    }

    /// Feed a sensor reading taken at `now`.
    pub fn on_rain_sensor_update(&mut self, reading: RainReading, now: Timestamp) -> RainUpdate {
        let RainReading::Millimeters(mm) = reading else {
            return RainUpdate::Unavailable;
        };

        let previous = self.accumulated_mm.unwrap_or(0.0);
        self.accumulated_mm = Some(mm);
        let below = mm < self.config.rain_threshold;

        let update = if mm > 0.0 && (self.state.is_dry || mm > previous) {
            self.state.is_dry = false;
            self.state.last_rain_event_at = Some(now);
            self.state.accumulated_since = now;
            self.below_threshold_since = below.then_some(now);
            RainUpdate::RainEvent
        } else {
            if !below {
                self.below_threshold_since = None;
            } else if self.below_threshold_since.is_none() {
                self.below_threshold_since = Some(now);
            }
            RainUpdate::Accumulation
        };

        self.refresh(now);
        update
    }

    /// Re-evaluate the debounce against the clock.
    pub fn refresh(&mut self, now: Timestamp) {
        if self.state.is_dry {
            return;
        }
        let Some(below_since) = self.below_threshold_since else {
            return;
        };
        let calm_long_enough = now - below_since >= self.config.dry_debounce;

        let dry = match self.state.last_rain_event_at {
            Some(last) => now - last >= self.config.dry_debounce && calm_long_enough,
            None => {
                self.accumulated_mm.is_some()
                    && now - self.started_at >= self.config.observation_window
            }
        };
        if dry {
            self.state.is_dry = true;
        }
    }

    /// Current verdict, refreshed against `now`.
    pub fn dryness(&mut self, now: Timestamp) -> Dryness {
        self.refresh(now);
        if self.state.is_dry {
            Dryness::Dry
        } else if self.state.last_rain_event_at.is_some() {
            Dryness::Wet
        } else {
            Dryness::Indeterminate
        }
    }

    pub fn currently_dry(&mut self, now: Timestamp) -> bool {
        self.dryness(now) == Dryness::Dry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2023, 8, 3, 8, 0, 0).unwrap()
    }

    fn config() -> DrynessConfig {
        DrynessConfig {
            dry_debounce: TimeDelta::hours(6),
            rain_threshold: 0.1,
            observation_window: TimeDelta::minutes(30),
        }
    }

    fn mm(value: f64) -> RainReading {
        RainReading::Millimeters(value)
    }

    #[test]
    fn should_parse_numeric_reading() {
        assert_eq!(RainReading::parse("1.5"), mm(1.5));
        assert_eq!(RainReading::parse(" 0 "), mm(0.0));
    }

    #[test]
    fn should_treat_unavailable_states_as_unavailable() {
        assert_eq!(RainReading::parse("unavailable"), RainReading::Unavailable);
        assert_eq!(RainReading::parse("unknown"), RainReading::Unavailable);
        assert_eq!(RainReading::parse("-1"), RainReading::Unavailable);
        assert_eq!(RainReading::parse("NaN"), RainReading::Unavailable);
    }

    #[test]
    fn should_be_indeterminate_before_any_reading() {
        let mut eval = RainEvaluator::new(config(), t0());
        assert_eq!(eval.dryness(t0() + TimeDelta::hours(2)), Dryness::Indeterminate);
    }

    #[test]
    fn should_stay_indeterminate_during_observation_window() {
        let mut eval = RainEvaluator::new(config(), t0());
        eval.on_rain_sensor_update(mm(0.0), t0());
        assert_eq!(eval.dryness(t0() + TimeDelta::minutes(29)), Dryness::Indeterminate);
    }

    #[test]
    fn should_become_dry_after_observation_window_without_rain() {
        let mut eval = RainEvaluator::new(config(), t0());
        eval.on_rain_sensor_update(mm(0.0), t0());
        assert_eq!(eval.dryness(t0() + TimeDelta::minutes(30)), Dryness::Dry);
        assert!(eval.state().is_dry);
    }

    #[test]
    fn should_turn_wet_immediately_on_rain() {
        let mut eval = RainEvaluator::new(config(), t0());
        eval.on_rain_sensor_update(mm(0.0), t0());
        assert!(eval.currently_dry(t0() + TimeDelta::hours(1)));

        let at = t0() + TimeDelta::hours(2);
        let update = eval.on_rain_sensor_update(mm(0.4), at);
        assert_eq!(update, RainUpdate::RainEvent);
        assert_eq!(eval.dryness(at), Dryness::Wet);
        assert_eq!(eval.state().last_rain_event_at, Some(at));
        assert_eq!(eval.state().accumulated_since, at);
    }

    #[test]
    fn should_turn_wet_on_any_rain_while_dry() {
        let mut eval = RainEvaluator::new(config(), t0());
        eval.on_rain_sensor_update(mm(0.05), t0());
        let later = t0() + TimeDelta::hours(7);
        assert_eq!(eval.dryness(later), Dryness::Dry);

        let update = eval.on_rain_sensor_update(mm(0.05), later);
        assert_eq!(update, RainUpdate::RainEvent);
        assert_eq!(eval.dryness(later), Dryness::Wet);
        assert_eq!(eval.state().last_rain_event_at, Some(later));
    }

    #[test]
    fn should_not_dry_before_debounce_elapses() {
        let mut eval = RainEvaluator::new(config(), t0());
        eval.on_rain_sensor_update(mm(0.4), t0());
        eval.on_rain_sensor_update(mm(0.0), t0() + TimeDelta::minutes(10));
        assert_eq!(eval.dryness(t0() + TimeDelta::hours(6)), Dryness::Wet);
    }

    #[test]
    fn should_dry_once_debounce_elapsed_below_threshold() {
        let mut eval = RainEvaluator::new(config(), t0());
        eval.on_rain_sensor_update(mm(0.4), t0());
        let calm = t0() + TimeDelta::minutes(10);
        eval.on_rain_sensor_update(mm(0.0), calm);
        assert_eq!(eval.dryness(calm + TimeDelta::hours(6)), Dryness::Dry);
    }

    #[test]
    fn should_restart_debounce_on_new_rain_mid_interval() {
        let mut eval = RainEvaluator::new(config(), t0());
        eval.on_rain_sensor_update(mm(0.05), t0());
        let second = t0() + TimeDelta::hours(3);
        eval.on_rain_sensor_update(mm(0.08), second);
        assert_eq!(eval.dryness(t0() + TimeDelta::hours(6)), Dryness::Wet);
        assert_eq!(eval.dryness(second + TimeDelta::hours(6)), Dryness::Dry);
    }

    #[test]
    fn should_not_count_decreasing_accumulation_as_rain() {
        let mut eval = RainEvaluator::new(config(), t0());
        eval.on_rain_sensor_update(mm(2.0), t0());
        let update = eval.on_rain_sensor_update(mm(1.0), t0() + TimeDelta::hours(1));
        assert_eq!(update, RainUpdate::Accumulation);
        assert_eq!(eval.state().last_rain_event_at, Some(t0()));
    }

    #[test]
    fn should_require_below_threshold_for_the_whole_debounce() {
        let mut eval = RainEvaluator::new(config(), t0());
        eval.on_rain_sensor_update(mm(2.0), t0());
        // Rolling accumulation drains below threshold only after 5 hours.
        let drained = t0() + TimeDelta::hours(5);
        eval.on_rain_sensor_update(mm(0.0), drained);
        assert_eq!(eval.dryness(t0() + TimeDelta::hours(7)), Dryness::Wet);
        assert_eq!(eval.dryness(drained + TimeDelta::hours(6)), Dryness::Dry);
    }

    #[test]
    fn should_hold_state_on_unavailable_reading() {
        let mut eval = RainEvaluator::new(config(), t0());
        eval.on_rain_sensor_update(mm(0.4), t0());
        let before = eval.state().clone();
        let update = eval.on_rain_sensor_update(RainReading::Unavailable, t0() + TimeDelta::hours(1));
        assert_eq!(update, RainUpdate::Unavailable);
        assert_eq!(eval.state(), &before);
        assert_eq!(eval.accumulated_mm(), Some(0.4));
    }

    #[test]
    fn should_treat_rain_after_unavailable_as_rising_from_last_valid() {
        let mut eval = RainEvaluator::new(config(), t0());
        eval.on_rain_sensor_update(mm(0.0), t0());
        eval.on_rain_sensor_update(RainReading::Unavailable, t0() + TimeDelta::minutes(5));
        let update = eval.on_rain_sensor_update(mm(0.2), t0() + TimeDelta::minutes(10));
        assert_eq!(update, RainUpdate::RainEvent);
    }

    #[test]
    fn should_never_flip_dry_mid_interval_for_any_rain_sequence() {
        let readings = [0.0, 0.3, 0.3, 0.0, 0.2, 0.0, 0.0, 0.0];
        let step = TimeDelta::hours(2);
        let mut eval = RainEvaluator::new(config(), t0());
        for (i, value) in readings.iter().enumerate() {
            let at = t0() + step * i32::try_from(i).unwrap();
            let update = eval.on_rain_sensor_update(mm(*value), at);
            if update == RainUpdate::RainEvent {
                assert!(!eval.state().is_dry);
            }
            if let Some(last) = eval.state().last_rain_event_at {
                if eval.state().is_dry {
                    assert!(at - last >= TimeDelta::hours(6));
                }
            }
        }
    }
}
