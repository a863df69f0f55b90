//! Mower controller — the state machine deciding between mowing and parking.
//!
//! Every input (rain reading, manual command, tick, retry) is processed under
//! one lock: the rain evaluator is updated, a target mode is derived, and when
//! it differs from the current mode the actuator is commanded, the park
//! reason persisted and a notification dispatched, in that order.
//!
//! A mower parked for rain restarts on a dry lawn only once the sun is past
//! its top; until then an informational notice is sent once per reason.
//!
//! A failed actuator command leaves the mode untouched and asks the caller to
//! retry once after a backoff. A failed retry degrades the controller: a
//! notification is sent and automatic re-evaluation stops until the next
//! external input.

use std::future::Future;
use std::time::Duration;

use chrono::TimeDelta;
use tokio::sync::Mutex;

use mowerhub_domain::command::ParkCommand;
use mowerhub_domain::error::MowerError;
use mowerhub_domain::mode::{MowerMode, ParkReason, parse_persisted};
use mowerhub_domain::notification::NotificationKind;
use mowerhub_domain::rain::{Dryness, DrynessConfig, RainEvaluator, RainUpdate};
use mowerhub_domain::session::{BoundaryConfig, Session, SessionBoundary, SessionPlan};
use mowerhub_domain::sun::SunPhase;
use mowerhub_domain::time::Timestamp;

use crate::dispatch::ControllerInput;
use crate::notifier::NotificationDispatcher;
use crate::ports::{Clock, MowerActuator, NotificationChannel, NotificationHistory, ParkReasonStore};

/// Tuning of the controller, supplied by configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub dryness: DrynessConfig,
    pub boundary: BoundaryConfig,
    /// Upper bound for a single actuator command or store write.
    pub command_timeout: Duration,
    /// Delay before a failed actuator command is retried.
    pub retry_backoff: Duration,
    /// Park duration sent along with rain parks.
    pub rain_park_duration: Option<TimeDelta>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            dryness: DrynessConfig::default(),
            boundary: BoundaryConfig::default(),
            command_timeout: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(60),
            rain_park_duration: Some(TimeDelta::minutes(60_480)),
        }
    }
}

/// What the controller did with an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The current mode already matches the target.
    Unchanged,
    /// A transition was applied.
    Transitioned { from: MowerMode, to: MowerMode },
    /// The input was ignored: a retry is pending, the controller is
    /// degraded, or the retry is stale.
    Suppressed,
    /// The actuator command failed; feed [`ControllerInput::Retry`] after the delay.
    RetryScheduled { after: Duration },
    /// The retry failed as well; automatic retries stopped.
    Degraded,
}

impl Outcome {
    /// Delay after which the runner must feed a retry, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RetryScheduled { after } => Some(*after),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryState {
    Idle,
    Pending,
    Degraded,
}

/// Mode the controller wants to reach.
#[derive(Debug, Clone, Copy)]
enum Target {
    Park {
        mode: MowerMode,
        window: Option<Timestamp>,
    },
    Mow {
        planned_end_at: Option<Timestamp>,
        kind: NotificationKind,
    },
}

impl Target {
    fn mode(self) -> MowerMode {
        match self {
            Self::Park { mode, .. } => mode,
            Self::Mow { .. } => MowerMode::Mowing,
        }
    }

    fn notification(self) -> NotificationKind {
        match self {
            Self::Mow { kind, .. } => kind,
            Self::Park {
                mode: MowerMode::ParkedForRain,
                ..
            } => NotificationKind::ParkRain,
            Self::Park {
                mode: MowerMode::ParkedSessionBoundary,
                ..
            } => NotificationKind::ParkBoundary,
            Self::Park { .. } => NotificationKind::ParkCommand,
        }
    }
}

struct ControllerState {
    mode: MowerMode,
    rain: RainEvaluator,
    session: Option<Session>,
    manual_override: bool,
    /// Start of the next scheduling window while parked at a session boundary.
    next_window: Option<Timestamp>,
    /// Last reported sun phase; no gating until the sun entity reports.
    sun: Option<SunPhase>,
    /// Informational notice already sent while holding the current mode.
    notice: Option<NotificationKind>,
    retry: RetryState,
}

/// The mower state machine.
pub struct MowerController<A, S, C, H, K> {
    actuator: A,
    store: S,
    notifier: NotificationDispatcher<C, H>,
    clock: K,
    boundary: SessionBoundary,
    config: ControllerConfig,
    state: Mutex<ControllerState>,
}

impl<A, S, C, H, K> MowerController<A, S, C, H, K>
where
    A: MowerActuator,
    S: ParkReasonStore,
    C: NotificationChannel,
    H: NotificationHistory,
    K: Clock,
{
    /// Build a controller whose mode is rebuilt from the persisted park reason.
    ///
    /// A missing, unreadable or unrecognized reason falls back to
    /// [`MowerMode::fail_safe`] without commanding the mower.
    pub async fn restore(
        actuator: A,
        store: S,
        notifier: NotificationDispatcher<C, H>,
        clock: K,
        config: ControllerConfig,
    ) -> Self {
        let now = clock.now();
        let boundary = SessionBoundary::new(config.boundary);

        let restored = match store.read().await {
            Ok(Some(raw)) => parse_persisted(&raw).map(MowerMode::from_park_reason),
            Ok(None) => Err(MowerError::UnrecognizedPersistedReason(String::new())),
            Err(err) => Err(err),
        };
        let mode = match restored {
            Ok(mode) => mode,
            Err(err) => {
                let mode = MowerMode::fail_safe();
                tracing::warn!(error = %err, fallback = %mode, "cannot restore park reason");
                if let Err(err) = store.write(mode.park_reason()).await {
                    tracing::warn!(error = %err, "failed to persist fallback park reason");
                }
                mode
            }
        };

        let session = (mode == MowerMode::Mowing).then(|| {
            let crosses =
                boundary.would_cross_hour_boundary(now, config.boundary.estimated_session);
            Session::open(now, crosses.then(|| boundary.clamp_session_end(now)))
        });
        let next_window =
            (mode == MowerMode::ParkedSessionBoundary).then(|| boundary.next_window(now));

        tracing::info!(mode = %mode, "controller restored");

        Self {
            actuator,
            store,
            notifier,
            clock,
            boundary,
            config,
            state: Mutex::new(ControllerState {
                mode,
                rain: RainEvaluator::new(config.dryness, now),
                session,
                manual_override: mode == MowerMode::ParkedByCommand,
                next_window,
                sun: None,
                notice: None,
                retry: RetryState::Idle,
            }),
        }
    }

    pub async fn mode(&self) -> MowerMode {
        self.state.lock().await.mode
    }

    pub async fn session(&self) -> Option<Session> {
        self.state.lock().await.session.clone()
    }

    pub async fn is_degraded(&self) -> bool {
        self.state.lock().await.retry == RetryState::Degraded
    }

    /// Whether a manual park override is active.
    pub async fn manual_override(&self) -> bool {
        self.state.lock().await.manual_override
    }

    /// Time left before the running session must stop or the next scheduling
    /// window opens, when such a moment lies ahead.
    pub async fn until_deadline(&self) -> Option<Duration> {
        let state = self.state.lock().await;
        let deadline = match state.mode {
            MowerMode::Mowing => state
                .session
                .as_ref()
                .map(|s| self.boundary.clamp_session_end(s.started_at)),
            MowerMode::ParkedSessionBoundary => state.next_window,
            MowerMode::ParkedForRain | MowerMode::ParkedByCommand => None,
        }?;
        (deadline - self.clock.now())
            .to_std()
            .ok()
            .filter(|left| !left.is_zero())
    }

    /// Process one input.
    #[tracing::instrument(skip(self))]
    pub async fn handle(&self, input: ControllerInput) -> Outcome {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let mut sun_at_top = false;

        match input {
            ControllerInput::Rain(reading) => {
                let update = state.rain.on_rain_sensor_update(reading, now);
                if update == RainUpdate::RainEvent {
                    state.notice = None;
                }
                tracing::debug!(?reading, ?update, "rain reading");
            }
            ControllerInput::Command(command) => {
                state.manual_override = command.is_park();
                state.notice = None;
                tracing::info!(?command, "manual command");
            }
            ControllerInput::Sun(phase) => {
                sun_at_top = phase == SunPhase::Setting && state.sun == Some(SunPhase::Rising);
                if state.sun != Some(phase) {
                    state.notice = None;
                }
                state.sun = Some(phase);
                tracing::debug!(?phase, sun_at_top, "sun phase");
            }
            ControllerInput::Tick | ControllerInput::Retry => {}
        }

        if input.is_external() {
            if state.retry != RetryState::Idle {
                tracing::info!("external input clears pending retry");
            }
            state.retry = RetryState::Idle;
        } else {
            match (input, state.retry) {
                (ControllerInput::Tick, RetryState::Pending | RetryState::Degraded)
                | (ControllerInput::Retry, RetryState::Idle | RetryState::Degraded) => {
                    return Outcome::Suppressed;
                }
                _ => {}
            }
        }

        let Some(target) = self.decide(&mut state, now) else {
            if input == ControllerInput::Retry {
                state.retry = RetryState::Idle;
            }
            if let Some(kind) = Self::notice(&mut state, sun_at_top, now) {
                tracing::info!(kind = %kind, mode = %state.mode, "holding mode");
                self.notifier.notify(kind, now, None).await;
            }
            return Outcome::Unchanged;
        };
        self.apply(&mut state, input, target, now).await
    }

    /// Derive the mode the mower should be in, `None` when nothing changes.
    fn decide(&self, state: &mut ControllerState, now: Timestamp) -> Option<Target> {
        let dryness = state.rain.dryness(now);
        let target = match state.mode {
            MowerMode::ParkedByCommand if state.manual_override => return None,
            _ if state.manual_override => Target::Park {
                mode: MowerMode::ParkedByCommand,
                window: None,
            },
            MowerMode::ParkedByCommand => match dryness {
                Dryness::Dry => self.start(now, NotificationKind::Start),
                Dryness::Wet => Target::Park {
                    mode: MowerMode::ParkedForRain,
                    window: None,
                },
                Dryness::Indeterminate => return None,
            },
            MowerMode::Mowing => match dryness {
                Dryness::Wet => Target::Park {
                    mode: MowerMode::ParkedForRain,
                    window: None,
                },
                Dryness::Dry | Dryness::Indeterminate => {
                    let deadline = state
                        .session
                        .as_ref()
                        .is_some_and(|s| self.boundary.deadline_reached(s, now));
                    if !deadline {
                        return None;
                    }
                    Target::Park {
                        mode: MowerMode::ParkedSessionBoundary,
                        window: Some(self.boundary.next_window(now)),
                    }
                }
            },
            MowerMode::ParkedForRain => match dryness {
                Dryness::Dry if state.sun.is_none_or(SunPhase::allows_restart) => {
                    self.start(now, NotificationKind::Resume)
                }
                Dryness::Dry | Dryness::Wet | Dryness::Indeterminate => return None,
            },
            MowerMode::ParkedSessionBoundary => match dryness {
                Dryness::Wet => Target::Park {
                    mode: MowerMode::ParkedForRain,
                    window: None,
                },
                Dryness::Indeterminate => return None,
                Dryness::Dry => {
                    let window_open = state.next_window.is_none_or(|window| now >= window);
                    if !window_open {
                        return None;
                    }
                    self.start(now, NotificationKind::Start)
                }
            },
        };

        if target.mode() == state.mode {
            if let Target::Park {
                window: Some(window),
                ..
            } = target
            {
                state.next_window = Some(window);
            }
            return None;
        }
        Some(target)
    }

    /// Informational notice for a mode being held, sent once per reason.
    fn notice(
        state: &mut ControllerState,
        sun_at_top: bool,
        now: Timestamp,
    ) -> Option<NotificationKind> {
        if state.manual_override {
            return None;
        }
        let kind = match (state.mode, state.rain.dryness(now)) {
            (MowerMode::ParkedForRain, Dryness::Dry) => match state.sun? {
                SunPhase::Rising => NotificationKind::WaitingForNoon,
                SunPhase::BelowHorizon => NotificationKind::WaitingForTomorrow,
                SunPhase::Setting => return None,
            },
            (MowerMode::ParkedForRain, _) if sun_at_top => NotificationKind::StillWet,
            (MowerMode::ParkedByCommand, Dryness::Indeterminate) => NotificationKind::ResumePending,
            _ => return None,
        };
        if state.notice == Some(kind) {
            return None;
        }
        state.notice = Some(kind);
        Some(kind)
    }

    fn start(&self, now: Timestamp, kind: NotificationKind) -> Target {
        match self.boundary.plan_session(now) {
            SessionPlan::Start { planned_end_at } => Target::Mow {
                planned_end_at,
                kind,
            },
            SessionPlan::Defer { until } => Target::Park {
                mode: MowerMode::ParkedSessionBoundary,
                window: Some(until),
            },
        }
    }

    #[tracing::instrument(skip(self, state))]
    async fn apply(
        &self,
        state: &mut ControllerState,
        input: ControllerInput,
        target: Target,
        now: Timestamp,
    ) -> Outcome {
        let from = state.mode;
        let to = target.mode();

        let sent = match target {
            Target::Park { mode, window } => {
                let reason = mode.park_reason().unwrap_or(ParkReason::Command);
                let duration = match reason {
                    ParkReason::Rain => self.config.rain_park_duration,
                    ParkReason::SessionBoundary => window.map(|w| w - now),
                    ParkReason::Command => None,
                };
                self.bounded("park", self.actuator.request_park(ParkCommand::new(reason, duration)))
                    .await
            }
            Target::Mow { .. } => self.bounded("resume", self.actuator.request_resume()).await,
        };
        if let Err(err) = sent {
            return self.on_actuator_failure(state, input, &err, now).await;
        }

        state.retry = RetryState::Idle;
        state.notice = None;
        state.mode = to;
        let closed = state.session.take();
        state.next_window = None;
        let session = match target {
            Target::Mow { planned_end_at, .. } => {
                let opened = Session::open(now, planned_end_at);
                state.session = Some(opened.clone());
                Some(opened)
            }
            Target::Park { window, .. } => {
                if to == MowerMode::ParkedSessionBoundary {
                    state.next_window = window;
                }
                closed
            }
        };
        tracing::info!(from = %from, to = %to, "mode changed");

        let written = match tokio::time::timeout(
            self.config.command_timeout,
            self.store.write(to.park_reason()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(MowerError::Storage("park reason write timed out".into())),
        };
        if let Err(err) = written {
            let err = MowerError::PersistenceWriteFailed(Box::new(err));
            tracing::warn!(error = %err, mode = %to, "park reason not persisted");
            self.notifier
                .notify(NotificationKind::PersistenceWarning, now, None)
                .await;
        }

        self.notifier.notify(target.notification(), now, session).await;
        Outcome::Transitioned { from, to }
    }

    async fn on_actuator_failure(
        &self,
        state: &mut ControllerState,
        input: ControllerInput,
        err: &MowerError,
        now: Timestamp,
    ) -> Outcome {
        if input == ControllerInput::Retry {
            state.retry = RetryState::Degraded;
            tracing::error!(error = %err, mode = %state.mode, "retry failed, automatic control suspended");
            self.notifier
                .notify(NotificationKind::Degraded, now, None)
                .await;
            return Outcome::Degraded;
        }
        state.retry = RetryState::Pending;
        let after = self.config.retry_backoff;
        tracing::warn!(
            error = %err,
            mode = %state.mode,
            retry_in_ms = after.as_millis(),
            "actuator command failed"
        );
        Outcome::RetryScheduled { after }
    }

    async fn bounded<F>(&self, command: &'static str, fut: F) -> Result<(), MowerError>
    where
        F: Future<Output = Result<(), MowerError>>,
    {
        match tokio::time::timeout(self.config.command_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(MowerError::ActuatorCommandTimeout { command }),
        }
    }
}
