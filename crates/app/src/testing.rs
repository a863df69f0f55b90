//! In-memory fakes of the ports, shared by the unit tests of this crate.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeDelta, TimeZone, Utc};
use mowerhub_domain::command::ParkCommand;
use mowerhub_domain::error::MowerError;
use mowerhub_domain::mode::{ParkReason, persisted_text};
use mowerhub_domain::notification::{NotificationEvent, NotificationKind};
use mowerhub_domain::time::Timestamp;

use crate::ports::{
    Clock, MowerActuator, NotificationChannel, NotificationHistory, OutgoingMessage,
    ParkReasonStore,
};

/// 2023-08-03 at the given UTC time.
pub fn at(h: u32, m: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2023, 8, 3, h, m, 0).unwrap()
}

// ── Clock ──────────────────────────────────────────────────────

pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn starting_at(now: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().unwrap() += by;
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }
}

/// Wall clock following tokio's time, so paused-time tests move it too.
pub struct TokioClock {
    base: Timestamp,
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn starting_at(base: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            base,
            origin: tokio::time::Instant::now(),
        })
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        self.base + TimeDelta::from_std(self.origin.elapsed()).unwrap()
    }
}

// ── Actuator ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorCall {
    Park(ParkCommand),
    Resume,
}

#[derive(Default)]
pub struct ScriptedActuator {
    pub calls: Mutex<Vec<ActuatorCall>>,
    failures_left: AtomicUsize,
    hang: AtomicBool,
}

impl ScriptedActuator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `count` commands fail.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Make every command hang until cancelled.
    pub fn hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn run(&self, call: ActuatorCall) -> Result<(), MowerError> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let command = match call {
            ActuatorCall::Park(_) => "park",
            ActuatorCall::Resume => "resume",
        };
        self.calls.lock().unwrap().push(call);
        if failing {
            return Err(MowerError::ActuatorCommandFailed {
                command,
                source: None,
            });
        }
        Ok(())
    }
}

impl MowerActuator for ScriptedActuator {
    async fn request_park(&self, command: ParkCommand) -> Result<(), MowerError> {
        self.run(ActuatorCall::Park(command)).await
    }

    async fn request_resume(&self) -> Result<(), MowerError> {
        self.run(ActuatorCall::Resume).await
    }
}

// ── Park reason store ──────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    value: Mutex<Option<String>>,
    pub writes: Mutex<Vec<Option<ParkReason>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn with(raw: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(raw.map(str::to_string)),
            ..Self::default()
        })
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn raw(&self) -> Option<String> {
        self.value.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Option<ParkReason>> {
        self.writes.lock().unwrap().clone()
    }
}

impl ParkReasonStore for MemoryStore {
    fn read(&self) -> impl Future<Output = Result<Option<String>, MowerError>> + Send {
        let value = self.value.lock().unwrap().clone();
        async { Ok(value) }
    }

    fn write(
        &self,
        reason: Option<ParkReason>,
    ) -> impl Future<Output = Result<(), MowerError>> + Send {
        let result = if self.fail_writes.load(Ordering::SeqCst) {
            Err(MowerError::Storage("disk full".into()))
        } else {
            *self.value.lock().unwrap() = Some(persisted_text(reason).to_string());
            self.writes.lock().unwrap().push(reason);
            Ok(())
        };
        async { result }
    }
}

// ── Notifications ──────────────────────────────────────────────

#[derive(Default)]
pub struct SpyChannel {
    pub sent: Mutex<Vec<OutgoingMessage>>,
}

impl SpyChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl NotificationChannel for SpyChannel {
    fn send(
        &self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<(), MowerError>> + Send {
        self.sent.lock().unwrap().push(message.clone());
        async { Ok(()) }
    }
}

#[derive(Default)]
pub struct MemoryHistory {
    pub events: Mutex<Vec<NotificationEvent>>,
}

impl MemoryHistory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }
}

impl NotificationHistory for MemoryHistory {
    fn append(
        &self,
        event: NotificationEvent,
    ) -> impl Future<Output = Result<(), MowerError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }

    fn recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<NotificationEvent>, MowerError>> + Send {
        let events: Vec<_> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect();
        async { Ok(events) }
    }
}
