//! Notifications — append-only records of mode transitions and their
//! user-facing text.

use serde::{Deserialize, Serialize};

use crate::id::NotificationId;
use crate::session::Session;
use crate::time::Timestamp;

/// What a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Start,
    ParkRain,
    ParkCommand,
    ParkBoundary,
    Resume,
    /// Automatic actuator control gave up after repeated failures.
    Degraded,
    /// The park reason could not be persisted.
    PersistenceWarning,
    /// Lawn is dry but the sun is still rising.
    WaitingForNoon,
    /// Lawn is dry but the sun is below the horizon.
    WaitingForTomorrow,
    /// The sun passed its top while the lawn is still wet.
    StillWet,
    /// Resume requested before any usable rain reading.
    ResumePending,
}

impl NotificationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ParkRain => "park_rain",
            Self::ParkCommand => "park_command",
            Self::ParkBoundary => "park_boundary",
            Self::Resume => "resume",
            Self::Degraded => "degraded",
            Self::PersistenceWarning => "persistence_warning",
            Self::WaitingForNoon => "waiting_for_noon",
            Self::WaitingForTomorrow => "waiting_for_tomorrow",
            Self::StillWet => "still_wet",
            Self::ResumePending => "resume_pending",
        }
    }

    /// Routine notifications are delivered without sound.
    #[must_use]
    pub fn is_silent(self) -> bool {
        matches!(
            self,
            Self::Start
                | Self::Resume
                | Self::ParkBoundary
                | Self::WaitingForNoon
                | Self::WaitingForTomorrow
                | Self::StillWet
                | Self::ResumePending
        )
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable notification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: NotificationId,
    pub at: Timestamp,
    pub kind: NotificationKind,
    pub message: String,
    pub silent: bool,
    /// Session opened or closed by the transition, if any.
    pub session: Option<Session>,
}

impl NotificationEvent {
    #[must_use]
    pub fn new(kind: NotificationKind, message: impl Into<String>, at: Timestamp) -> Self {
        Self {
            id: NotificationId::new(),
            at,
            kind,
            message: message.into(),
            silent: kind.is_silent(),
            session: None,
        }
    }

    #[must_use]
    pub fn with_session(mut self, session: Option<Session>) -> Self {
        self.session = session;
        self
    }
}

/// User-facing message texts, one per notification kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub title: String,
    pub start: String,
    pub park_rain: String,
    pub park_command: String,
    pub park_boundary: String,
    pub resume: String,
    pub degraded: String,
    pub persistence_warning: String,
    pub waiting_for_noon: String,
    pub waiting_for_tomorrow: String,
    pub still_wet: String,
    pub resume_pending: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            title: "Mower".to_string(),
            start: "Advanced automation is activated, mowing.".to_string(),
            park_rain: "It starts raining, park until rain stops and lawn dries.".to_string(),
            park_command: "Advanced automation is deactivated.".to_string(),
            park_boundary: "End of session is too close, stay parked until next hour."
                .to_string(),
            resume: "No rain during last hours. Lawn should be dry now.".to_string(),
            degraded: "Mower does not answer commands. Automatic control is suspended."
                .to_string(),
            persistence_warning:
                "Park reason could not be saved. It may be lost after a restart.".to_string(),
            waiting_for_noon: "No rain during last hours, waiting for noon to restart.".to_string(),
            waiting_for_tomorrow:
                "No rain during last hours, sun is below horizon, waiting for tomorrow noon to restart."
                    .to_string(),
            still_wet: "Lawn shouldn't be dry yet. Staying parked.".to_string(),
            resume_pending: "Resume requested, waiting for a rain reading before mowing."
                .to_string(),
        }
    }
}

impl MessageTemplates {
    #[must_use]
    pub fn text_for(&self, kind: NotificationKind) -> &str {
        match kind {
            NotificationKind::Start => &self.start,
            NotificationKind::ParkRain => &self.park_rain,
            NotificationKind::ParkCommand => &self.park_command,
            NotificationKind::ParkBoundary => &self.park_boundary,
            NotificationKind::Resume => &self.resume,
            NotificationKind::Degraded => &self.degraded,
            NotificationKind::PersistenceWarning => &self.persistence_warning,
            NotificationKind::WaitingForNoon => &self.waiting_for_noon,
            NotificationKind::WaitingForTomorrow => &self.waiting_for_tomorrow,
            NotificationKind::StillWet => &self.still_wet,
            NotificationKind::ResumePending => &self.resume_pending,
        }
    }

    /// Render the message for a transition; a freshly opened session with a
    /// forced end mentions when it will stop.
    #[must_use]
    pub fn render(&self, kind: NotificationKind, session: Option<&Session>) -> String {
        let text = self.text_for(kind);
        let opens = matches!(kind, NotificationKind::Start | NotificationKind::Resume);
        match session.and_then(|s| s.planned_end_at) {
            Some(end) if opens => format!("{text} Session ends at {}.", end.format("%H:%M")),
            _ => text.to_string(),
        }
    }
}
