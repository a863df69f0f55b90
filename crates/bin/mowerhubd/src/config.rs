//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `mowerhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;

use mowerhub_app::controller::ControllerConfig;
use mowerhub_app::dispatch::{DispatchTable, InputKind};
use mowerhub_domain::notification::MessageTemplates;
use mowerhub_domain::rain::DrynessConfig;
use mowerhub_domain::session::BoundaryConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    /// Entity ids routed to the controller.
    pub entities: EntitiesConfig,
    pub rain: RainConfig,
    pub session: SessionConfig,
    pub controller: ControllerSettings,
    pub notifications: NotificationsConfig,
    /// Message texts, one per notification kind.
    pub messages: MessageTemplates,
    /// Virtual mower settings.
    pub mower: MowerConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EntitiesConfig {
    /// Rain accumulation sensor, in millimetres.
    pub rain_sensor: String,
    /// Entity carrying manual park / resume commands.
    pub command: String,
    /// Sun phase (`rising`, `setting`, `below_horizon`).
    pub sun: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RainConfig {
    pub dry_debounce_minutes: u32,
    pub threshold_mm: f64,
    pub observation_window_minutes: u32,
    /// Park duration sent to the mower when parking for rain.
    pub park_duration_minutes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub estimated_minutes: u32,
    pub safety_margin_minutes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub tick_interval_secs: u64,
    pub command_timeout_secs: u64,
    pub retry_backoff_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub delivery_timeout_secs: u64,
    /// Deliver every message silently, as when somebody is home.
    pub home_occupied: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MowerConfig {
    /// Simulated command latency.
    pub latency_ms: u64,
}

impl Config {
    /// Load configuration from `mowerhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("mowerhub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MOWERHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("MOWERHUB_RAIN_SENSOR") {
            self.entities.rain_sensor = val;
        }
        if let Ok(val) = std::env::var("MOWERHUB_COMMAND_ENTITY") {
            self.entities.command = val;
        }
        if let Ok(val) = std::env::var("MOWERHUB_SUN_ENTITY") {
            self.entities.sun = val;
        }
        if let Ok(val) = std::env::var("MOWERHUB_TICK_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                self.controller.tick_interval_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("MOWERHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        let e = &self.entities;
        if e.rain_sensor.is_empty() || e.command.is_empty() || e.sun.is_empty() {
            return invalid("entity ids must not be empty");
        }
        if e.rain_sensor == e.command || e.rain_sensor == e.sun || e.command == e.sun {
            return invalid("rain sensor, command and sun entities must differ");
        }
        if !self.rain.threshold_mm.is_finite() || self.rain.threshold_mm <= 0.0 {
            return invalid("rain threshold must be a positive number");
        }
        if self.rain.dry_debounce_minutes == 0 {
            return invalid("dry debounce must be non-zero");
        }
        if self.session.estimated_minutes == 0 {
            return invalid("estimated session duration must be non-zero");
        }
        if self.session.safety_margin_minutes >= 60 {
            return invalid("safety margin must be shorter than an hour");
        }
        let c = &self.controller;
        if c.tick_interval_secs == 0 || c.command_timeout_secs == 0 || c.retry_backoff_secs == 0 {
            return invalid("controller intervals must be non-zero");
        }
        if self.notifications.delivery_timeout_secs == 0 {
            return invalid("delivery timeout must be non-zero");
        }
        Ok(())
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Routing of the configured entities to controller inputs.
    #[must_use]
    pub fn dispatch_table(&self) -> DispatchTable {
        DispatchTable::new()
            .route(&self.entities.rain_sensor, InputKind::RainAccumulation)
            .route(&self.entities.command, InputKind::ManualCommand)
            .route(&self.entities.sun, InputKind::Sun)
    }

    #[must_use]
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            dryness: DrynessConfig {
                dry_debounce: minutes(self.rain.dry_debounce_minutes),
                rain_threshold: self.rain.threshold_mm,
                observation_window: minutes(self.rain.observation_window_minutes),
            },
            boundary: BoundaryConfig {
                estimated_session: minutes(self.session.estimated_minutes),
                safety_margin: minutes(self.session.safety_margin_minutes),
            },
            command_timeout: Duration::from_secs(self.controller.command_timeout_secs),
            retry_backoff: Duration::from_secs(self.controller.retry_backoff_secs),
            rain_park_duration: (self.rain.park_duration_minutes > 0)
                .then(|| minutes(self.rain.park_duration_minutes)),
        }
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.controller.tick_interval_secs)
    }

    #[must_use]
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.notifications.delivery_timeout_secs)
    }

    #[must_use]
    pub fn mower_latency(&self) -> Duration {
        Duration::from_millis(self.mower.latency_ms)
    }
}

fn minutes(value: u32) -> TimeDelta {
    TimeDelta::minutes(i64::from(value))
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:mowerhub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "mowerhubd=info,mowerhub_app=info,mowerhub_adapter_virtual=info".to_string(),
        }
    }
}

impl Default for EntitiesConfig {
    fn default() -> Self {
        Self {
            rain_sensor: "sensor.rain_last_6h".to_string(),
            command: "sensor.mower_problem".to_string(),
            sun: "sun.sun".to_string(),
        }
    }
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            dry_debounce_minutes: 360,
            threshold_mm: 0.1,
            observation_window_minutes: 30,
            park_duration_minutes: 60_480,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            estimated_minutes: 45,
            safety_margin_minutes: 5,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            command_timeout_secs: 30,
            retry_backoff_secs: 60,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            delivery_timeout_secs: 10,
            home_occupied: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
