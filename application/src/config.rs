//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service configuration.
    pub service: Service,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Service configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    /// Path to the JSON file with the initial settings, keyed by setting key.
    pub settings_seed: Option<String>,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            settings_seed: _,
            tasks: Tasks { daily_summary },
        } = value;
        Self {
            daily_summary: service::task::daily_summary::Config {
                interval: daily_summary.interval,
            },
        }
    }
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Tasks {
    /// `DailySummary` task configuration.
    pub daily_summary: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 60 * 24))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::{env, fs, process, time::Duration};

    use super::{Config, LogLevel};

    #[test]
    fn falls_back_to_defaults() {
        let config = Config::new("absent-config-file").unwrap();

        assert_eq!(config.log.level, LogLevel::Info);
        assert_eq!(config.service.settings_seed, None);
        assert_eq!(
            config.service.tasks.daily_summary.interval,
            Duration::from_secs(86_400),
        );
    }

    #[test]
    fn fills_absent_sections_with_defaults() {
        let path = env::temp_dir()
            .join(format!("config-{}-log-only.toml", process::id()));
        fs::write(&path, "[log]\nlevel = \"DEBUG\"\n").unwrap();

        let config = Config::new(path.to_str().unwrap()).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(
            config.service.tasks.daily_summary.interval,
            Duration::from_secs(86_400),
        );
    }

    #[test]
    fn converts_into_service_config() {
        let mut config = Config::default();
        config.service.tasks.daily_summary.interval = Duration::from_secs(90);

        let service: service::Config = config.service.into();

        assert_eq!(service.daily_summary.interval, Duration::from_secs(90));
    }
}
