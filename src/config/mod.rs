use std::env;
use std::fmt;

use crate::workflows::grants::applications::{ExpirationType, ReminderSchedule};
use crate::workflows::grants::locale::Locale;

const DEFAULT_EXPIRY_MONTHS: u32 = 3;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub applications: ApplicationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let default_locale = Locale::from_code(
            &env::var("APP_DEFAULT_LOCALE").unwrap_or_else(|_| "en".to_string()),
        );

        let expiry_months = match env::var("APPLICATION_EXPIRY_MONTHS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidNumber {
                    key: "APPLICATION_EXPIRY_MONTHS",
                })?,
            Err(_) => DEFAULT_EXPIRY_MONTHS,
        };

        let reminders = match env::var("APPLICATION_REMINDER_DAYS") {
            Ok(raw) => parse_reminder_days(&raw)?,
            Err(_) => ReminderSchedule::default(),
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            applications: ApplicationConfig {
                default_locale,
                expiry_months,
                reminders,
            },
        })
    }
}

/// Settings for the pending application lifecycle.
#[derive(Debug, Clone)]
pub struct ApplicationConfig {
    pub default_locale: Locale,
    pub expiry_months: u32,
    pub reminders: ReminderSchedule,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::En,
            expiry_months: DEFAULT_EXPIRY_MONTHS,
            reminders: ReminderSchedule::default(),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn parse_reminder_days(raw: &str) -> Result<ReminderSchedule, ConfigError> {
    let days = raw
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::InvalidReminderSchedule(raw.to_string()))?;

    match days.as_slice() {
        [month, week, day] if month > week && week > day => Ok(ReminderSchedule::new(vec![
            (ExpirationType::MonthBefore, *month),
            (ExpirationType::WeekBefore, *week),
            (ExpirationType::DayBefore, *day),
        ])),
        _ => Err(ConfigError::InvalidReminderSchedule(raw.to_string())),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str },
    InvalidReminderSchedule(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key } => {
                write!(f, "{} must be a non-negative whole number", key)
            }
            ConfigError::InvalidReminderSchedule(raw) => write!(
                f,
                "APPLICATION_REMINDER_DAYS must list three descending day offsets, got '{}'",
                raw
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_DEFAULT_LOCALE");
        env::remove_var("APPLICATION_EXPIRY_MONTHS");
        env::remove_var("APPLICATION_REMINDER_DAYS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.applications.default_locale, Locale::En);
        assert_eq!(config.applications.expiry_months, 3);
        assert_eq!(
            config.applications.reminders.days_for(ExpirationType::WeekBefore),
            Some(7)
        );
    }

    #[test]
    fn reads_welsh_locale_and_custom_reminders() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DEFAULT_LOCALE", "cy");
        env::set_var("APPLICATION_REMINDER_DAYS", "28, 10, 2");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.applications.default_locale, Locale::Cy);
        assert_eq!(
            config.applications.reminders.days_for(ExpirationType::MonthBefore),
            Some(28)
        );
        assert_eq!(
            config.applications.reminders.days_for(ExpirationType::DayBefore),
            Some(2)
        );
        reset_env();
    }

    #[test]
    fn rejects_unordered_reminder_days() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APPLICATION_REMINDER_DAYS", "1,7,30");
        let err = AppConfig::load().expect_err("ascending schedule rejected");
        assert!(matches!(err, ConfigError::InvalidReminderSchedule(_)));
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_expiry() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APPLICATION_EXPIRY_MONTHS", "three");
        let err = AppConfig::load().expect_err("invalid months rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                key: "APPLICATION_EXPIRY_MONTHS"
            }
        ));
        reset_env();
    }
}
