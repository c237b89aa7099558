//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable overriding [`ApiConfig::base_url`].
pub const ENV_API_URL: &str = "SPRING_IO_API_URL";

/// Environment variable overriding [`CalendarConfig::base_url`].
pub const ENV_CALENDAR_URL: &str = "SPRING_IO_CALENDAR_URL";

/// Environment variable overriding [`CalendarConfig::window_days`].
pub const ENV_CALENDAR_WINDOW_DAYS: &str = "SPRING_IO_CALENDAR_WINDOW_DAYS";

/// Largest accepted upcoming-release window, in days.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Largest accepted request timeout, in seconds.
const MAX_TIMEOUT_SECS: u64 = 300;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Project metadata API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Release calendar settings.
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.base_url()?;
        self.calendar.base_url()?;

        if self.api.timeout_secs == 0 || self.api.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "api.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}, got {}",
                    self.api.timeout_secs
                ),
            });
        }

        if self.calendar.window_days == 0 || self.calendar.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "calendar.window_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                    self.calendar.window_days
                ),
            });
        }

        Ok(())
    }

    /// Applies environment variable overrides on top of the file settings.
    ///
    /// `lookup` returns the value of a variable, if set. Production code passes
    /// a wrapper around [`std::env::var`].
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric override does not parse.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(url) = lookup(ENV_CALENDAR_URL) {
            self.calendar.base_url = url;
        }
        if let Some(days) = lookup(ENV_CALENDAR_WINDOW_DAYS) {
            self.calendar.window_days =
                days.trim()
                    .parse::<u32>()
                    .map_err(|e| ConfigError::EnvOverride {
                        variable: ENV_CALENDAR_WINDOW_DAYS,
                        message: e.to_string(),
                    })?;
        }
        Ok(())
    }
}

/// Settings for the project metadata API (releases and generations).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the projects API.
    /// Default: `https://api.spring.io`
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Per-request timeout in seconds, applied to both upstreams.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Parses the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or not http(s).
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        parse_base_url("api.base_url", &self.base_url)
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.spring.io".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

/// Settings for the release calendar.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarConfig {
    /// Base URL of the calendar API.
    /// Default: `https://calendar.spring.io`
    #[serde(default = "default_calendar_url")]
    pub base_url: String,

    /// Default lookahead window for upcoming releases, in days.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

impl CalendarConfig {
    /// Parses the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or not http(s).
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        parse_base_url("calendar.base_url", &self.base_url)
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            base_url: default_calendar_url(),
            window_days: default_window_days(),
        }
    }
}

fn default_calendar_url() -> String {
    "https://calendar.spring.io".to_string()
}

const fn default_window_days() -> u32 {
    90
}

fn parse_base_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::ValidationError {
        message: format!("{field} '{value}' is not a valid URL: {e}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::ValidationError {
            message: format!("{field} '{value}' must be an http or https URL"),
        });
    }

    Ok(url)
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
