// ABOUTME: Environment-based configuration for the form coach runtime
// ABOUTME: Reads thresholds path, detection floors, delivery timing, retention and store settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use pierre_form_core::config::{ConfigError, ThresholdCatalog};
use pierre_form_core::constants::{feedback, landmarks, phase, sessions};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Default number of store retries after the first attempt
pub const DEFAULT_STORE_MAX_RETRIES: u32 = 3;
/// Default first backoff delay for store retries
pub const DEFAULT_STORE_INITIAL_BACKOFF_MS: u64 = 50;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Retry policy for the storage boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first failure
    pub max_retries: u32,
    /// Initial backoff delay in milliseconds, doubled per retry
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_STORE_MAX_RETRIES,
            initial_backoff_ms: DEFAULT_STORE_INITIAL_BACKOFF_MS,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based)
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor))
    }
}

/// Feedback delivery timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Minimum gap between spoken messages
    pub min_audio_interval_ms: u64,
    /// Audio older than this when it reaches the front of the queue is dropped
    pub max_audio_age_ms: u64,
    /// Bounded channel capacity between the pipeline and the dispatcher
    pub queue_capacity: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            min_audio_interval_ms: feedback::DEFAULT_MIN_AUDIO_INTERVAL_MS,
            max_audio_age_ms: feedback::DEFAULT_MAX_AUDIO_AGE_MS,
            queue_capacity: feedback::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Runtime configuration for the pipeline and session layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormCoachConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Optional YAML file overriding built-in threshold tables
    pub thresholds_file: Option<PathBuf>,
    /// Landmark visibility floor
    pub min_visibility: f64,
    /// Frames a phase candidate must hold before committing
    pub min_stable_frames: u32,
    /// Feedback delivery timing
    pub delivery: DeliveryConfig,
    /// Sessions retained per user and exercise
    pub retention_limit: usize,
    /// Directory for the JSON file store; in-memory when absent
    pub store_dir: Option<PathBuf>,
    /// Retry policy for store writes
    pub store_retry: RetryConfig,
}

impl Default for FormCoachConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            thresholds_file: None,
            min_visibility: landmarks::DEFAULT_MIN_VISIBILITY,
            min_stable_frames: phase::DEFAULT_MIN_STABLE_FRAMES,
            delivery: DeliveryConfig::default(),
            retention_limit: sessions::MAX_RETAINED_SESSIONS,
            store_dir: None,
            store_retry: RetryConfig::default(),
        }
    }
}

impl FormCoachConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is present but unparsable or out of range
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            thresholds_file: env::var("FORM_COACH_THRESHOLDS_FILE").ok().map(PathBuf::from),
            min_visibility: parse_env("FORM_COACH_MIN_VISIBILITY", defaults.min_visibility)?,
            min_stable_frames: parse_env(
                "FORM_COACH_MIN_STABLE_FRAMES",
                defaults.min_stable_frames,
            )?,
            delivery: DeliveryConfig {
                min_audio_interval_ms: parse_env(
                    "FORM_COACH_AUDIO_INTERVAL_MS",
                    defaults.delivery.min_audio_interval_ms,
                )?,
                max_audio_age_ms: parse_env(
                    "FORM_COACH_AUDIO_MAX_AGE_MS",
                    defaults.delivery.max_audio_age_ms,
                )?,
                queue_capacity: parse_env(
                    "FORM_COACH_FEEDBACK_QUEUE_CAPACITY",
                    defaults.delivery.queue_capacity,
                )?,
            },
            retention_limit: parse_env("FORM_COACH_RETENTION_LIMIT", defaults.retention_limit)?,
            store_dir: env::var("FORM_COACH_STORE_DIR").ok().map(PathBuf::from),
            store_retry: RetryConfig {
                max_retries: parse_env(
                    "FORM_COACH_STORE_MAX_RETRIES",
                    defaults.store_retry.max_retries,
                )?,
                initial_backoff_ms: parse_env(
                    "FORM_COACH_STORE_BACKOFF_MS",
                    defaults.store_retry.initial_backoff_ms,
                )?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValueOutOfRange` naming the offending setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(ConfigError::ValueOutOfRange(
                "min_visibility must be within [0, 1]",
            ));
        }
        if self.min_stable_frames == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "min_stable_frames must be at least 1",
            ));
        }
        if self.delivery.queue_capacity == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "feedback queue capacity must be at least 1",
            ));
        }
        if self.retention_limit == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "retention_limit must be at least 1",
            ));
        }
        Ok(())
    }

    /// Built-in threshold tables, overlaid with the configured YAML file if any
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the file cannot be read, parsed or validated
    pub fn load_catalog(&self) -> Result<ThresholdCatalog, ConfigError> {
        self.thresholds_file.as_ref().map_or_else(
            || Ok(ThresholdCatalog::builtin()),
            ThresholdCatalog::from_yaml_file,
        )
    }

    /// Log a configuration summary
    pub fn log_summary(&self) {
        info!(
            environment = %self.environment,
            thresholds_file = ?self.thresholds_file,
            min_visibility = self.min_visibility,
            min_stable_frames = self.min_stable_frames,
            audio_interval_ms = self.delivery.min_audio_interval_ms,
            audio_max_age_ms = self.delivery.max_audio_age_ms,
            retention_limit = self.retention_limit,
            store_dir = ?self.store_dir,
            "Form coach configuration loaded"
        );
    }
}

/// Environment variable or a default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::Parse(format!("{key}: {e}"))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(ConfigError::EnvVar(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let retry = RetryConfig {
            max_retries: 3,
            initial_backoff_ms: 100,
        };
        assert_eq!(retry.backoff(1), Duration::from_millis(100));
        assert_eq!(retry.backoff(2), Duration::from_millis(200));
        assert_eq!(retry.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str_or_default("PROD"), Environment::Production);
        assert_eq!(Environment::from_str_or_default("test"), Environment::Testing);
        assert_eq!(Environment::from_str_or_default("???"), Environment::Development);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = FormCoachConfig::default();
        config.delivery.queue_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange(_))
        ));
    }
}
