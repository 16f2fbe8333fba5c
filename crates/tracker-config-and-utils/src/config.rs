//! Configuration management for the tracker.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default minimum time between delivered fixes.
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 1_000;

/// Default minimum displacement between delivered fixes.
pub const DEFAULT_MIN_DISPLACEMENT_METERS: f64 = 1.0;

/// Default motion sampling period.
pub const DEFAULT_MOTION_INTERVAL_MS: u64 = 500;

/// Default accuracy tier requested from the geolocation provider.
pub const DEFAULT_ACCURACY: &str = "high";

/// Accuracy tiers a provider understands, lowest to highest power cost.
pub const ACCURACY_TIERS: &[&str] = &[
    "lowest",
    "low",
    "balanced",
    "high",
    "highest",
    "best_for_navigation",
];

/// Main tracker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accuracy tier requested from the geolocation provider, one of
    /// [`ACCURACY_TIERS`].
    #[serde(default = "default_accuracy")]
    pub accuracy: String,
    /// Provider-side debounce: minimum milliseconds between fixes.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Provider-side debounce: minimum meters between fixes.
    #[serde(default = "default_min_displacement_meters")]
    pub min_displacement_meters: f64,
    /// Motion sensor sampling period in milliseconds.
    #[serde(default = "default_motion_interval_ms")]
    pub motion_interval_ms: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_accuracy() -> String {
    DEFAULT_ACCURACY.to_string()
}

fn default_min_interval_ms() -> u64 {
    DEFAULT_MIN_INTERVAL_MS
}

fn default_min_displacement_meters() -> f64 {
    DEFAULT_MIN_DISPLACEMENT_METERS
}

fn default_motion_interval_ms() -> u64 {
    DEFAULT_MOTION_INTERVAL_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            accuracy: DEFAULT_ACCURACY.to_string(),
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            min_displacement_meters: DEFAULT_MIN_DISPLACEMENT_METERS,
            motion_interval_ms: DEFAULT_MOTION_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides and validate.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Reject values the providers cannot honour.
    pub fn validate(&self) -> CoreResult<()> {
        if !ACCURACY_TIERS.contains(&self.accuracy.as_str()) {
            return Err(CoreError::Config(format!(
                "unknown accuracy tier {:?}, expected one of {}",
                self.accuracy,
                ACCURACY_TIERS.join(", ")
            )));
        }
        if !self.min_displacement_meters.is_finite() || self.min_displacement_meters < 0.0 {
            return Err(CoreError::Config(format!(
                "min_displacement_meters must be a non-negative number, got {}",
                self.min_displacement_meters
            )));
        }
        if self.motion_interval_ms == 0 {
            return Err(CoreError::Config(
                "motion_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(log_level) = lookup("TRACKER_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Some(accuracy) = lookup("TRACKER_ACCURACY") {
            self.accuracy = accuracy.trim().to_lowercase();
        }
        if let Some(ms) = lookup("TRACKER_MIN_INTERVAL_MS").and_then(|v| v.trim().parse().ok()) {
            self.min_interval_ms = ms;
        }
        if let Some(meters) =
            lookup("TRACKER_MIN_DISPLACEMENT_M").and_then(|v| v.trim().parse().ok())
        {
            self.min_displacement_meters = meters;
        }
    }
}
