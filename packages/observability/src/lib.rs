//! # Observability
//!
//! Centralized tracing setup for the distance tracker workspace.
//!
//! Library crates only use `tracing` macros. Binaries call
//! [`init_with_config`] once at startup and decide where the events end up.
//!
//! ## Dev Mode
//!
//! With the `dev` feature (on by default) every event is written as one JSON
//! line to `~/.distance-tracker/logs/dev.jsonl`:
//!
//! - `tail -f ~/.distance-tracker/logs/dev.jsonl | jq` for pretty JSON
//! - `jq 'select(.fields.session_id == "...")'` to follow one tracking session
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "distance-tracker".into(),
//!     ..Default::default()
//! });
//! tracing::info!("service started");
//! ```

#[cfg(feature = "dev")]
mod dev;

#[cfg(feature = "dev")]
mod json_layer;

use std::path::PathBuf;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "distance-tracker").
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.distance-tracker/logs/dev.jsonl` in dev mode.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize the observability layer with custom configuration.
///
/// A second call in the same process is ignored; the first subscriber wins.
///
/// ```rust,ignore
/// observability::init_with_config(observability::LogConfig {
///     service_name: "distance-tracker".into(),
///     default_level: "debug".into(),
///     also_stderr: true,
///     ..Default::default()
/// });
/// ```
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    {
        dev::init_dev_subscriber(&config);
    }

    #[cfg(not(feature = "dev"))]
    {
        use tracing_subscriber::util::SubscriberInitExt;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(&config.default_level))
            .with_target(true)
            .compact()
            .finish()
            .try_init();
    }
}

/// Build the level filter from `RUST_LOG`, falling back to `default_level`.
pub(crate) fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}
