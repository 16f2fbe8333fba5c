//! Core configuration, paths, and utilities for the distance tracker.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, ACCURACY_TIERS, DEFAULT_ACCURACY, DEFAULT_LOG_LEVEL, DEFAULT_MIN_DISPLACEMENT_METERS,
    DEFAULT_MIN_INTERVAL_MS, DEFAULT_MOTION_INTERVAL_MS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
