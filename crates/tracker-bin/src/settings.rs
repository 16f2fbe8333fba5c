//! Turns the on-disk configuration into tracking-core options.

use anyhow::Context;
use std::time::Duration;
use tracker_config_and_utils::Config;
use tracking_core::{AccuracyTier, TrackerConfig, WatchConfig};

pub fn tracker_config(config: &Config) -> anyhow::Result<TrackerConfig> {
    Ok(TrackerConfig {
        watch: watch_config(config)?,
        motion_interval: Duration::from_millis(config.motion_interval_ms),
    })
}

fn watch_config(config: &Config) -> anyhow::Result<WatchConfig> {
    let accuracy: AccuracyTier =
        serde_json::from_value(serde_json::Value::String(config.accuracy.clone()))
            .with_context(|| format!("unsupported accuracy tier {:?}", config.accuracy))?;

    Ok(WatchConfig {
        accuracy,
        min_interval_ms: config.min_interval_ms,
        min_displacement_meters: config.min_displacement_meters,
    })
}
