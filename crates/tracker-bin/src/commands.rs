//! Subcommand implementations.

use crate::providers::{ReplayGeolocation, SimulatedMotion};
use crate::settings::tracker_config;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracker_config_and_utils::{Config, Paths};
use tracker_storage::{FileStore, KeyValueStore};
use tracking_core::{
    Collaborators, Coordinate, LogSink, MotionSample, Notice, NoticeSink, PersistedPosition,
    PositionRecovery, SessionSnapshot, SessionState, Tracker,
};

/// How long to wait for the last background write before exiting.
const SAVE_SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TrackOptions {
    pub fixes: PathBuf,
    pub deny_permission: bool,
    pub pace_ms: u64,
    pub json: bool,
}

/// Prints notices for the user and logs them.
struct ConsoleSink;

impl NoticeSink for ConsoleSink {
    fn emit(&self, notice: Notice) {
        eprintln!("{}", notice.message());
        LogSink.emit(notice);
    }
}

pub async fn track(config: &Config, paths: &Paths, options: TrackOptions) -> anyhow::Result<()> {
    let tracker_config = tracker_config(config)?;
    let fixes = load_fixes(&options.fixes)?;
    info!(file = %options.fixes.display(), count = fixes.len(), "Loaded fixes");

    let replay = Arc::new(ReplayGeolocation::new(
        fixes,
        !options.deny_permission,
        Duration::from_millis(options.pace_ms),
    ));
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(paths.store_file()));

    let tracker = Tracker::spawn(
        tracker_config,
        Collaborators {
            geolocation: replay.clone(),
            motion: Arc::new(SimulatedMotion::new()),
            store: store.clone(),
            notices: Arc::new(ConsoleSink),
        },
    );

    let state = tracker.start().await?;
    if state == SessionState::Active {
        tokio::select! {
            _ = replay.finished() => {}
            _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        }
    }

    let snapshot = tracker.snapshot().await?;
    let motion = *tracker.motion().borrow();
    tracker.shutdown().await?;

    if let Some(last) = snapshot.last_accepted.as_ref() {
        let recovery = PositionRecovery::new(store);
        let expected = PersistedPosition::from(last);
        if let Err(observed) = wait_for_saved(&recovery, expected).await {
            warn!(
                expected = ?expected,
                stored = ?observed,
                "Last location was not saved before exit"
            );
        }
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot, motion);
    }
    Ok(())
}

pub async fn last_location(paths: &Paths) -> anyhow::Result<()> {
    let recovery = PositionRecovery::new(Arc::new(FileStore::new(paths.store_file())));
    match recovery.load_last_position().await {
        Some(position) => println!("{:.6}, {:.6}", position.latitude, position.longitude),
        None => println!("none"),
    }
    Ok(())
}

pub async fn clear(paths: &Paths) -> anyhow::Result<()> {
    let recovery = PositionRecovery::new(Arc::new(FileStore::new(paths.store_file())));
    recovery
        .clear_last_position()
        .await
        .context("failed to clear saved location")?;
    println!("{}", Notice::SavedLocationCleared.message());
    Ok(())
}

pub fn show_config(config: &Config, paths: &Paths, write: bool) -> anyhow::Result<()> {
    if write {
        config
            .save(paths)
            .with_context(|| format!("failed to write {}", paths.config_file().display()))?;
        info!(path = %paths.config_file().display(), "Configuration written");
    }
    println!("config file: {}", paths.config_file().display());
    println!("store file:  {}", paths.store_file().display());
    println!("log file:    {}", paths.log_file().display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn load_fixes(path: &Path) -> anyhow::Result<Vec<Coordinate>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid fix file {}", path.display()))
}

/// Waits for the store to hold `expected`. On timeout, returns the position
/// last seen in the store instead.
async fn wait_for_saved(
    recovery: &PositionRecovery,
    expected: PersistedPosition,
) -> Result<(), Option<PersistedPosition>> {
    let mut observed = None;
    let settle = async {
        loop {
            observed = recovery.load_last_position().await;
            if observed == Some(expected) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    };
    let settled = tokio::time::timeout(SAVE_SETTLE_TIMEOUT, settle).await.is_ok();
    if settled {
        Ok(())
    } else {
        Err(observed)
    }
}

fn print_snapshot(snapshot: &SessionSnapshot, motion: Option<MotionSample>) {
    println!("session:   {}", snapshot.session_id);
    println!("state:     {}", snapshot.state);
    println!("distance:  {:.1} m", snapshot.cumulative_distance_meters);
    println!(
        "fixes:     {} accepted, {} rejected",
        snapshot.fixes_accepted, snapshot.fixes_rejected
    );
    match snapshot.current_position {
        Some(position) => println!(
            "position:  {:.6}, {:.6}",
            position.latitude, position.longitude
        ),
        None => println!("position:  unknown"),
    }
    match snapshot.last_saved_location {
        Some(saved) => println!(
            "resumed:   {:.6}, {:.6} (saved by a previous run)",
            saved.latitude, saved.longitude
        ),
        None => println!("resumed:   nothing saved"),
    }
    match motion {
        Some(sample) => println!("motion:    {:.3} g", sample.magnitude()),
        None => println!("motion:    no samples"),
    }
}
