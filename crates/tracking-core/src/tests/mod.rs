//! Scenario tests for the tracker.
//!
//! - `lifecycle.rs`    - permission flow, start/stop/retry, handle release
//! - `accumulation.rs` - distance accumulation through the session
//! - `recovery.rs`     - saved location load, write, clear, store failures
//! - `stale_events.rs` - in-flight fixes and samples from released subscriptions

mod accumulation;
mod support;

use support::Harness;

/// Basic workflow test demonstrating core functionality.
#[tokio::test]
async fn basic_workflow() {
    let harness = Harness::new();

    let state = harness.tracker.start().await.unwrap();
    assert_eq!(state, crate::SessionState::Active);

    harness.geo.emit(0.0, 0.0);
    harness.geo.emit(0.0, 0.001);

    let snapshot = harness.tracker.snapshot().await.unwrap();
    assert!((snapshot.cumulative_distance_meters - 111.19).abs() < 0.05);

    harness.tracker.stop().await.unwrap();
    assert_eq!(harness.geo.live_subscriptions(), 0);
}
