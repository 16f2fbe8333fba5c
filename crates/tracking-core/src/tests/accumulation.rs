//! Distance accumulation through a live session.

use super::support::{assert_close, Harness, ManualMotion, ScriptedGeolocation};
use crate::geodesic::haversine_meters;
use crate::notice::Notice;
use crate::provider::ProviderError;
use crate::types::{Coordinate, SessionState};
use std::sync::Arc;
use tracker_storage::MemoryStore;

#[tokio::test]
async fn three_fixes_along_the_equator() {
    let harness = Harness::new();
    harness.tracker.start().await.unwrap();

    harness.geo.emit(0.0, 0.0);
    harness.geo.emit(0.0, 0.001);
    harness.geo.emit(0.0, 0.002);

    let snapshot = harness.tracker.snapshot().await.unwrap();
    assert_close(snapshot.cumulative_distance_meters, 222.39, 0.1);
    assert_eq!(snapshot.fixes_accepted, 3);
    assert_eq!(snapshot.last_accepted.map(|c| c.longitude), Some(0.002));
    assert_eq!(snapshot.current_position.map(|c| c.longitude), Some(0.002));
}

#[tokio::test]
async fn single_fix_adds_nothing() {
    let harness = Harness::new();
    harness.tracker.start().await.unwrap();

    harness.geo.emit(51.5, -0.12);

    let snapshot = harness.tracker.snapshot().await.unwrap();
    assert_eq!(snapshot.cumulative_distance_meters, 0.0);
    assert_eq!(snapshot.last_accepted.map(|c| c.latitude), Some(51.5));
}

#[tokio::test]
async fn initial_one_shot_fix_is_not_a_baseline() {
    let geo = ScriptedGeolocation::new();
    geo.set_initial_fix(Ok(Coordinate::new(5.0, 5.0)));
    let harness = Harness::build(Arc::new(MemoryStore::new()), geo, ManualMotion::new());
    harness.tracker.start().await.unwrap();

    harness.geo.emit(0.0, 0.0);

    let snapshot = harness.tracker.snapshot().await.unwrap();
    assert_eq!(snapshot.cumulative_distance_meters, 0.0);
}

#[tokio::test]
async fn invalid_fix_is_counted_and_ignored() {
    let harness = Harness::new();
    harness.tracker.start().await.unwrap();

    harness.geo.emit(0.0, 0.0);
    harness.geo.emit(0.0, 0.001);
    harness.geo.emit(91.0, 0.0);
    harness.geo.emit(f64::NAN, 0.0);

    let snapshot = harness.tracker.snapshot().await.unwrap();
    assert_close(snapshot.cumulative_distance_meters, 111.19, 0.05);
    assert_eq!(snapshot.fixes_accepted, 2);
    assert_eq!(snapshot.fixes_rejected, 2);
    assert_eq!(snapshot.last_accepted.map(|c| c.longitude), Some(0.001));
}

#[tokio::test]
async fn stream_error_notifies_and_keeps_running() {
    let harness = Harness::new();
    harness.tracker.start().await.unwrap();

    harness.geo.emit(0.0, 0.0);
    harness.geo.emit_error(ProviderError::Timeout);
    harness.geo.emit(0.0, 0.001);

    let snapshot = harness.tracker.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Active);
    assert_close(snapshot.cumulative_distance_meters, 111.19, 0.05);
    assert_eq!(
        harness.notices.notices(),
        vec![Notice::FixAcquisitionFailed {
            reason: "provider timed out".to_string()
        }]
    );
}

#[tokio::test]
async fn retry_starts_from_zero() {
    let harness = Harness::new();
    harness.tracker.start().await.unwrap();
    harness.geo.emit(0.0, 0.0);
    harness.geo.emit(0.0, 0.01);

    harness.tracker.retry().await.unwrap();

    let reset = harness.tracker.snapshot().await.unwrap();
    assert_eq!(reset.cumulative_distance_meters, 0.0);
    assert!(reset.last_accepted.is_none());
    assert_eq!(reset.fixes_accepted, 0);

    // The first fix after retry is a fresh baseline, not a jump from (0, 0.01).
    harness.geo.emit(10.0, 10.0);
    harness.geo.emit(10.0, 10.001);

    let snapshot = harness.tracker.snapshot().await.unwrap();
    assert_close(
        snapshot.cumulative_distance_meters,
        haversine_meters(10.0, 10.0, 10.0, 10.001),
        1e-6,
    );
}

#[tokio::test]
async fn denied_retry_then_granted_retry_stays_at_zero() {
    let harness = Harness::new();
    harness.tracker.start().await.unwrap();
    harness.geo.emit(0.0, 0.0);
    harness.geo.emit(0.0, 0.01);
    assert!(harness.tracker.snapshot().await.unwrap().cumulative_distance_meters > 0.0);

    harness.geo.deny_next();
    assert_eq!(harness.tracker.retry().await.unwrap(), SessionState::Denied);
    let denied = harness.tracker.snapshot().await.unwrap();
    assert_eq!(denied.cumulative_distance_meters, 0.0);
    assert!(denied.last_accepted.is_none());

    assert_eq!(harness.tracker.retry().await.unwrap(), SessionState::Active);
    let active = harness.tracker.snapshot().await.unwrap();
    assert_eq!(active.cumulative_distance_meters, 0.0);
    assert!(active.last_accepted.is_none());
}

#[tokio::test]
async fn total_equals_sum_of_consecutive_legs() {
    let route = [
        (48.8566, 2.3522),
        (48.8570, 2.3530),
        (48.8581, 2.3547),
        (48.8590, 2.3551),
        (48.8602, 2.3570),
        (48.8611, 2.3588),
    ];
    let harness = Harness::new();
    harness.tracker.start().await.unwrap();
    for &(latitude, longitude) in &route {
        harness.geo.emit(latitude, longitude);
    }

    let expected: f64 = route
        .windows(2)
        .map(|leg| haversine_meters(leg[0].0, leg[0].1, leg[1].0, leg[1].1))
        .sum();
    let snapshot = harness.tracker.snapshot().await.unwrap();
    assert_close(snapshot.cumulative_distance_meters, expected, 1e-9);
    assert_eq!(snapshot.fixes_accepted, route.len() as u64);
}

#[tokio::test]
async fn stop_and_start_does_not_bridge_the_gap() {
    let harness = Harness::new();
    harness.tracker.start().await.unwrap();
    harness.geo.emit(0.0, 0.0);
    harness.geo.emit(0.0, 0.001);
    let before = harness.tracker.snapshot().await.unwrap().cumulative_distance_meters;

    harness.tracker.stop().await.unwrap();
    harness.tracker.start().await.unwrap();

    harness.geo.emit(20.0, 20.0);
    let after_baseline = harness.tracker.snapshot().await.unwrap();
    assert_eq!(after_baseline.cumulative_distance_meters, before);

    harness.geo.emit(20.001, 20.0);
    let snapshot = harness.tracker.snapshot().await.unwrap();
    assert_close(
        snapshot.cumulative_distance_meters,
        before + haversine_meters(20.0, 20.0, 20.001, 20.0),
        1e-6,
    );
}

#[tokio::test]
async fn distance_never_decreases_while_active() {
    let harness = Harness::new();
    harness.tracker.start().await.unwrap();

    let path = [(0.0, 0.0), (0.01, 0.0), (0.0, 0.0), (95.0, 0.0), (0.0, 0.0), (-0.01, 0.02)];
    let mut last = 0.0;
    for (lat, lon) in path {
        harness.geo.emit(lat, lon);
        let total = harness.tracker.snapshot().await.unwrap().cumulative_distance_meters;
        assert!(total >= last, "distance went from {last} to {total}");
        last = total;
    }
}
