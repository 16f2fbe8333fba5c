//! Folds the fix stream into a cumulative distance.

use crate::geodesic::distance;
use crate::types::Coordinate;
use std::fmt;

/// Why a fix did not contribute to the distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Latitude or longitude was non-finite or out of range.
    OutOfRange,
    /// The computed step distance was not a finite number.
    NonFiniteDistance,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::OutOfRange => f.write_str("coordinates out of range"),
            RejectReason::NonFiniteDistance => f.write_str("step distance is not finite"),
        }
    }
}

/// Result of feeding one fix to the reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixOutcome {
    /// First fix after a reset; recorded as the baseline, no distance added.
    Baseline,
    /// Distance from the previous fix was added to the total.
    Accepted { delta_meters: f64 },
    /// Fix was discarded and the state is unchanged.
    Rejected(RejectReason),
}

/// Accumulates step distances between consecutive accepted fixes.
///
/// The total never decreases except through [`FixReducer::reset`].
#[derive(Debug, Clone, Default)]
pub struct FixReducer {
    previous: Option<Coordinate>,
    cumulative_distance_meters: f64,
}

impl FixReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next fix in arrival order.
    pub fn accept(&mut self, fix: Coordinate) -> FixOutcome {
        if !fix.is_valid() {
            return FixOutcome::Rejected(RejectReason::OutOfRange);
        }

        let Some(previous) = self.previous else {
            self.previous = Some(fix);
            return FixOutcome::Baseline;
        };

        let delta_meters = distance(&previous, &fix);
        if !delta_meters.is_finite() {
            return FixOutcome::Rejected(RejectReason::NonFiniteDistance);
        }

        self.cumulative_distance_meters += delta_meters;
        self.previous = Some(fix);
        FixOutcome::Accepted { delta_meters }
    }

    /// Last fix that was accepted, if any.
    pub fn previous(&self) -> Option<&Coordinate> {
        self.previous.as_ref()
    }

    pub fn cumulative_distance_meters(&self) -> f64 {
        self.cumulative_distance_meters
    }

    /// Zero the total and drop the baseline.
    pub fn reset(&mut self) {
        self.previous = None;
        self.cumulative_distance_meters = 0.0;
    }

    /// Drop the baseline but keep the total, so a gap in the stream does not
    /// count as travelled distance.
    pub fn clear_baseline(&mut self) {
        self.previous = None;
    }
}
