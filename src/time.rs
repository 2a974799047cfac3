//! Simulation time.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A timestamp on the simulation clock, in simulation seconds.
///
/// `SimTime` is a thin wrapper over a non-negative, non-NaN `f64` with a total
/// order, so timestamps can key the scheduler's pending-event set directly.
/// [`SimTime::INFINITY`] stands for "never" and is a valid scheduling target
/// for processes that are disabled, such as failures on a station that cannot
/// fail.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(f64);

impl SimTime {
    /// The start of the simulation.
    pub const EPOCH: Self = SimTime(0.0);

    /// A timestamp later than any finite timestamp.
    pub const INFINITY: Self = SimTime(f64::INFINITY);

    /// Creates a timestamp from a number of simulation seconds.
    ///
    /// The value must be non-negative and not NaN.
    pub fn new(secs: f64) -> Self {
        debug_assert!(secs >= 0.0 && !secs.is_nan(), "invalid timestamp: {secs}");
        SimTime(secs)
    }

    /// Returns the timestamp as simulation seconds.
    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// Returns `true` unless this is the "never" timestamp.
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl Eq for SimTime {}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Total order over non-NaN values; NaN is excluded by construction.
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Add<f64> for SimTime {
    type Output = SimTime;

    /// Offsets the timestamp by a non-negative duration in seconds.
    fn add(self, rhs: f64) -> SimTime {
        debug_assert!(rhs >= 0.0, "negative duration: {rhs}");
        SimTime(self.0 + rhs)
    }
}

impl Sub for SimTime {
    type Output = f64;

    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.0)
    }
}
