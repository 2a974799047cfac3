//! Error surface of the simulator.

use thiserror::Error;

use crate::event::EventKind;
use crate::station::StationState;

/// Errors surfaced while building or running a simulation.
///
/// Input-shape problems are reported before the run starts. An
/// `InvalidTransition` indicates a fault in the simulator itself and aborts
/// the run with a dump of the offending station. Cancellation misses and
/// insertions after the end of the simulation are not errors; they are
/// silent by design.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A per-station parameter vector does not match the number of stations.
    #[error("parameter vector `{name}` has length {got}, expected {expected}")]
    InputShape {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    /// The line has no stations.
    #[error("a flow line needs at least one station")]
    EmptyLine,

    /// The total number of jobs to simulate is zero.
    #[error("total job count must be positive")]
    NoJobs,

    /// A buffer was configured with zero capacity.
    #[error("station {station}: buffer capacity must be at least 1")]
    ZeroCapacity { station: usize },

    /// A distribution parameter is out of range.
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// A distribution that must produce finite samples cannot.
    #[error("station {station}: `{name}` must have finite samples")]
    NonFiniteStream {
        station: usize,
        name: &'static str,
    },

    /// A station received an event its automaton has no transition for.
    /// This is a programming fault, not a property of the model.
    #[error("{station} received {kind:?} in state {state:?} ({dump})")]
    InvalidTransition {
        station: String,
        state: StationState,
        kind: EventKind,
        dump: String,
    },
}
