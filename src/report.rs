//! Aggregated run results.

use std::collections::BTreeMap;

use serde::Serialize;

/// Per-station aggregates at the end of a run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationReport {
    pub name: String,
    pub arrived: u64,
    pub processed: u64,
    pub failures: u64,
    pub maintenances: u64,
    /// Mean time from arrival at the station to departure, if any job
    /// departed.
    pub mean_cycle_time: Option<f64>,
    /// Fraction of the elapsed time the server spent idle and available.
    pub idle_fraction: f64,
    /// Fraction of the elapsed time the station spent blocked by its
    /// downstream neighbour.
    pub blocked_fraction: f64,
    /// Relative frequency of each queue length seen by arriving jobs.
    pub queue_length_distribution: BTreeMap<usize, f64>,
}

/// Whole-line aggregates at the end of a run.
///
/// Produced by [`Simulation::report`](crate::simulation::Simulation::report)
/// once the run has finished; serializable so experiment drivers can export
/// results directly.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Mean source-to-sink sojourn across collected jobs.
    pub mean_sojourn: Option<f64>,
    /// Finish time of the last collected job, in simulation seconds.
    pub total_elapsed: f64,
    /// Collected jobs per simulation second.
    pub throughput: f64,
    pub stations: Vec<StationReport>,
}
