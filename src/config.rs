//! Line configuration.

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::sampler::Dist;

/// Parameters of one station.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationConfig {
    /// Service requirement distribution.
    pub service: Dist,
    /// Buffer capacity, at least 1.
    pub capacity: usize,
    /// Time between failures. `Never` disables failures.
    pub mtbf: Dist,
    /// Time to repair.
    pub mttr: Dist,
    /// Time between preventive maintenance triggers. `Never` disables
    /// maintenance.
    pub maint_interval: Dist,
    /// Duration of one maintenance.
    pub maint_duration: Dist,
}

/// Parameters of a whole run: the arrival process, the total number of jobs
/// and one [`StationConfig`] per station, head of the line first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    pub total_jobs: u64,
    pub interarrival: Dist,
    #[serde(default)]
    pub seed: u64,
    pub stations: Vec<StationConfig>,
}

impl LineConfig {
    /// Builds a configuration from per-station parameter vectors, the
    /// classic experiment-driver input shape.
    ///
    /// Arrivals are Poisson with rate `lambda` and service at station `i` is
    /// exponential with rate `mu[i]`. The reliability parameters are taken
    /// as deterministic durations; an infinite `mtbf` or `maint_interval`
    /// disables the corresponding process. All vectors must have the same
    /// length.
    #[allow(clippy::too_many_arguments)]
    pub fn from_rates(
        total_jobs: u64,
        lambda: f64,
        mu: &[f64],
        capacity: &[usize],
        mtbf: &[f64],
        mttr: &[f64],
        maint_interval: &[f64],
        maint_duration: &[f64],
    ) -> Result<Self, SimulationError> {
        let expected = mu.len();
        let check = |name: &'static str, got: usize| {
            if got == expected {
                Ok(())
            } else {
                Err(SimulationError::InputShape {
                    name,
                    expected,
                    got,
                })
            }
        };
        check("capacity", capacity.len())?;
        check("mtbf", mtbf.len())?;
        check("mttr", mttr.len())?;
        check("maintInterval", maint_interval.len())?;
        check("maintDuration", maint_duration.len())?;

        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(SimulationError::InvalidParameter {
                name: "lambda",
                value: lambda,
            });
        }

        let duration = |value: f64| {
            if value.is_finite() {
                Dist::Fixed { value }
            } else {
                Dist::Never
            }
        };

        let stations = (0..expected)
            .map(|i| StationConfig {
                service: Dist::Exponential { rate: mu[i] },
                capacity: capacity[i],
                mtbf: duration(mtbf[i]),
                mttr: duration(mttr[i]),
                maint_interval: duration(maint_interval[i]),
                maint_duration: duration(maint_duration[i]),
            })
            .collect();

        let config = Self {
            total_jobs,
            interarrival: Dist::Exponential { rate: lambda },
            seed: 0,
            stations,
        };
        config.validate()?;

        Ok(config)
    }

    /// Deterministic master seed for the run's random streams.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks the input shape ahead of the run.
    ///
    /// Service, interarrival, repair and maintenance durations must be able
    /// to produce finite samples: a job that can never finish, or a repair
    /// that never completes, would stall the line forever.
    pub(crate) fn validate(&self) -> Result<(), SimulationError> {
        if self.total_jobs == 0 {
            return Err(SimulationError::NoJobs);
        }
        if self.stations.is_empty() {
            return Err(SimulationError::EmptyLine);
        }
        if !self.interarrival.is_finite() {
            return Err(SimulationError::NonFiniteStream {
                station: 0,
                name: "interarrival",
            });
        }
        for (i, station) in self.stations.iter().enumerate() {
            if station.capacity == 0 {
                return Err(SimulationError::ZeroCapacity { station: i });
            }
            if !station.service.is_finite() {
                return Err(SimulationError::NonFiniteStream {
                    station: i,
                    name: "service",
                });
            }
            if !station.mttr.is_finite() {
                return Err(SimulationError::NonFiniteStream {
                    station: i,
                    name: "mttr",
                });
            }
            if !station.maint_duration.is_finite() {
                return Err(SimulationError::NonFiniteStream {
                    station: i,
                    name: "maintDuration",
                });
            }
        }

        Ok(())
    }
}
