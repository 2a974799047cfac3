//! Discrete-event simulation of flow lines.
//!
//! A flow line is a linear chain of single-server stations processing a
//! stream of jobs. Each station is a finite-state machine alternating
//! between serving, failing, undergoing maintenance and being blocked by a
//! saturated downstream buffer. The simulator produces per-station
//! throughput, cycle time, queue-length distributions and utilisation
//! statistics over a user-specified number of jobs.
//!
//! # Model
//!
//! Jobs are issued by a [`Source`](source::Source) driven by an interarrival
//! process, flow through the configured [`Station`](station::Station)s in
//! order, and are collected by a [`Sink`](sink::Sink) which ends the run
//! once the last job arrives. Stations fail at random, get repaired, and
//! undergo preventive maintenance; an interrupted job is parked and resumed
//! once the station is back up. Every inter-station buffer is bounded:
//! filling one up blocks the upstream neighbour until a slot frees up.
//!
//! The event loop is single-threaded and cooperative. Events with equal
//! timestamps are dispatched in insertion order and every stochastic stream
//! owns a generator seeded from the run's master seed, so any two runs of
//! the same configuration are identical bit for bit.
//!
//! # Example
//!
//! Simulate an M/M/1 station, no failures and no maintenance, and check
//! that every job got through:
//!
//! ```
//! use flowline::{LineConfig, SimInit};
//!
//! # fn main() -> Result<(), flowline::SimulationError> {
//! let config = LineConfig::from_rates(
//!     100,              // jobs
//!     1.0,              // arrival rate
//!     &[1.3],           // service rate per station
//!     &[10],            // buffer capacity per station
//!     &[f64::INFINITY], // mean time between failures (never fails)
//!     &[1.0],           // mean time to repair
//!     &[f64::INFINITY], // maintenance interval (never maintained)
//!     &[1.0],           // maintenance duration
//! )?
//! .with_seed(7);
//!
//! let mut simulation = SimInit::new(config).init()?;
//! simulation.run()?;
//!
//! let report = simulation.report();
//! assert_eq!(report.stations[0].processed, 100);
//! assert!(report.mean_sojourn.unwrap() > 0.0);
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
mod error;
pub mod event;
pub mod job;
pub mod report;
pub mod sampler;
pub mod scheduler;
pub mod simulation;
pub mod sink;
pub mod source;
pub mod station;
pub mod time;
mod util;

pub use config::{LineConfig, StationConfig};
pub use error::SimulationError;
pub use report::{RunReport, StationReport};
pub use sampler::Dist;
pub use simulation::{SimInit, Simulation};
pub use time::SimTime;
