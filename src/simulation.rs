//! Simulation management.
//!
//! This module contains the [`Simulation`] environment and the [`SimInit`]
//! simulation builder.
//!
//! # Simulation lifecycle
//!
//! The lifecycle of a run comprises the following stages:
//!
//! 1) description of the line in a [`LineConfig`](crate::config::LineConfig):
//!    the arrival process, the total number of jobs, and one station entry
//!    per position with its service, buffer and reliability parameters,
//! 2) instantiation of a [`SimInit`] builder from the configuration and of a
//!    [`Simulation`] with [`SimInit::init()`], which wires the chain,
//!    registers the backpressure listeners and seeds the initial events,
//! 3) execution with [`Simulation::run()`], or one event at a time with
//!    [`Simulation::step()`] while observing the stations in between,
//! 4) extraction of results with [`Simulation::report()`] and the node
//!    accessors.
//!
//! # Dispatch model
//!
//! The event loop is single-threaded and cooperative: the scheduler is the
//! only driver, every handler runs to completion before the next event is
//! popped, and the clock advances only between events. Backpressure
//! notifications are not events; they are delivered synchronously to the
//! upstream listener within the buffer operation that crossed the capacity
//! threshold, cascading further upstream while stations react by pulling
//! jobs.

mod sim_init;

pub use sim_init::SimInit;

use std::fmt;

use tracing::trace;

use crate::buffer::{BackpressureListener, Notification};
use crate::error::SimulationError;
use crate::event::{Event, EventKind, NodeId};
use crate::report::{RunReport, StationReport};
use crate::scheduler::Scheduler;
use crate::sink::Sink;
use crate::source::Source;
use crate::station::Station;
use crate::time::SimTime;

/// Simulation environment.
///
/// A `Simulation` is created by calling [`SimInit::init()`] on a builder. It
/// owns the scheduler, the source, the stations and the sink, and it is the
/// dispatcher: each popped event is routed to its target node's handler, and
/// any backpressure notification the handler produces is delivered to the
/// registered upstream listener before the next event is popped.
///
/// Simulation time can be read with [`time()`](Simulation::time). The run
/// ends when the sink has collected every job, which completes the scheduler
/// and discards the remaining events, or when the event queue empties.
pub struct Simulation {
    scheduler: Scheduler,
    source: Source,
    stations: Vec<Station>,
    sink: Sink,
    /// `observers[i]` is the station listening to station `i`'s buffer.
    observers: Vec<Option<usize>>,
}

impl Simulation {
    pub(crate) fn new(
        scheduler: Scheduler,
        source: Source,
        stations: Vec<Station>,
        sink: Sink,
        observers: Vec<Option<usize>>,
    ) -> Self {
        Self {
            scheduler,
            source,
            stations,
            sink,
            observers,
        }
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Processes the next scheduled event, advancing simulation time to its
    /// timestamp.
    ///
    /// Returns the new simulation time, or `None` if no event was pending.
    pub fn step(&mut self) -> Result<Option<SimTime>, SimulationError> {
        let Some(event) = self.scheduler.pop() else {
            return Ok(None);
        };
        trace!(%event, "dispatch");
        let time = event.time;
        self.dispatch(event)?;

        Ok(Some(time))
    }

    /// Runs the simulation to completion: events are dispatched in
    /// chronological order until the sink completes the run or the queue
    /// empties.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        while !self.scheduler.is_completed() && !self.scheduler.is_empty() {
            self.step()?;
        }

        Ok(())
    }

    /// Aggregates the run's results.
    pub fn report(&self) -> RunReport {
        let end = self.sink.total_elapsed().unwrap_or_else(|| self.scheduler.now());
        let elapsed = end.as_secs();

        let stations = self
            .stations
            .iter()
            .map(|station| {
                let histogram = station.arrival_histogram();
                let samples: u64 = histogram.values().sum::<u64>().max(1);
                let queue_length_distribution = histogram
                    .into_iter()
                    .map(|(len, count)| (len, count as f64 / samples as f64))
                    .collect();

                StationReport {
                    name: station.name().to_owned(),
                    arrived: station.arrived(),
                    processed: station.processed(),
                    failures: station.failures(),
                    maintenances: station.maintenances(),
                    mean_cycle_time: station.mean_cycle_time(),
                    idle_fraction: fraction(station.idle_time_until(end), elapsed),
                    blocked_fraction: fraction(station.blocked_time_until(end), elapsed),
                    queue_length_distribution,
                }
            })
            .collect();

        RunReport {
            mean_sojourn: self.sink.mean_sojourn(),
            total_elapsed: elapsed,
            throughput: fraction(self.sink.collected() as f64, elapsed),
            stations,
        }
    }

    /// Read access to the scheduler, for drivers and tests that observe the
    /// pending-event set.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn station(&self, index: usize) -> &Station {
        &self.stations[index]
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    fn dispatch(&mut self, event: Event) -> Result<(), SimulationError> {
        match event.to {
            NodeId::Source => {
                self.source.receive(&event, &mut self.scheduler);
                Ok(())
            }
            NodeId::Sink => {
                self.sink.receive(event, &mut self.scheduler);
                Ok(())
            }
            NodeId::Station(index) => self.station_receive(index, event),
        }
    }

    fn station_receive(&mut self, index: usize, event: Event) -> Result<(), SimulationError> {
        match event.kind {
            EventKind::Arrive => {
                let job = event.job.expect("arrivals carry their job");
                let now = self.scheduler.now();
                // The push signal is delivered before service is attempted,
                // so an upstream neighbour blocks before this station can
                // react to its own arrival.
                let note = self.stations[index].admit(job, now);
                self.notify_upstream(index, note);
                let note = self.stations[index].try_start(&mut self.scheduler);
                self.notify_upstream(index, note);
                Ok(())
            }
            EventKind::EndService => {
                let job = event.job.expect("end-of-service events carry their job");
                let note = self.stations[index].finish(job, &mut self.scheduler);
                self.notify_upstream(index, note);
                Ok(())
            }
            EventKind::Fail => {
                self.stations[index].fail(&mut self.scheduler);
                Ok(())
            }
            EventKind::Repair => {
                let note = self.stations[index].repair(&mut self.scheduler);
                self.notify_upstream(index, note);
                Ok(())
            }
            EventKind::TriggerMaintenance => {
                self.stations[index].trigger_maintenance(&mut self.scheduler)
            }
            EventKind::MaintenanceComplete => {
                let note = self.stations[index].maintenance_complete(&mut self.scheduler);
                self.notify_upstream(index, note);
                Ok(())
            }
            EventKind::GenerateJob => {
                debug_assert!(false, "generate-job event targeted at a station");
                Ok(())
            }
        }
    }

    /// Delivers a buffer notification to the listener registered for station
    /// `of`, cascading unblocks up the chain: a listener that reacts by
    /// popping its own buffer may in turn unblock its own upstream.
    fn notify_upstream(&mut self, of: usize, note: Option<Notification>) {
        let mut of = of;
        let mut note = note;
        while let Some(notification) = note.take() {
            let Some(listener) = self.observers[of] else {
                break;
            };
            let now = self.scheduler.now();
            match notification {
                Notification::Block => self.stations[listener].on_block(now),
                Notification::Unblock => {
                    note = self.stations[listener].on_unblock(now, &mut self.scheduler);
                    of = listener;
                }
            }
        }
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("time", &self.scheduler.now())
            .field("pending", &self.scheduler.pending())
            .field("collected", &self.sink.collected())
            .finish_non_exhaustive()
    }
}

/// `numerator / denominator`, or zero for an empty run.
fn fraction(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
