use crate::config::LineConfig;
use crate::error::SimulationError;
use crate::event::NodeId;
use crate::sampler::stream_seed;
use crate::scheduler::Scheduler;
use crate::sink::Sink;
use crate::source::Source;
use crate::station::Station;

use super::Simulation;

/// Builder for a flow-line simulation.
#[derive(Debug)]
pub struct SimInit {
    config: LineConfig,
}

impl SimInit {
    /// Creates a builder for the line described by `config`.
    pub fn new(config: LineConfig) -> Self {
        Self { config }
    }

    /// Validates the configuration and builds an initialized [`Simulation`]:
    /// the chain is wired source to sink, each station is registered as the
    /// backpressure listener of its downstream neighbour's buffer, and the
    /// initial failure, maintenance and arrival events are scheduled.
    pub fn init(self) -> Result<Simulation, SimulationError> {
        let config = self.config;
        config.validate()?;

        let mut scheduler = Scheduler::new();
        let master = config.seed;
        // One deterministic stream per stochastic quantity, in wiring
        // order, so a fixed master seed reproduces the run exactly.
        let mut stream = 0u64;
        let mut next_seed = move || {
            let seed = stream_seed(master, stream);
            stream += 1;
            seed
        };

        let source = Source::new(config.total_jobs, config.interarrival.build(next_seed())?);

        let count = config.stations.len();
        let mut stations = Vec::with_capacity(count);
        for (index, entry) in config.stations.iter().enumerate() {
            let out = if index + 1 < count {
                NodeId::Station(index + 1)
            } else {
                NodeId::Sink
            };
            stations.push(Station::new(
                index,
                out,
                entry.capacity,
                entry.service.build(next_seed())?,
                entry.mtbf.build(next_seed())?,
                entry.mttr.build(next_seed())?,
                entry.maint_interval.build(next_seed())?,
                entry.maint_duration.build(next_seed())?,
            ));
        }

        // Backpressure flows upstream: station i-1 listens to station i's
        // buffer. The first buffer has no listener, the source never blocks.
        let mut observers = vec![None; count];
        for index in 1..count {
            observers[index] = Some(index - 1);
        }

        for station in &mut stations {
            station.arm_failure(&mut scheduler);
            station.arm_maintenance(&mut scheduler);
        }
        source.start(&mut scheduler);

        let sink = Sink::new(config.total_jobs);

        Ok(Simulation::new(scheduler, source, stations, sink, observers))
    }
}
