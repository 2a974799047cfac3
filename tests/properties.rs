//! Invariant properties over randomly drawn line configurations.
//!
//! Each case steps its simulation one event at a time so the invariants can
//! be checked at every event boundary, not just at the end of the run.

use proptest::collection::vec;
use proptest::prelude::*;

use flowline::event::{EventKind, NodeId};
use flowline::job::LogTag;
use flowline::{Dist, LineConfig, SimInit, StationConfig};

/// A station that cannot livelock: either exponential service with the
/// reliability processes disabled, or short deterministic service with
/// failure and maintenance windows comfortably longer than any single
/// service, so a preempted job always finds a gap to finish in.
fn arb_station() -> impl Strategy<Value = StationConfig> {
    prop_oneof![
        (0.8f64..3.0, 1usize..4).prop_map(|(rate, capacity)| StationConfig {
            service: Dist::Exponential { rate },
            capacity,
            mtbf: Dist::Never,
            mttr: Dist::Fixed { value: 1.0 },
            maint_interval: Dist::Never,
            maint_duration: Dist::Fixed { value: 1.0 },
        }),
        (
            0.3f64..2.0,
            1usize..4,
            5.0f64..50.0,
            0.1f64..2.0,
            8.0f64..40.0,
            0.1f64..2.0,
        )
            .prop_map(
                |(service, capacity, mtbf, mttr, interval, duration)| StationConfig {
                    service: Dist::Fixed { value: service },
                    capacity,
                    mtbf: Dist::Fixed { value: mtbf },
                    mttr: Dist::Fixed { value: mttr },
                    maint_interval: Dist::Fixed { value: interval },
                    maint_duration: Dist::Fixed { value: duration },
                },
            ),
    ]
}

fn arb_config() -> impl Strategy<Value = LineConfig> {
    (
        1u64..120,
        0.4f64..1.5,
        any::<u64>(),
        vec(arb_station(), 1..=3),
    )
        .prop_map(|(total_jobs, lambda, seed, stations)| LineConfig {
            total_jobs,
            interarrival: Dist::Exponential { rate: lambda },
            seed,
            stations,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn a_run_preserves_the_line_invariants(config in arb_config()) {
        let n = config.total_jobs;
        let station_count = config.stations.len();
        let capacities: Vec<_> = config.stations.iter().map(|s| s.capacity).collect();

        let mut simulation = SimInit::new(config).init().unwrap();

        let mut previous = simulation.time();
        loop {
            let stepped = simulation.step().unwrap();
            let Some(now) = stepped else { break };

            // The clock never moves backwards.
            prop_assert!(now >= previous);
            previous = now;

            for index in 0..station_count {
                let station = simulation.station(index);
                let node = NodeId::Station(index);
                let scheduler = simulation.scheduler();

                // Single failure and maintenance pipelines.
                prop_assert!(scheduler.pending_for(node, EventKind::Fail) <= 1);
                prop_assert!(scheduler.pending_for(node, EventKind::Repair) <= 1);
                prop_assert!(scheduler.pending_for(node, EventKind::TriggerMaintenance) <= 1);

                // A job is never active and preempted at once.
                if let (Some(active), Some(preempted)) = (station.active(), station.preempted()) {
                    prop_assert_ne!(active, preempted);
                }

                // A blocked flag means the downstream buffer is saturated.
                if station.is_blocked() && index + 1 < station_count {
                    let downstream = simulation.station(index + 1);
                    prop_assert!(downstream.buffer_len() >= downstream.buffer_capacity());
                }
            }
        }

        // Completion and conservation.
        prop_assert!(simulation.scheduler().is_completed());
        prop_assert_eq!(simulation.scheduler().pending(), 0);
        prop_assert_eq!(simulation.source().issued(), n);
        prop_assert_eq!(simulation.sink().collected() as u64, n);
        for index in 0..station_count {
            let station = simulation.station(index);
            prop_assert_eq!(station.arrived(), n);
            prop_assert_eq!(station.processed(), n);
            prop_assert_eq!(station.buffer_len(), 0);
        }

        // Observed buffers never exceed capacity by more than the one
        // in-flight departure.
        for index in 1..station_count {
            prop_assert!(simulation.station(index).buffer_peak() <= capacities[index] + 1);
        }

        // Per-job audit logs are time-ordered and structurally complete:
        // one arrival, one service start and one departure per station.
        // A resumption reschedules the end of service without a new start
        // entry, so the counts hold for interrupted jobs too.
        for job in simulation.sink().jobs() {
            let log = job.log();
            prop_assert!(log.windows(2).all(|pair| pair[0].time <= pair[1].time));

            let count = |tag| log.iter().filter(|entry| entry.tag == tag).count();
            prop_assert_eq!(count(LogTag::Arrival), station_count);
            prop_assert_eq!(count(LogTag::ServiceStart), station_count);
            prop_assert_eq!(count(LogTag::Departure), station_count);

            prop_assert!(job.finish_time().unwrap() >= job.created_at());
        }
    }
}
