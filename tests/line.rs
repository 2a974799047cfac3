//! Multi-station lines: backpressure, failures and exact walkthroughs.

use flowline::job::JobId;
use flowline::{Dist, LineConfig, SimInit, StationConfig};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fixed(value: f64) -> Dist {
    Dist::Fixed { value }
}

/// Two stations with identical service rates, the first one failing and
/// maintained. Every job passes through both stations, and the first
/// station must spend time blocked by the second one's small buffer.
#[test]
fn failing_first_station_line() {
    init_tracing();
    let n = 4_000;
    let config = LineConfig::from_rates(
        n,
        1.0,
        &[1.1, 1.1],
        &[5, 5],
        &[50.0, f64::INFINITY],
        &[1.0, 1.0],
        &[100.0, f64::INFINITY],
        &[1.0, 1.0],
    )
    .unwrap()
    .with_seed(99);

    let mut simulation = SimInit::new(config).init().unwrap();
    simulation.run().unwrap();

    let report = simulation.report();
    assert_eq!(simulation.sink().collected() as u64, n);
    assert_eq!(report.stations[0].arrived, n);
    assert_eq!(report.stations[0].processed, n);
    assert_eq!(report.stations[1].arrived, n);
    assert!(report.stations[0].processed >= report.stations[1].processed);

    // The second buffer saturates now and then, so the first station
    // accumulates blocked time.
    assert!(
        report.stations[0].blocked_fraction > 0.0,
        "first station never blocked"
    );
    // A station's cycle time is at least its mean service requirement.
    assert!(report.stations[1].mean_cycle_time.unwrap() > 1.0 / 1.1);
}

/// Capacity-1 tandem with a slow second station: the first station spends a
/// sizeable share of the run blocked, and the observed buffer never holds
/// more than capacity plus the one in-flight departure.
#[test]
fn capacity_one_forces_blocking() {
    let n = 5_000;
    let config = LineConfig::from_rates(
        n,
        0.9,
        &[2.0, 1.0],
        &[1, 1],
        &[f64::INFINITY, f64::INFINITY],
        &[1.0, 1.0],
        &[f64::INFINITY, f64::INFINITY],
        &[1.0, 1.0],
    )
    .unwrap()
    .with_seed(11);

    let mut simulation = SimInit::new(config).init().unwrap();
    simulation.run().unwrap();

    let report = simulation.report();
    assert_eq!(simulation.sink().collected() as u64, n);
    assert!(
        report.stations[0].blocked_fraction > 0.05,
        "blocked fraction {:.4}",
        report.stations[0].blocked_fraction
    );
    assert!(simulation.station(1).buffer_peak() <= 2);
}

fn walkthrough_config(station: StationConfig) -> LineConfig {
    LineConfig {
        total_jobs: 2,
        // Both jobs are issued at time zero.
        interarrival: fixed(0.0),
        seed: 0,
        stations: vec![station],
    }
}

/// Exact failure walkthrough. Two jobs at time zero, deterministic service
/// of 4, breakdown at 6 repaired at 8:
///
/// - job 1 is served over [0, 4] and reaches the sink at 4,
/// - job 2 starts at 4, is preempted by the failure at 6, resumes at 8 with
///   its full requirement and reaches the sink at 12.
#[test]
fn failure_preemption_walkthrough() {
    let config = walkthrough_config(StationConfig {
        service: fixed(4.0),
        capacity: 5,
        mtbf: fixed(6.0),
        mttr: fixed(2.0),
        maint_interval: Dist::Never,
        maint_duration: fixed(1.0),
    });

    let mut simulation = SimInit::new(config).init().unwrap();
    simulation.run().unwrap();

    let jobs = simulation.sink().jobs();
    assert_eq!(jobs.len(), 2);

    assert_eq!(jobs[0].id(), JobId(1));
    assert!(!jobs[0].interrupted());
    assert_eq!(jobs[0].finish_time().unwrap().as_secs(), 4.0);

    assert_eq!(jobs[1].id(), JobId(2));
    assert!(jobs[1].interrupted());
    assert_eq!(jobs[1].finish_time().unwrap().as_secs(), 12.0);

    let station = simulation.station(0);
    assert_eq!(station.failures(), 1);
    assert_eq!(station.processed(), 2);
    assert_eq!(station.mean_cycle_time().unwrap(), 8.0);
    assert_eq!(simulation.scheduler().pending(), 0);
}

/// Exact maintenance walkthrough. Same arrivals, maintenance due at 5 for a
/// duration of 3: job 2 is preempted at 5, resumes at 8, finishes at 12.
#[test]
fn maintenance_preemption_walkthrough() {
    let config = walkthrough_config(StationConfig {
        service: fixed(4.0),
        capacity: 5,
        mtbf: Dist::Never,
        mttr: fixed(1.0),
        maint_interval: fixed(5.0),
        maint_duration: fixed(3.0),
    });

    let mut simulation = SimInit::new(config).init().unwrap();
    simulation.run().unwrap();

    let jobs = simulation.sink().jobs();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].finish_time().unwrap().as_secs(), 4.0);
    assert!(jobs[1].interrupted());
    assert_eq!(jobs[1].finish_time().unwrap().as_secs(), 12.0);

    let station = simulation.station(0);
    assert_eq!(station.failures(), 0);
    assert_eq!(station.maintenances(), 1);
    assert_eq!(simulation.sink().mean_sojourn().unwrap(), 8.0);
}
