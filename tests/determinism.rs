//! Reproducibility of seeded runs and configuration round-trips.

use flowline::{LineConfig, SimInit};

fn config(seed: u64) -> LineConfig {
    LineConfig::from_rates(
        1_000,
        1.0,
        &[1.2, 1.5],
        &[3, 3],
        &[40.0, f64::INFINITY],
        &[2.0, 1.0],
        &[70.0, f64::INFINITY],
        &[3.0, 1.0],
    )
    .unwrap()
    .with_seed(seed)
}

fn finish_times(config: LineConfig) -> Vec<u64> {
    let mut simulation = SimInit::new(config).init().unwrap();
    simulation.run().unwrap();
    simulation
        .sink()
        .jobs()
        .iter()
        .map(|job| job.finish_time().unwrap().as_secs().to_bits())
        .collect()
}

/// Two runs of the same seeded configuration are identical bit for bit.
#[test]
fn identical_seeds_reproduce_the_run() {
    let first = finish_times(config(2024));
    let second = finish_times(config(2024));
    assert_eq!(first, second);
}

#[test]
fn different_seeds_diverge() {
    let first = finish_times(config(1));
    let second = finish_times(config(2));
    assert_ne!(first, second);
}

/// Audit logs are part of the reproducible output too.
#[test]
fn audit_logs_reproduce() {
    let collect = || {
        let mut simulation = SimInit::new(config(7)).init().unwrap();
        simulation.run().unwrap();
        simulation
            .sink()
            .jobs()
            .iter()
            .map(|job| job.log().to_vec())
            .collect::<Vec<_>>()
    };
    assert_eq!(collect(), collect());
}

/// Configurations survive a serialization round-trip, so experiment drivers
/// can keep them in JSON files.
#[test]
fn config_round_trips_through_json() {
    let original = config(42);
    let text = serde_json::to_string_pretty(&original).unwrap();
    let restored: LineConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(original, restored);
}
